//! Integration tests for plan generation and report archiving

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;

use testplan_gcs::{
    Bucket, CaptureTimestamp, Collected, Finished, HarnessOptions, ObjectStore, Session,
    SessionError, SessionPhase, StoreError, StoreResult, TestItem, load_items, report_filename,
};

/// In-memory store that copies uploads into a directory keyed by object name
struct DirStore {
    root: PathBuf,
    reject: bool,
    keys: RefCell<Vec<String>>,
}

struct DirBucket<'a> {
    store: &'a DirStore,
    name: String,
}

impl DirStore {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            reject: false,
            keys: RefCell::new(Vec::new()),
        }
    }
}

impl ObjectStore for DirStore {
    fn bucket(&self, _credentials_path: &Path, bucket: &str) -> StoreResult<Box<dyn Bucket + '_>> {
        Ok(Box::new(DirBucket {
            store: self,
            name: bucket.to_string(),
        }))
    }
}

impl Bucket for DirBucket<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn upload(&self, local_path: &Path, remote_key: &str) -> StoreResult<()> {
        if self.store.reject {
            return Err(StoreError::UploadFailed {
                local: local_path.display().to_string(),
                key: remote_key.to_string(),
                message: "bucket is read-only".to_string(),
            });
        }
        let dest = self.store.root.join(&self.name).join(remote_key);
        fs::create_dir_all(dest.parent().unwrap())?;
        fs::copy(local_path, &dest)?;
        self.store.keys.borrow_mut().push(remote_key.to_string());
        Ok(())
    }
}

fn fixture_items() -> Vec<TestItem> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/collected.json");
    load_items(&path).expect("Failed to load fixture manifest")
}

fn capture() -> CaptureTimestamp {
    CaptureTimestamp::from_ymd_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_plan_for_two_items() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = dir.path().join("plan.csv");

    let items = vec![
        TestItem::new("mod", "test_bar").docstring("The bar test").marker("high"),
        TestItem::new("mod", "test_a")
            .in_class("TestFoo")
            .docstring("The TestFoo.a test.\n        Make it a multiline docstring.\n        ")
            .marker("high")
            .marker("performance"),
    ];

    let options = HarnessOptions::default().testplan(&plan_path);
    let mut session = Session::configure_at(&options, capture()).unwrap();
    let collected = session.collect(&items).unwrap();
    assert!(matches!(collected, Collected::Planned { .. }));
    assert_eq!(session.phase(), SessionPhase::Planning);

    let csv = fs::read_to_string(&plan_path).unwrap();
    assert_eq!(
        csv,
        "title,description,markers\r\n\
         mod.py::test_bar,The bar test,high\r\n\
         mod.py::TestFoo::test_a,\"The TestFoo.a test.\nMake it a multiline docstring.\",\"high,performance\"\r\n"
    );
}

#[test]
fn test_plan_from_collection_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = dir.path().join("plan.csv");

    let options = HarnessOptions::default().testplan(&plan_path);
    let mut session = Session::configure_at(&options, capture()).unwrap();
    let records = match session.collect(&fixture_items()).unwrap() {
        Collected::Planned { records, .. } => records,
        Collected::Run => panic!("expected plan mode"),
    };

    let rows: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.title.as_str(), r.markers.as_str()))
        .collect();
    assert_eq!(
        rows,
        [
            ("test_foo.py::test_foo", "performance"),
            ("test_foo.py::test_bar", "high"),
            ("test_foo.py::test_baz", ""),
            ("test_foo.py::TestFoo::test_a", "high,performance"),
            ("test_foo.py::TestFoo::test_b", ""),
        ]
    );
    assert_eq!(
        records[2].description,
        "The baz test\nMake sure we get multiline formatting right."
    );
    for record in &records {
        assert!(!record.description.contains("\n "), "indented: {:?}", record.description);
    }

    let csv = fs::read_to_string(&plan_path).unwrap();
    assert!(csv.contains("test_foo.py::test_baz,\"The baz test\nMake sure we get multiline formatting right.\",\r\n"));
}

#[test]
fn test_partial_archive_options_fail_before_running() {
    for options in [
        HarnessOptions::default().bucket("reports"),
        HarnessOptions::default().service_key("key.json"),
    ] {
        let err = Session::configure_at(&options, capture()).unwrap_err();
        assert!(matches!(err, SessionError::IncompleteArchiveOptions));
        assert!(err.to_string().contains("--gcs-service-key"));
        assert!(err.to_string().contains("--gcs-bucket"));
    }
}

#[test]
fn test_archive_round_trip_removes_local_report() {
    let work = tempfile::tempdir().unwrap();
    let remote = tempfile::tempdir().unwrap();

    let ts = capture();
    let report = work.path().join(report_filename(&ts, "smoke"));
    let options = HarnessOptions::default()
        .bucket("reports")
        .service_key("key.json")
        .filename("smoke")
        .html(&report);

    let mut session = Session::configure_at(&options, ts).unwrap();
    assert!(session.report_sink().self_contained);
    session.collect(&[]).unwrap();

    // Stand-in for the renderer writing the report during the run
    fs::write(&report, "<html><style>body{}</style></html>").unwrap();

    let store = DirStore::new(remote.path());
    let finished = session.finish(&store).unwrap();

    let key = "2024/01/01/20240101T120000_smoke.html";
    assert!(matches!(finished, Finished::Archived { key: ref k, .. } if k == key));
    assert_eq!(store.keys.borrow().as_slice(), [key]);
    assert!(remote.path().join("reports").join(key).is_file());
    assert!(!report.exists());
}

#[test]
fn test_derived_report_name_matches_archive_key() {
    let options = HarnessOptions::default()
        .bucket("reports")
        .service_key("key.json");
    let session = Session::configure_at(&options, capture()).unwrap();

    let report = session.config().report_path().unwrap().to_path_buf();
    assert_eq!(report, PathBuf::from("20240101T120000_report.html"));
    assert_eq!(
        testplan_gcs::archive_key(&session.context().captured_at, &report.to_string_lossy()),
        "2024/01/01/20240101T120000_report.html"
    );
}

#[test]
fn test_failed_upload_leaves_local_report() {
    let work = tempfile::tempdir().unwrap();
    let remote = tempfile::tempdir().unwrap();
    let report = work.path().join("report.html");
    fs::write(&report, "<html></html>").unwrap();

    let options = HarnessOptions::default()
        .bucket("reports")
        .service_key("key.json")
        .html(&report);
    let mut session = Session::configure_at(&options, capture()).unwrap();
    session.collect(&[]).unwrap();

    let mut store = DirStore::new(remote.path());
    store.reject = true;
    let err = session.finish(&store).unwrap_err();

    assert!(matches!(err, SessionError::Upload(_)));
    assert!(report.exists());
}
