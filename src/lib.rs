//! testplan-gcs - Test plan export and report archiving for test harness sessions.
//!
//! This crate provides:
//! - A test plan extractor turning discovered tests into a `title,description,markers` CSV
//! - Session lifecycle handling (configure, plan or run, archive)
//! - Timestamp-partitioned archive keys (`YYYY/MM/DD/<report>`)
//! - A Google Cloud Storage upload client behind an `ObjectStore` seam
//!
//! # Example
//!
//! ```rust,no_run
//! use testplan_gcs::{Collected, HarnessOptions, Session, TestItem};
//!
//! let options = HarnessOptions::default().testplan("plan.csv");
//! let mut session = Session::configure(&options).unwrap();
//! let items = vec![TestItem::new("test_foo", "test_bar").docstring("The bar test").marker("high")];
//! if let Collected::Planned { path, .. } = session.collect(&items).unwrap() {
//!     println!("Generated test plan: {}", path.display());
//! }
//! ```

pub mod archive;
pub mod config;
pub mod gcs;
pub mod harness;
pub mod options;
pub mod plan;
pub mod runner;
pub mod session;

// Re-export runner types
pub use runner::{ArchivedReport, RunResult};

// Re-export harness types
pub use harness::{DiscoveryError, HarnessError, HarnessResult, Marker, TestItem, load_items, run_tests};

// Re-export plan extraction
pub use plan::{PlanError, PlanRecord, PlanResult, extract_plan, normalize_docstring, write_plan};

// Re-export archiving
pub use archive::{CaptureTimestamp, archive_key, report_filename};
pub use gcs::{Bucket, GcsStore, ObjectStore, StoreError, StoreResult};

// Re-export session management
pub use options::HarnessOptions;
pub use session::{
    ArchiveProgress, Collected, Finished, ReportSink, Session, SessionConfig, SessionContext,
    SessionError, SessionPhase, SessionResult,
};
