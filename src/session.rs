//! Session lifecycle.
//!
//! A [`Session`] walks one run through its phases:
//!
//! ```text
//! Configuring ─┬─> Planning                      (plan written, nothing runs)
//!              └─> Running ─┬─> Archiving        (report uploaded, local copy removed)
//!                           └─> Done             (no archiving configured)
//! ```
//!
//! The [`CaptureTimestamp`] is fixed once during configuration and carried in
//! the [`SessionContext`]; it names the default local report and partitions
//! the remote archive key, so both agree even if the run crosses midnight.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::archive::{self, CaptureTimestamp};
use crate::gcs::{ObjectStore, StoreError};
use crate::harness::types::TestItem;
use crate::options::HarnessOptions;
use crate::plan::{self, PlanError, PlanRecord};

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that end a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Only one of the two archive options was supplied
    #[error("gcs plugin requires: --gcs-service-key and --gcs-bucket")]
    IncompleteArchiveOptions,

    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Upload failed; the local report is left in place
    #[error("report upload failed: {0}")]
    Upload(#[from] StoreError),

    /// Upload succeeded but the local report could not be removed
    #[error("report uploaded but local copy {path} could not be removed: {source}")]
    RemoveReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report path {0} has no file name")]
    InvalidReportPath(PathBuf),

    #[error("cannot {action} while session is {phase}")]
    Phase {
        action: &'static str,
        phase: SessionPhase,
    },
}

/// Lifecycle phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Configuring,
    Planning,
    Running,
    Archiving,
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Configuring => "configuring",
            SessionPhase::Planning => "planning",
            SessionPhase::Running => "running",
            SessionPhase::Archiving => "archiving",
            SessionPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Where archived reports go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTarget {
    /// Bucket name
    pub bucket: String,
    /// Service key credentials file
    pub credentials_path: PathBuf,
}

/// Settings handed to the report renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSink {
    /// Local report path, if a report is produced at all
    pub path: Option<PathBuf>,
    /// Inline all styling so the file renders standalone
    pub self_contained: bool,
}

/// Validated, immutable session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Plan output path; when set the session only writes the plan
    pub plan_path: Option<PathBuf>,
    /// Archive destination; bucket and credentials are always set together
    pub archive: Option<ArchiveTarget>,
    /// Prefix for generated report filenames
    pub report_filename_prefix: String,
    /// Resolved report renderer settings
    pub report: ReportSink,
}

impl SessionConfig {
    pub fn bucket(&self) -> Option<&str> {
        self.archive.as_ref().map(|a| a.bucket.as_str())
    }

    pub fn credentials_path(&self) -> Option<&Path> {
        self.archive.as_ref().map(|a| a.credentials_path.as_path())
    }

    pub fn report_path(&self) -> Option<&Path> {
        self.report.path.as_deref()
    }
}

/// Configuration plus the capture timestamp, fixed for the whole session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub config: SessionConfig,
    pub captured_at: CaptureTimestamp,
}

impl SessionContext {
    /// Validate `options` and resolve the report settings.
    ///
    /// Empty option values count as absent.
    pub fn from_options(options: &HarnessOptions, captured_at: CaptureTimestamp) -> SessionResult<Self> {
        let bucket = options.gcs.bucket.clone().filter(|b| !b.is_empty());
        let credentials = options
            .gcs
            .service_key
            .clone()
            .filter(|p| !p.as_os_str().is_empty());
        let html_path = options
            .report
            .html_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty());
        let prefix = options.gcs.filename.clone();

        let (archive, report) = match (bucket, credentials) {
            (None, None) => (
                None,
                ReportSink {
                    path: html_path,
                    self_contained: options.report.self_contained,
                },
            ),
            (Some(bucket), Some(credentials_path)) => {
                let path = html_path
                    .unwrap_or_else(|| PathBuf::from(archive::report_filename(&captured_at, &prefix)));
                (
                    Some(ArchiveTarget {
                        bucket,
                        credentials_path,
                    }),
                    ReportSink {
                        path: Some(path),
                        self_contained: true,
                    },
                )
            }
            _ => return Err(SessionError::IncompleteArchiveOptions),
        };

        Ok(Self {
            config: SessionConfig {
                plan_path: options.testplan.path.clone().filter(|p| !p.as_os_str().is_empty()),
                archive,
                report_filename_prefix: prefix,
                report,
            },
            captured_at,
        })
    }
}

/// Result of handing the collected items to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// The plan was written; tests must not run
    Planned { path: PathBuf, records: Vec<PlanRecord> },
    /// Proceed with normal execution
    Run,
}

/// Progress updates while archiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveProgress {
    /// Upload is about to start
    Uploading {
        local: PathBuf,
        bucket: String,
        key: String,
    },
    /// Upload finished
    Uploaded { key: String },
    /// Local report removed
    Removed { local: PathBuf },
}

/// Outcome of the end-of-session step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Finished {
    /// Report uploaded and local copy removed
    Archived {
        local: PathBuf,
        bucket: String,
        key: String,
    },
    /// Nothing to archive
    Done,
}

/// One harness session
#[derive(Debug, Clone)]
pub struct Session {
    context: SessionContext,
    phase: SessionPhase,
}

impl Session {
    /// Configure a session, capturing the current time
    pub fn configure(options: &HarnessOptions) -> SessionResult<Self> {
        Self::configure_at(options, CaptureTimestamp::now())
    }

    /// Configure a session with an explicit capture timestamp
    pub fn configure_at(options: &HarnessOptions, captured_at: CaptureTimestamp) -> SessionResult<Self> {
        let context = SessionContext::from_options(options, captured_at)?;

        tracing::debug!(
            captured_at = %captured_at.report_stamp(),
            plan = context.config.plan_path.is_some(),
            archive = context.config.archive.is_some(),
            report = ?context.config.report.path,
            "session configured"
        );

        Ok(Self {
            context,
            phase: SessionPhase::Configuring,
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn config(&self) -> &SessionConfig {
        &self.context.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Report settings the renderer must honor
    pub fn report_sink(&self) -> &ReportSink {
        &self.context.config.report
    }

    /// Hand over the collected items.
    ///
    /// Writes the plan when one was requested (the session then ends in
    /// `Planning`), otherwise moves to `Running`.
    pub fn collect(&mut self, items: &[TestItem]) -> SessionResult<Collected> {
        self.expect_phase(SessionPhase::Configuring, "collect tests")?;

        let Some(path) = self.context.config.plan_path.clone() else {
            self.phase = SessionPhase::Running;
            return Ok(Collected::Run);
        };

        let records = plan::write_plan(&path, items)?;
        self.phase = SessionPhase::Planning;
        Ok(Collected::Planned { path, records })
    }

    /// Finish the run, archiving the report if configured
    pub fn finish(&mut self, store: &dyn ObjectStore) -> SessionResult<Finished> {
        self.finish_with_progress(store, |_| {})
    }

    /// Finish the run with progress callbacks
    pub fn finish_with_progress<F>(&mut self, store: &dyn ObjectStore, mut on_progress: F) -> SessionResult<Finished>
    where
        F: FnMut(ArchiveProgress),
    {
        self.expect_phase(SessionPhase::Running, "finish")?;

        let Some(target) = self.context.config.archive.clone() else {
            self.phase = SessionPhase::Done;
            return Ok(Finished::Done);
        };
        self.phase = SessionPhase::Archiving;

        let local = self
            .context
            .config
            .report
            .path
            .clone()
            .ok_or_else(|| SessionError::InvalidReportPath(PathBuf::new()))?;
        let filename = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SessionError::InvalidReportPath(local.clone()))?;
        let key = archive::archive_key(&self.context.captured_at, &filename);

        on_progress(ArchiveProgress::Uploading {
            local: local.clone(),
            bucket: target.bucket.clone(),
            key: key.clone(),
        });

        let bucket = store.bucket(&target.credentials_path, &target.bucket)?;
        bucket.upload(&local, &key)?;
        tracing::info!(bucket = %bucket.name(), key = %key, "report uploaded");
        on_progress(ArchiveProgress::Uploaded { key: key.clone() });

        fs::remove_file(&local).map_err(|source| SessionError::RemoveReport {
            path: local.clone(),
            source,
        })?;
        tracing::debug!(path = %local.display(), "removed local report");
        on_progress(ArchiveProgress::Removed {
            local: local.clone(),
        });

        Ok(Finished::Archived {
            local,
            bucket: target.bucket,
            key,
        })
    }

    fn expect_phase(&self, expected: SessionPhase, action: &'static str) -> SessionResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::Phase {
                action,
                phase: self.phase,
            })
        }
    }
}
