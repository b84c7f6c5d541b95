//! Types for harness run summaries.

use serde::Serialize;
use std::path::PathBuf;

use crate::archive;
use crate::session::{Finished, SessionPhase};

/// Where an archived report ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchivedReport {
    /// Bucket name
    pub bucket: String,

    /// Object key inside the bucket
    pub key: String,

    /// Browser URL of the object
    pub url: String,
}

impl ArchivedReport {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, browse_base: &str) -> Self {
        let bucket = bucket.into();
        let key = key.into();
        let url = archive::browse_url(browse_base, &bucket, &key);
        Self { bucket, key, url }
    }
}

/// Summary of a complete harness invocation
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Final session phase
    pub phase: SessionPhase,

    /// Plan file, when the session only generated a plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<PathBuf>,

    /// Number of plan rows written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_records: Option<usize>,

    /// Exit code of the test command (None if killed by a signal or not run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Archive location, when the report was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<ArchivedReport>,
}

impl RunResult {
    /// Summary for a plan-only session
    pub fn planned(path: PathBuf, records: usize) -> Self {
        Self {
            phase: SessionPhase::Planning,
            plan_path: Some(path),
            plan_records: Some(records),
            exit_code: None,
            archived: None,
        }
    }

    /// Summary for a session that ran tests
    pub fn finished(exit_code: Option<i32>, finished: &Finished, browse_base: &str) -> Self {
        let (phase, archived) = match finished {
            Finished::Archived { bucket, key, .. } => (
                SessionPhase::Archiving,
                Some(ArchivedReport::new(bucket.as_str(), key.as_str(), browse_base)),
            ),
            Finished::Done => (SessionPhase::Done, None),
        };
        Self {
            phase,
            plan_path: None,
            plan_records: None,
            exit_code,
            archived,
        }
    }
}
