//! Option registry.
//!
//! Declares the two option groups the harness understands (`testplan` and
//! `gcs`) and the report-renderer options they interact with. Options are
//! only declared and populated here; cross-option validation happens when
//! a session is configured.

use std::path::PathBuf;

use clap::Args;

use crate::config;

/// All harness options, populated from flags or environment
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessOptions {
    #[command(flatten)]
    pub testplan: TestplanOptions,

    #[command(flatten)]
    pub gcs: GcsOptions,

    #[command(flatten)]
    pub report: ReportOptions,
}

/// testplan group
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "testplan")]
pub struct TestplanOptions {
    /// generate csv containing test metadata
    #[arg(long = "testplan", value_name = "PATH", env = config::ENV_TESTPLAN)]
    pub path: Option<PathBuf>,
}

/// gcs group
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(next_help_heading = "gcs")]
pub struct GcsOptions {
    /// path to Google Cloud service key credentials
    #[arg(long = "gcs-service-key", value_name = "PATH", env = config::ENV_SERVICE_KEY)]
    pub service_key: Option<PathBuf>,

    /// name of Google Cloud Storage bucket for storing reports
    #[arg(long = "gcs-bucket", value_name = "NAME", env = config::ENV_BUCKET)]
    pub bucket: Option<String>,

    /// filenames are prefixed by a timestamp to uniquely identify the report
    #[arg(
        long = "gcs-filename",
        value_name = "PREFIX",
        env = config::ENV_REPORT_PREFIX,
        default_value = config::DEFAULT_REPORT_PREFIX
    )]
    pub filename: String,
}

impl Default for GcsOptions {
    fn default() -> Self {
        Self {
            service_key: None,
            bucket: None,
            filename: config::DEFAULT_REPORT_PREFIX.to_string(),
        }
    }
}

/// Options owned by the HTML report renderer
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "report")]
pub struct ReportOptions {
    /// create html report file at given path
    #[arg(long = "html", value_name = "PATH", env = config::ENV_HTML)]
    pub html_path: Option<PathBuf>,

    /// create a self-contained html file containing all necessary styles
    #[arg(long = "self-contained-html")]
    pub self_contained: bool,
}

impl HarnessOptions {
    pub fn testplan(mut self, path: impl Into<PathBuf>) -> Self {
        self.testplan.path = Some(path.into());
        self
    }

    pub fn service_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.gcs.service_key = Some(path.into());
        self
    }

    pub fn bucket(mut self, name: impl Into<String>) -> Self {
        self.gcs.bucket = Some(name.into());
        self
    }

    pub fn filename(mut self, prefix: impl Into<String>) -> Self {
        self.gcs.filename = prefix.into();
        self
    }

    pub fn html(mut self, path: impl Into<PathBuf>) -> Self {
        self.report.html_path = Some(path.into());
        self
    }
}
