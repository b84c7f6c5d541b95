//! Google Cloud Storage upload client.
//!
//! Uploads are delegated to the `gsutil` CLI, which owns authentication.
//! The service key path is handed to it unchanged.
//!
//! The session controller only sees the [`ObjectStore`] / [`Bucket`] seam,
//! so tests and other stores can stand in for GCS.
//!
//! # Configuration
//!
//! - `TESTPLAN_GCS_GSUTIL`: `gsutil` executable (default `gsutil`)

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::config;

/// Result type for object-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to an object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store client could not be started
    #[error("object store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the upload
    #[error("upload of {local} to {key} failed: {message}")]
    UploadFailed {
        local: String,
        key: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens named buckets with a credentials file
pub trait ObjectStore {
    fn bucket(&self, credentials_path: &Path, bucket: &str) -> StoreResult<Box<dyn Bucket + '_>>;
}

/// A writable bucket handle
pub trait Bucket {
    /// Bucket name
    fn name(&self) -> &str;

    /// Upload a local file to `remote_key`
    fn upload(&self, local_path: &Path, remote_key: &str) -> StoreResult<()>;
}

/// GCS store backed by the `gsutil` CLI
#[derive(Debug, Clone)]
pub struct GcsStore {
    /// `gsutil` executable name or path
    pub gsutil: String,
}

impl Default for GcsStore {
    fn default() -> Self {
        Self {
            gsutil: config::gsutil(),
        }
    }
}

impl GcsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gsutil(mut self, gsutil: impl Into<String>) -> Self {
        self.gsutil = gsutil.into();
        self
    }

    /// Check that the `gsutil` executable can be started
    pub fn check_available(&self) -> StoreResult<()> {
        let status = Command::new(&self.gsutil)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.gsutil, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "{} version exited with {}",
                self.gsutil, status
            )))
        }
    }
}

impl ObjectStore for GcsStore {
    fn bucket(&self, credentials_path: &Path, bucket: &str) -> StoreResult<Box<dyn Bucket + '_>> {
        Ok(Box::new(GcsBucket {
            gsutil: self.gsutil.clone(),
            key_path: credentials_path.to_path_buf(),
            name: bucket.to_string(),
        }))
    }
}

/// A GCS bucket authenticated with a service key file
#[derive(Debug, Clone)]
pub struct GcsBucket {
    gsutil: String,
    key_path: PathBuf,
    name: String,
}

impl GcsBucket {
    /// `gs://` URI of an object in this bucket
    pub fn object_uri(&self, remote_key: &str) -> String {
        format!("gs://{}/{}", self.name, remote_key)
    }

    fn upload_command(&self, local_path: &Path, remote_key: &str) -> Command {
        let mut cmd = Command::new(&self.gsutil);
        cmd.arg("-q")
            .arg("-o")
            .arg(format!(
                "Credentials:gs_service_key_file={}",
                self.key_path.display()
            ))
            .arg("cp")
            .arg(local_path)
            .arg(self.object_uri(remote_key))
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Bucket for GcsBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn upload(&self, local_path: &Path, remote_key: &str) -> StoreResult<()> {
        if !local_path.is_file() {
            return Err(StoreError::UploadFailed {
                local: local_path.display().to_string(),
                key: remote_key.to_string(),
                message: "local file does not exist".to_string(),
            });
        }

        tracing::debug!(
            gsutil = %self.gsutil,
            uri = %self.object_uri(remote_key),
            "starting gsutil upload"
        );

        let output = self
            .upload_command(local_path, remote_key)
            .output()
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.gsutil, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim().lines().last().unwrap_or_default();
            let message = if detail.is_empty() {
                format!("gsutil exited with {}", output.status)
            } else {
                detail.to_string()
            };
            return Err(StoreError::UploadFailed {
                local: local_path.display().to_string(),
                key: remote_key.to_string(),
                message,
            });
        }

        Ok(())
    }
}
