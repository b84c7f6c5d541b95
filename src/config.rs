//! Configuration management with environment variable support.
//!
//! Command-line flags cover the per-session options (see [`crate::options`]).
//! This module holds the process-wide settings that rarely change between
//! runs and are read from the environment:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TESTPLAN_GCS_GSUTIL` | `gsutil` executable used for uploads | `gsutil` |
//! | `TESTPLAN_GCS_BROWSE_URL` | Base URL printed for archived reports | `https://storage.cloud.google.com` |
//! | `TESTPLAN_GCS_FILENAME` | Report filename prefix (`--gcs-filename`) | `report` |
//!
//! # Example
//!
//! ```bash
//! # Use a gsutil from a pinned SDK install
//! export TESTPLAN_GCS_GSUTIL="/opt/google-cloud-sdk/bin/gsutil"
//! ```

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default `gsutil` executable
pub const DEFAULT_GSUTIL: &str = "gsutil";

/// Default base URL for browsing archived objects
pub const DEFAULT_BROWSE_URL: &str = "https://storage.cloud.google.com";

/// Default report filename prefix
pub const DEFAULT_REPORT_PREFIX: &str = "report";

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the `gsutil` executable
pub const ENV_GSUTIL: &str = "TESTPLAN_GCS_GSUTIL";

/// Environment variable for the browse base URL
pub const ENV_BROWSE_URL: &str = "TESTPLAN_GCS_BROWSE_URL";

/// Environment variable for the report filename prefix (also read by `--gcs-filename`)
pub const ENV_REPORT_PREFIX: &str = "TESTPLAN_GCS_FILENAME";

/// Environment variable for `--testplan`
pub const ENV_TESTPLAN: &str = "TESTPLAN_GCS_TESTPLAN";

/// Environment variable for `--gcs-service-key`
pub const ENV_SERVICE_KEY: &str = "TESTPLAN_GCS_SERVICE_KEY";

/// Environment variable for `--gcs-bucket`
pub const ENV_BUCKET: &str = "TESTPLAN_GCS_BUCKET";

/// Environment variable for `--html`
pub const ENV_HTML: &str = "TESTPLAN_GCS_HTML";

/// Exported to the test command: resolved report path
pub const ENV_REPORT_PATH: &str = "TESTPLAN_GCS_REPORT_PATH";

/// Exported to the test command: `true` when the report must inline its assets
pub const ENV_SELF_CONTAINED: &str = "TESTPLAN_GCS_SELF_CONTAINED";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Config {
    /// Object store settings
    pub storage: StorageSettings,
}

/// Object-store settings
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// `gsutil` executable name or path
    pub gsutil: String,
    /// Base URL used when announcing uploads
    pub browse_url: String,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            storage: StorageSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            storage: StorageSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl StorageSettings {
    pub fn from_env() -> Self {
        Self {
            gsutil: env_or(ENV_GSUTIL, DEFAULT_GSUTIL),
            browse_url: env_or(ENV_BROWSE_URL, DEFAULT_BROWSE_URL),
        }
    }

    pub fn defaults() -> Self {
        Self {
            gsutil: DEFAULT_GSUTIL.to_string(),
            browse_url: DEFAULT_BROWSE_URL.to_string(),
        }
    }
}

/// Read a non-empty environment variable, or fall back to `default`
fn env_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Get the `gsutil` executable (convenience function)
pub fn gsutil() -> String {
    get().storage.gsutil.clone()
}

/// Get the browse base URL (convenience function)
pub fn browse_url() -> String {
    get().storage.browse_url.clone()
}
