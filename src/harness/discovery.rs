//! Loading discovered test items from a collection manifest.
//!
//! The discovery engine is external. It hands over its results as a JSON
//! document: either a bare array of items or an object with an `items`
//! array. Order in the document is discovery order.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::types::TestItem;

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors raised while reading a collection manifest
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to read collection manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid collection manifest {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    Items(Vec<TestItem>),
    Wrapped { items: Vec<TestItem> },
}

/// Parse a manifest document into items, preserving order
pub fn parse_items(json: &str, origin: &str) -> DiscoveryResult<Vec<TestItem>> {
    let manifest: Manifest = serde_json::from_str(json).map_err(|source| DiscoveryError::Json {
        path: origin.to_string(),
        source,
    })?;
    Ok(match manifest {
        Manifest::Items(items) | Manifest::Wrapped { items } => items,
    })
}

/// Load items from a manifest file, or from stdin when `path` is `-`
pub fn load_items(path: &Path) -> DiscoveryResult<Vec<TestItem>> {
    let origin = path.display().to_string();
    let io_err = |source| DiscoveryError::Io {
        path: origin.clone(),
        source,
    };

    let json = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(io_err)?;
        buf
    } else {
        fs::read_to_string(path).map_err(io_err)?
    };

    let items = parse_items(&json, &origin)?;
    tracing::debug!(manifest = %origin, items = items.len(), "loaded collected items");
    Ok(items)
}
