use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A label attached to a discovered test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MarkerRepr", into = "String")]
pub struct Marker {
    /// Marker name (e.g., "high", "performance")
    pub name: String,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Markers appear in collection manifests either as bare names or as
/// `{"name": ...}` objects carrying extra, ignored fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum MarkerRepr {
    Name(String),
    Object { name: String },
}

impl From<MarkerRepr> for Marker {
    fn from(repr: MarkerRepr) -> Self {
        match repr {
            MarkerRepr::Name(name) | MarkerRepr::Object { name } => Marker { name },
        }
    }
}

impl From<Marker> for String {
    fn from(marker: Marker) -> Self {
        marker.name
    }
}

/// One discovered test case, as reported by the discovery engine.
///
/// Items are never mutated after discovery; everything downstream only
/// reads these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestItem {
    /// Owning module name, without the `.py` suffix
    pub module: String,

    /// Owning class name, if the test is a method
    #[serde(default, alias = "cls", skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Test function name
    pub name: String,

    /// Docstring of the test function
    #[serde(default, alias = "doc")]
    pub docstring: Option<String>,

    /// Attached markers in attachment order (duplicates preserved)
    #[serde(default, alias = "tags")]
    pub markers: Vec<Marker>,
}

impl TestItem {
    /// Create a module-level test item with no docstring or markers
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class: None,
            name: name.into(),
            docstring: None,
            markers: Vec::new(),
        }
    }

    /// Set the owning class
    pub fn in_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the docstring
    pub fn docstring(mut self, doc: impl Into<String>) -> Self {
        self.docstring = Some(doc.into());
        self
    }

    /// Attach a marker
    pub fn marker(mut self, name: impl Into<String>) -> Self {
        self.markers.push(Marker::new(name));
        self
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for driving the test command
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No test command was given
    #[error("no test command given")]
    EmptyCommand,

    /// The test command could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An argument references the report but no report path is configured
    #[error("argument {0:?} uses {{report}} but no report path is configured (use --html or the gcs options)")]
    NoReportPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_from_manifest_json() {
        let json = r#"{
            "module": "test_foo",
            "cls": "TestFoo",
            "name": "test_a",
            "doc": "The TestFoo.a test.",
            "tags": ["high", {"name": "performance", "args": []}]
        }"#;
        let item: TestItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.class.as_deref(), Some("TestFoo"));
        assert_eq!(item.docstring.as_deref(), Some("The TestFoo.a test."));
        assert_eq!(
            item.markers,
            vec![Marker::new("high"), Marker::new("performance")]
        );
    }

    #[test]
    fn test_item_optional_fields_default() {
        let item: TestItem =
            serde_json::from_str(r#"{"module": "mod", "name": "test_bar"}"#).unwrap();
        assert!(item.class.is_none());
        assert!(item.docstring.is_none());
        assert!(item.markers.is_empty());
    }

    #[test]
    fn test_item_builder() {
        let item = TestItem::new("mod", "test_a")
            .in_class("TestFoo")
            .docstring("doc")
            .marker("high")
            .marker("high");
        assert_eq!(item.markers.len(), 2);
        assert_eq!(item.class.as_deref(), Some("TestFoo"));
    }
}
