//! Test plan extraction.
//!
//! Turns discovered test items into one [`PlanRecord`] per item and writes
//! them as a `title,description,markers` CSV. Extraction is pure; only
//! [`write_plan`] touches the filesystem.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::harness::types::TestItem;

/// Column header of the plan file
pub const PLAN_HEADER: [&str; 3] = ["title", "description", "markers"];

/// Result type for plan operations
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while building or writing a test plan
#[derive(Debug, Error)]
pub enum PlanError {
    /// The described suite has a test without a docstring
    #[error("test {title} has no docstring; every test in the plan must be documented")]
    MissingDocstring { title: String },

    #[error("failed to write test plan: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One row of the test plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRecord {
    /// `<module>.py::<Class>::<name>` or `<module>.py::<name>`
    pub title: String,

    /// Normalized docstring
    pub description: String,

    /// Comma-joined marker names, empty when the test has none
    pub markers: String,
}

impl PlanRecord {
    /// Derive the plan record for a single item
    pub fn from_item(item: &TestItem) -> PlanResult<Self> {
        let title = derive_title(item);
        let description = match item.docstring.as_deref().map(str::trim) {
            Some(doc) if !doc.is_empty() => normalize_docstring(doc),
            _ => return Err(PlanError::MissingDocstring { title }),
        };

        Ok(Self {
            title,
            description,
            markers: join_markers(item),
        })
    }
}

/// Fully qualified title for an item
pub fn derive_title(item: &TestItem) -> String {
    match &item.class {
        Some(class) => format!("{}.py::{}::{}", item.module, class, item.name),
        None => format!("{}.py::{}", item.module, item.name),
    }
}

/// Trim the docstring and drop the indentation that follows each newline.
///
/// Blank lines inside the docstring are whitespace too, so they collapse
/// into the following line break.
pub fn normalize_docstring(doc: &str) -> String {
    static INDENT: OnceLock<Regex> = OnceLock::new();
    let indent = INDENT.get_or_init(|| Regex::new(r"\n\s+").expect("valid indent pattern"));
    indent.replace_all(doc.trim(), "\n").into_owned()
}

/// Comma-join marker names in attachment order, keeping duplicates
pub fn join_markers(item: &TestItem) -> String {
    item.markers
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the plan for a collected session, in discovery order.
///
/// Fails on the first item without a docstring.
pub fn extract_plan(items: &[TestItem]) -> PlanResult<Vec<PlanRecord>> {
    items.iter().map(PlanRecord::from_item).collect()
}

/// Serialize plan records as CSV (minimal quoting, `"` quote char)
pub fn write_records<W: io::Write>(writer: W, records: &[PlanRecord]) -> PlanResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .has_headers(false)
        .from_writer(writer);

    out.write_record(PLAN_HEADER)?;
    for record in records {
        out.write_record([&record.title, &record.description, &record.markers])?;
    }
    out.flush()?;
    Ok(())
}

/// Extract the plan for `items` and write it to `path`.
///
/// Nothing is written when any item lacks a docstring.
pub fn write_plan(path: &Path, items: &[TestItem]) -> PlanResult<Vec<PlanRecord>> {
    let records = extract_plan(items)?;
    let file = fs::File::create(path)?;
    write_records(io::BufWriter::new(file), &records)?;

    tracing::info!(path = %path.display(), records = records.len(), "wrote test plan");
    Ok(records)
}
