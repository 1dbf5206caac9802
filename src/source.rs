//! Raw definition sets: the ordered records a catalog is built from.
//!
//! Two encodings are understood:
//!
//! * the versioned JSON document shipped in `data/intrinsics_v1.json`
//!   (`{"schema_version": ..., "version": ..., "definitions": [...]}`);
//! * the summary listing produced by the data generator, where each record is
//!   a `///<summary>TEXT (CPUIDS)</summary>` comment followed by `NAME,`.
//!
//! Records keep their declaration order. Duplicates are not resolved here;
//! that is the loader's job.

use crate::entry::Parameter;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Schema version of the bundled JSON definitions.
pub const DEFAULT_SCHEMA_VERSION: &str = "intrinsic_definitions_v1";
/// Pseudo schema version reported for listing-format sources.
pub const LISTING_SCHEMA_VERSION: &str = "summary_listing";
/// Comma-separated extra schema versions to accept.
pub const ENV_ALLOWED_SCHEMA_VERSIONS: &str = "INTRINSICS_ALLOWED_SCHEMAS";

const BUILTIN_DEFINITIONS: &str = include_str!("../data/intrinsics_v1.json");
const BUILTIN_ORIGIN: &str = "builtin:data/intrinsics_v1.json";

/// One record as written in the source, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawDefinition {
    pub name: String,
    /// Description followed by the trailing feature annotation.
    pub summary: String,
    /// Only consulted by the `by_priority` conflict policy.
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl RawDefinition {
    pub fn new(name: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            priority: 0,
            return_type: None,
            parameters: Vec::new(),
            instruction: None,
            operation: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Attach a C prototype given as `(type, name)` pairs.
    pub fn with_prototype<'a>(
        mut self,
        return_type: impl Into<String>,
        parameters: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.return_type = Some(return_type.into());
        self.parameters = parameters
            .into_iter()
            .map(|(ty, name)| Parameter::new(ty, name))
            .collect();
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

/// A record that could not be read as a [`RawDefinition`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position in the source, counting every record.
    pub record: usize,
    /// The record's `name` when it is at least a string.
    pub name: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct DefinitionDocument {
    schema_version: String,
    #[serde(default)]
    version: Option<String>,
    definitions: Vec<Value>,
}

/// Where a definition set came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub origin: String,
    pub schema_version: String,
    pub version: Option<String>,
    /// Raw record count, duplicates included.
    pub records: usize,
}

/// Ordered raw records plus provenance.
///
/// `records` holds the readable records in order; `rejected` the ones that
/// were not, keyed by their position in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinitionSet {
    pub info: SourceInfo,
    pub records: Vec<RawDefinition>,
    pub rejected: Vec<RejectedRecord>,
}

impl DefinitionSet {
    /// Wrap in-memory records. No validation beyond what the loader does.
    pub fn from_records(origin: impl Into<String>, records: Vec<RawDefinition>) -> Self {
        Self {
            info: SourceInfo {
                origin: origin.into(),
                schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
                version: None,
                records: records.len(),
            },
            records,
            rejected: Vec::new(),
        }
    }

    /// The definitions compiled into the library.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_DEFINITIONS, BUILTIN_ORIGIN)
    }

    /// Load from disk, picking the encoding from the file contents.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        if text.trim_start().starts_with('{') {
            Self::from_json_str(&text, &origin)
        } else {
            Self::from_listing(&text, &origin)
        }
    }

    pub fn from_json_str(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let document: DefinitionDocument =
            serde_json::from_str(text).map_err(|source| CatalogError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        validate_schema_version(&document.schema_version)?;
        if document.definitions.is_empty() {
            return Err(CatalogError::Empty(origin.to_string()));
        }

        let total = document.definitions.len();
        let mut records = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (record, value) in document.definitions.into_iter().enumerate() {
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match RawDefinition::deserialize(value) {
                Ok(raw) => records.push(raw),
                Err(err) => rejected.push(RejectedRecord {
                    record,
                    name,
                    message: err.to_string(),
                }),
            }
        }
        Ok(Self {
            info: SourceInfo {
                origin: origin.to_string(),
                schema_version: document.schema_version,
                version: document.version,
                records: total,
            },
            records,
            rejected,
        })
    }

    /// Parse the generator's summary listing.
    ///
    /// Commented-out records (`//NAME,`) are returned like any other record so
    /// the conflict policy sees them.
    pub fn from_listing(text: &str, origin: &str) -> Result<Self, CatalogError> {
        let records = parse_listing(text);
        if records.is_empty() {
            return Err(CatalogError::Empty(origin.to_string()));
        }
        Ok(Self {
            info: SourceInfo {
                origin: origin.to_string(),
                schema_version: LISTING_SCHEMA_VERSION.to_string(),
                version: None,
                records: records.len(),
            },
            records,
            rejected: Vec::new(),
        })
    }

    /// Readable records with their position in the source.
    pub fn indexed_records(&self) -> impl Iterator<Item = (usize, &RawDefinition)> + '_ {
        let mut skipped = self.rejected.iter().map(|r| r.record).peekable();
        let mut next = 0;
        self.records.iter().map(move |raw| {
            while skipped.peek() == Some(&next) {
                skipped.next();
                next += 1;
            }
            let position = next;
            next += 1;
            (position, raw)
        })
    }

    /// Readable records only.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn strip_comment_markers(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '/' || c.is_whitespace())
        .trim_end()
}

fn parse_listing(text: &str) -> Vec<RawDefinition> {
    let mut records = Vec::new();
    let mut pending: Option<String> = None;
    let mut open_summary: Option<String> = None;

    for line in text.lines() {
        let body = strip_comment_markers(line);

        if let Some(partial) = open_summary.as_mut() {
            match body.split_once("</summary>") {
                Some((tail, _)) => {
                    partial.push(' ');
                    partial.push_str(tail.trim());
                    pending = open_summary.take().map(|s| s.trim().to_string());
                }
                None => {
                    partial.push(' ');
                    partial.push_str(body);
                }
            }
            continue;
        }

        if let Some(rest) = body.strip_prefix("<summary>") {
            match rest.split_once("</summary>") {
                Some((summary, _)) => pending = Some(summary.trim().to_string()),
                None => open_summary = Some(rest.trim().to_string()),
            }
            continue;
        }

        if body.is_empty() {
            continue;
        }

        if let Some(summary) = pending.take() {
            let name = body.split(',').next().unwrap_or(body).trim();
            records.push(RawDefinition::new(name, summary));
        } else {
            tracing::trace!(line = body, "skipping listing line without summary");
        }
    }
    records
}

/// Reject schema versions this build does not know.
///
/// `INTRINSICS_ALLOWED_SCHEMAS` widens the accepted set.
pub fn validate_schema_version(schema_version: &str) -> Result<(), CatalogError> {
    if schema_version.is_empty()
        || !schema_version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(CatalogError::InvalidSchemaVersion(schema_version.to_string()));
    }

    let allowed = allowed_schema_versions();
    if !allowed.contains(schema_version) {
        return Err(CatalogError::UnsupportedSchemaVersion {
            found: schema_version.to_string(),
            allowed: allowed.into_iter().collect(),
        });
    }
    Ok(())
}

pub fn allowed_schema_versions() -> BTreeSet<String> {
    let mut versions = BTreeSet::new();
    versions.insert(DEFAULT_SCHEMA_VERSION.to_string());
    if let Ok(raw) = std::env::var(ENV_ALLOWED_SCHEMA_VERSIONS) {
        for v in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            versions.insert(v.to_string());
        }
    }
    versions
}
