//! Hard failures while obtaining a definition set.
//!
//! Only the definition source itself can fail: a missing file, a document
//! that does not parse, an unsupported `schema_version`, or a document with
//! no records at all. Problems with individual records never surface here;
//! the loader turns them into [`crate::Diagnostic`]s instead.

use std::path::PathBuf;
use thiserror::Error;

/// The definition source could not be read, so no catalog can be built.
///
/// Hosts should treat this as "intrinsic support disabled" for the session.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The definition file could not be read.
    #[error("reading definitions {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The definition document is not valid JSON for the expected shape.
    #[error("parsing definitions {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    /// The document declares a schema version this build does not understand.
    #[error("schema_version '{found}' not in allowed set {allowed:?}")]
    UnsupportedSchemaVersion { found: String, allowed: Vec<String> },
    /// The schema version string itself is malformed.
    #[error("schema_version must match ^[A-Za-z0-9_.-]+$, got '{0}'")]
    InvalidSchemaVersion(String),
    /// The document parsed but contains no definition records.
    #[error("definition set {0} contains no records")]
    Empty(String),
}
