//! SIMD intrinsic catalog for editor tooling.
//!
//! The crate answers "is this token a known intrinsic, what does it do, and
//! which CPU extensions does it need?" for hover, completion and highlighting
//! features. Definitions are loaded once into an immutable [`Catalog`]; after
//! that every query is a pure in-memory read.
//!
//! ```text
//! DefinitionSet (source) -> CatalogBuilder (loader) -> Catalog (index + queries)
//! ```

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod feature;
pub mod index;
pub mod loader;
pub mod query;
pub mod register;
pub mod schema;
pub mod source;
pub mod text;

pub use catalog::Catalog;
pub use config::EngineConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use entry::{Category, Entry, IntrinsicName, Masking, Parameter, Prototype, VectorWidth};
pub use error::CatalogError;
pub use feature::{
    AnnotationIssue, CpuFeature, FeatureRequirementSet, KnownFeature, ParsedRequirement,
    TargetFeatures,
};
pub use loader::{CatalogBuilder, ConflictPolicy};
pub use query::{Completion, CompletionKind, ParameterHelp, SignatureHelp, TokenClass};
pub use register::RegisterType;
pub use source::{DefinitionSet, RawDefinition, RejectedRecord, SourceInfo};

use std::sync::OnceLock;

static BUILTIN: OnceLock<Result<Catalog, CatalogError>> = OnceLock::new();

/// Shared catalog built from the bundled definitions with the default policy.
///
/// Built on first use; concurrent first calls still build it once. An error
/// means intrinsic support should be treated as disabled.
pub fn builtin_catalog() -> Result<&'static Catalog, &'static CatalogError> {
    BUILTIN
        .get_or_init(|| {
            let catalog = Catalog::builtin(ConflictPolicy::default());
            match &catalog {
                Ok(catalog) => catalog.diagnostics().emit(),
                Err(err) => tracing::error!(error = %err, "bundled intrinsic definitions unavailable"),
            }
            catalog
        })
        .as_ref()
}

/// Split a comma and/or whitespace separated list into its items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
