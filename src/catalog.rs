//! The immutable intrinsic catalog and its point/prefix queries.
//!
//! A [`Catalog`] is built once by [`crate::CatalogBuilder`] and only read
//! afterwards, so a shared reference can be handed to any number of threads.
//! Every query upper-cases its token before looking it up; tokens are never
//! trimmed. A miss is `None` (or an empty slice), never an error.

use crate::diagnostics::Diagnostics;
use crate::entry::Entry;
use crate::error::CatalogError;
use crate::feature::{FeatureRequirementSet, TargetFeatures};
use crate::index::LookupIndex;
use crate::loader::{CatalogBuilder, ConflictPolicy};
use crate::source::{DefinitionSet, SourceInfo};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    index: LookupIndex,
    diagnostics: Diagnostics,
    source: SourceInfo,
}

impl Catalog {
    pub(crate) fn from_parts(
        entries: Vec<Entry>,
        diagnostics: Diagnostics,
        source: SourceInfo,
    ) -> Self {
        Self {
            index: LookupIndex::build(entries),
            diagnostics,
            source,
        }
    }

    /// Build a fresh catalog from the bundled definitions.
    ///
    /// Most hosts want the shared instance from [`crate::builtin_catalog`].
    pub fn builtin(policy: ConflictPolicy) -> Result<Self, CatalogError> {
        let set = DefinitionSet::builtin()?;
        Ok(CatalogBuilder::new().policy(policy).build(&set))
    }

    /// Build a catalog from a definitions file (JSON document or listing).
    pub fn from_path(path: &Path, policy: ConflictPolicy) -> Result<Self, CatalogError> {
        let set = DefinitionSet::from_path(path)?;
        Ok(CatalogBuilder::new().policy(policy).build(&set))
    }

    /// The entry for `token`, if it names a known intrinsic.
    pub fn classify(&self, token: &str) -> Option<&Entry> {
        self.index.get(&token.to_ascii_uppercase())
    }

    pub fn describe(&self, token: &str) -> Option<&str> {
        self.classify(token).map(|entry| entry.description.as_str())
    }

    /// Required features; an empty set for baseline intrinsics.
    pub fn required_features(&self, token: &str) -> Option<&FeatureRequirementSet> {
        self.classify(token).map(|entry| &entry.requirement)
    }

    /// Required features the target does not enable. Empty when usable.
    pub fn missing_features(
        &self,
        token: &str,
        target: &TargetFeatures,
    ) -> Option<FeatureRequirementSet> {
        self.required_features(token)
            .map(|requirement| requirement.missing_from(target))
    }

    /// Entries whose name starts with `partial`, in name order.
    pub fn prefix(&self, partial: &str) -> &[Entry] {
        self.index.prefix(&partial.to_ascii_uppercase())
    }

    pub fn entries(&self) -> &[Entry] {
        self.index.entries()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Entries whose derived operation word equals `operation` (any case).
    pub fn by_category<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries()
            .iter()
            .filter(move |entry| entry.category.operation.eq_ignore_ascii_case(operation))
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }
}
