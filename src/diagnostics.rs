//! Non-fatal findings collected while building a catalog.
//!
//! Nothing in here is an error. A diagnostic records that the loader made a
//! decision on the host's behalf (kept one of two conflicting records, dropped
//! an unparseable feature token) so tooling can show it.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Two records share a name but differ; `kept` and `discarded` are record
    /// indices in declaration order.
    DefinitionConflict { kept: usize, discarded: usize },
    /// The record could not be read, or part of it was unusable.
    MalformedRecord,
    MalformedAnnotation,
    UnknownFeature,
    InvalidName,
    EmptyDescription,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::DefinitionConflict { .. } => "definition_conflict",
            DiagnosticKind::MalformedRecord => "malformed_record",
            DiagnosticKind::MalformedAnnotation => "malformed_annotation",
            DiagnosticKind::UnknownFeature => "unknown_feature",
            DiagnosticKind::InvalidName => "invalid_name",
            DiagnosticKind::EmptyDescription => "empty_description",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// Index of the record that triggered the finding.
    pub record: usize,
    /// Raw name as written in the definition set.
    pub name: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, record: usize, name: &str, message: String) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            record,
            name: name.to_string(),
            message,
        }
    }

    pub fn info(kind: DiagnosticKind, record: usize, name: &str, message: String) -> Self {
        Self {
            severity: Severity::Info,
            kind,
            record,
            name: name.to_string(),
            message,
        }
    }

    /// Forward to `tracing` at the level matching the severity.
    pub fn emit(&self) {
        match self.severity {
            Severity::Warning => tracing::warn!(
                kind = self.kind.label(),
                record = self.record,
                name = %self.name,
                "{}",
                self.message
            ),
            Severity::Info => tracing::info!(
                kind = self.kind.label(),
                record = self.record,
                name = %self.name,
                "{}",
                self.message
            ),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] record {} '{}': {}",
            self.severity,
            self.kind.label(),
            self.record,
            self.name,
            self.message
        )
    }
}

/// Diagnostics in the order they were raised.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| matches!(d.kind, DiagnosticKind::DefinitionConflict { .. }))
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    pub fn emit(&self) {
        for diagnostic in &self.items {
            diagnostic.emit();
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_filters() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::warning(
            DiagnosticKind::DefinitionConflict {
                kept: 0,
                discarded: 3,
            },
            3,
            "_mm512_cmplt_epi32_mask",
            "kept (AVX512F), discarded (KNCNI)".to_string(),
        ));
        diagnostics.push(Diagnostic::info(
            DiagnosticKind::UnknownFeature,
            5,
            "_tile_loadd",
            "unknown feature 'AMX_TILE'".to_string(),
        ));

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.conflicts().count(), 1);
        assert_eq!(diagnostics.count(Severity::Warning), 1);
        assert_eq!(diagnostics.count(Severity::Info), 1);
    }

    #[test]
    fn serializes_with_flat_kind() {
        let diagnostic = Diagnostic::warning(
            DiagnosticKind::DefinitionConflict {
                kept: 1,
                discarded: 2,
            },
            2,
            "_X",
            "conflict".to_string(),
        );
        let value = serde_json::to_value(&diagnostic).expect("serialize");
        assert_eq!(value["kind"], "definition_conflict");
        assert_eq!(value["kept"], 1);
        assert_eq!(value["discarded"], 2);
        assert_eq!(value["severity"], "warning");
    }

    #[test]
    fn display_is_single_line() {
        let diagnostic = Diagnostic::info(
            DiagnosticKind::EmptyDescription,
            7,
            "_rdtsc",
            "description is empty".to_string(),
        );
        assert_eq!(
            diagnostic.to_string(),
            "info: [empty_description] record 7 '_rdtsc': description is empty"
        );
    }
}
