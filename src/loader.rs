//! Turns an ordered [`DefinitionSet`] into an immutable [`Catalog`].
//!
//! Records are processed in declaration order. A record with an invalid name
//! is rejected; everything else is admitted, with annotation problems reported
//! as diagnostics. Records the source could not read at all arrive as
//! [`RejectedRecord`]s and are reported the same way. When two records share a
//! canonical name the [`ConflictPolicy`] picks the survivor, unless the
//! records are identical, in which case the later one is dropped without
//! comment.

use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::entry::{Entry, IntrinsicName, Prototype};
use crate::feature::{AnnotationIssue, parse_summary};
use crate::source::{DefinitionSet, RawDefinition, RejectedRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::str::FromStr;

/// How to resolve two different records with the same name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the record declared first. Later records are treated as stale.
    #[default]
    FirstWins,
    LastWins,
    /// Keep the record with the higher `priority`; ties keep the earlier one.
    ByPriority,
}

impl ConflictPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictPolicy::FirstWins => "first_wins",
            ConflictPolicy::LastWins => "last_wins",
            ConflictPolicy::ByPriority => "by_priority",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_wins" | "first" => Ok(ConflictPolicy::FirstWins),
            "last_wins" | "last" => Ok(ConflictPolicy::LastWins),
            "by_priority" | "priority" => Ok(ConflictPolicy::ByPriority),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected first_wins, last_wins or by_priority)"
            )),
        }
    }
}

struct Candidate {
    entry: Entry,
    priority: i32,
    record: usize,
}

/// Builds catalogs from definition sets.
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogBuilder {
    policy: ConflictPolicy,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build a catalog. Never fails; problems end up in the diagnostics.
    pub fn build(&self, set: &DefinitionSet) -> Catalog {
        let mut diagnostics = Diagnostics::default();
        let mut slots: BTreeMap<IntrinsicName, Candidate> = BTreeMap::new();

        let mut rejected = set.rejected.iter().peekable();

        for (record, raw) in set.indexed_records() {
            while let Some(bad) = rejected.next_if(|bad| bad.record < record) {
                diagnostics.push(unreadable(bad));
            }
            let Some(candidate) = admit(record, raw, &mut diagnostics) else {
                continue;
            };

            match slots.entry(candidate.entry.name.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                btree_map::Entry::Occupied(mut slot) => {
                    let existing = slot.get();
                    if existing.entry.same_content(&candidate.entry)
                        && existing.priority == candidate.priority
                    {
                        tracing::trace!(
                            name = %candidate.entry.name,
                            record,
                            first = existing.record,
                            "dropping identical duplicate definition"
                        );
                        continue;
                    }

                    let replace = match self.policy {
                        ConflictPolicy::FirstWins => false,
                        ConflictPolicy::LastWins => true,
                        ConflictPolicy::ByPriority => candidate.priority > existing.priority,
                    };
                    let (kept, discarded) = if replace {
                        (&candidate, existing)
                    } else {
                        (existing, &candidate)
                    };
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::DefinitionConflict {
                            kept: kept.record,
                            discarded: discarded.record,
                        },
                        record,
                        &raw.name,
                        format!(
                            "conflicting definitions under {}: kept record {} ({}), discarded record {} ({})",
                            self.policy,
                            kept.record,
                            kept.entry.requirement,
                            discarded.record,
                            discarded.entry.requirement,
                        ),
                    ));
                    if replace {
                        slot.insert(candidate);
                    }
                }
            }
        }

        for bad in rejected {
            diagnostics.push(unreadable(bad));
        }

        let entries: Vec<Entry> = slots.into_values().map(|c| c.entry).collect();
        tracing::debug!(
            origin = %set.info.origin,
            records = set.records.len(),
            entries = entries.len(),
            diagnostics = diagnostics.len(),
            policy = %self.policy,
            "built intrinsic catalog"
        );
        Catalog::from_parts(entries, diagnostics, set.info.clone())
    }
}

fn unreadable(bad: &RejectedRecord) -> Diagnostic {
    Diagnostic::warning(
        DiagnosticKind::MalformedRecord,
        bad.record,
        &bad.name,
        format!("record skipped: {}", bad.message),
    )
}

fn admit(record: usize, raw: &RawDefinition, diagnostics: &mut Diagnostics) -> Option<Candidate> {
    let name = match IntrinsicName::parse(&raw.name) {
        Ok(name) => name,
        Err(err) => {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::InvalidName,
                record,
                &raw.name,
                format!("record rejected: {err}"),
            ));
            return None;
        }
    };

    let parsed = parse_summary(&raw.summary);
    for issue in &parsed.issues {
        let diagnostic = match issue {
            AnnotationIssue::Unknown(_) => Diagnostic::info(
                DiagnosticKind::UnknownFeature,
                record,
                &raw.name,
                issue.to_string(),
            ),
            _ => Diagnostic::warning(
                DiagnosticKind::MalformedAnnotation,
                record,
                &raw.name,
                issue.to_string(),
            ),
        };
        diagnostics.push(diagnostic);
    }
    if parsed.description.is_empty() {
        diagnostics.push(Diagnostic::info(
            DiagnosticKind::EmptyDescription,
            record,
            &raw.name,
            "description is empty".to_string(),
        ));
    }

    let prototype = match &raw.return_type {
        Some(return_type) => Some(Prototype {
            return_type: return_type.clone(),
            parameters: raw.parameters.clone(),
        }),
        None => {
            if !raw.parameters.is_empty() {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::MalformedRecord,
                    record,
                    &raw.name,
                    "parameters listed without return_type; prototype dropped".to_string(),
                ));
            }
            None
        }
    };

    let entry = Entry::new(name, parsed.description, parsed.requirement)
        .with_prototype(prototype)
        .with_instruction(raw.instruction.clone())
        .with_operation(raw.operation.clone());
    Some(Candidate {
        entry,
        priority: raw.priority,
        record,
    })
}
