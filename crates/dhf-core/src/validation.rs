//! Load-time validation of DHF documents.
//!
//! The engine degrades gracefully on imperfect data: unknown commits are
//! treated as absent, missing text falls back to the latest text, and
//! malformed segments are dropped. Validation surfaces those cases so they
//! can be fixed at the source instead of silently rendered.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Action, Document, SegmentKind};

/// Result of validating a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Commits in the ledger
    pub commit_count: usize,
    /// Segments in the content
    pub segment_count: usize,
    /// Problems found, in document order
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

/// A data-quality problem detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Index of the offending segment, if the problem is segment-local
    pub segment: Option<usize>,
    /// Problem category
    pub kind: ViolationKind,
    /// Human-readable detail
    pub description: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.segment {
            Some(index) => write!(f, "segment {index}: {}", self.description),
            None => write!(f, "ledger: {}", self.description),
        }
    }
}

/// Category of a validation problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Document has segments but no commits
    EmptyLedger,
    /// Two ledger entries share an id
    DuplicateCommitId,
    /// Commit date is not RFC 3339
    UnparseableDate,
    /// A change or history entry names a commit missing from the ledger
    UnknownCommit,
    /// An `unchanged` segment carries change or history
    UnchangedWithProvenance,
    /// A non-`unchanged` segment has neither change nor history
    MissingProvenance,
    /// A non-deleting history entry records neither `after` nor `text`
    MissingText,
    /// History entries are not in ledger order
    HistoryOutOfOrder,
    /// A deleted segment has no history, so its earlier text is lost
    DeletedWithoutHistory,
    /// Stored summary disagrees with the ledger
    SummaryMismatch,
}

/// Validate a document against the DHF invariants.
#[must_use]
pub fn validate(document: &Document) -> ValidationReport {
    let mut violations = Vec::new();
    let ledger = document.ledger();

    if ledger.is_empty() && !document.content.is_empty() {
        violations.push(Violation {
            segment: None,
            kind: ViolationKind::EmptyLedger,
            description: "document has content but no commits".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for commit in ledger.iter() {
        if !seen.insert(commit.id.as_str()) {
            violations.push(Violation {
                segment: None,
                kind: ViolationKind::DuplicateCommitId,
                description: format!("commit id {} appears more than once", commit.id),
            });
        }
        if commit.timestamp().is_none() {
            violations.push(Violation {
                segment: None,
                kind: ViolationKind::UnparseableDate,
                description: format!("commit {} has unparseable date {:?}", commit.id, commit.date),
            });
        }
    }

    for (index, segment) in document.content.iter().enumerate() {
        let mut report = |kind, description: String| {
            violations.push(Violation {
                segment: Some(index),
                kind,
                description,
            });
        };

        let history = segment.history_entries();

        if segment.kind == SegmentKind::Unchanged {
            if segment.change.is_some() || segment.history.is_some() {
                report(
                    ViolationKind::UnchangedWithProvenance,
                    "unchanged segment carries change or history".to_string(),
                );
            }
            continue;
        }

        if segment.change.is_none() && history.is_empty() {
            report(
                ViolationKind::MissingProvenance,
                format!("{} segment has neither change nor history", segment.kind),
            );
            continue;
        }

        if let Some(change) = &segment.change {
            if ledger.position(&change.commit).is_none() {
                report(
                    ViolationKind::UnknownCommit,
                    format!("change references unknown commit {}", change.commit),
                );
            }
        }

        if segment.kind == SegmentKind::Deleted && history.is_empty() {
            report(
                ViolationKind::DeletedWithoutHistory,
                "deleted segment has no history; its earlier text cannot be reconstructed"
                    .to_string(),
            );
        }

        let mut last_position = None;
        for (entry_index, entry) in history.iter().enumerate() {
            match ledger.position(&entry.commit) {
                None => report(
                    ViolationKind::UnknownCommit,
                    format!(
                        "history entry {entry_index} references unknown commit {}",
                        entry.commit
                    ),
                ),
                Some(position) => {
                    if last_position.is_some_and(|last| position < last) {
                        report(
                            ViolationKind::HistoryOutOfOrder,
                            format!(
                                "history entry {entry_index} ({}) is older than the entry before it",
                                entry.commit
                            ),
                        );
                    }
                    last_position = Some(position);
                }
            }

            if entry.action != Action::Deleted && entry.resulting_text().is_none() {
                report(
                    ViolationKind::MissingText,
                    format!(
                        "history entry {entry_index} ({} {}) records no resulting text",
                        entry.action, entry.commit
                    ),
                );
            }
        }
    }

    if let Some(summary) = &document.summary {
        if summary.total_commits != ledger.len() {
            violations.push(Violation {
                segment: None,
                kind: ViolationKind::SummaryMismatch,
                description: format!(
                    "summary reports {} commits but ledger has {}",
                    summary.total_commits,
                    ledger.len()
                ),
            });
        }
    }

    if !violations.is_empty() {
        tracing::debug!(violations = violations.len(), "Document failed validation");
    }

    ValidationReport {
        commit_count: ledger.len(),
        segment_count: document.content.len(),
        violations,
    }
}
