//! Time-travel reconstruction engine.
//!
//! Projects a document onto any commit in its ledger.
//!
//! # Resolution Rules
//!
//! | Segment | State at target commit |
//! |---------|------------------------|
//! | `unchanged` | Always present, as stored |
//! | With history | Effective entry decides: absent, deleted, or projected text |
//! | With change only | Present as stored once its commit is reached, unless `deleted` |
//! | Neither | Absent |
//!
//! The effective history entry is the last entry for the target commit when
//! the target touched the segment. Otherwise it is the last entry whose commit
//! is at or before the target in the ledger.
//!
//! Reconstruction never mutates its input. Segments whose state at the target
//! equals their stored state are borrowed; projected segments are allocated.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Action, Change, Document, HistoryEntry, Segment, SegmentKind};

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Emit a `debug` event for every per-segment resolution decision.
    pub trace: bool,
}

impl EngineConfig {
    /// Configuration with per-segment tracing enabled.
    #[must_use]
    pub fn traced() -> Self {
        Self { trace: true }
    }
}

/// A segment in a reconstruction, keyed by its position in the source content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedSegment<'a> {
    /// Index of the segment in `Document::content`
    pub source_index: usize,
    /// Segment state at the reconstructed commit
    #[serde(flatten)]
    pub segment: Cow<'a, Segment>,
}

impl ProjectedSegment<'_> {
    /// Whether this segment was re-derived from history rather than passed through.
    #[must_use]
    pub fn is_projected(&self) -> bool {
        matches!(self.segment, Cow::Owned(_))
    }
}

impl std::ops::Deref for ProjectedSegment<'_> {
    type Target = Segment;

    fn deref(&self) -> &Segment {
        &self.segment
    }
}

/// Document state at one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconstruction<'a> {
    /// Requested commit id
    pub commit: String,
    /// Segments present at that commit, in source order
    pub segments: Vec<ProjectedSegment<'a>>,
    /// Whether the commit is older than the latest one
    pub is_historical: bool,
}

impl<'a> Reconstruction<'a> {
    /// All of `document`'s segments as stored, labelled with `commit`.
    fn current(commit: &str, document: &'a Document) -> Self {
        Self {
            commit: commit.to_string(),
            segments: document
                .content
                .iter()
                .enumerate()
                .map(|(source_index, segment)| ProjectedSegment {
                    source_index,
                    segment: Cow::Borrowed(segment),
                })
                .collect(),
            is_historical: false,
        }
    }

    /// Document text at this commit.
    #[must_use]
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Number of segments present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether no segments are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Source indices of the segments present.
    pub fn source_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.segments.iter().map(|s| s.source_index)
    }
}

/// Errors from the reconstruction engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The document has no commits, so there is no latest state to name.
    #[error("commit ledger is empty")]
    EmptyLedger,
}

/// Why a segment is absent at the target commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Absence {
    /// No qualifying edit yet
    NotYetPresent,
    /// Effective edit removed it
    Deleted,
    /// Neither change nor history recorded
    NoProvenance,
}

impl Absence {
    fn as_str(self) -> &'static str {
        match self {
            Absence::NotYetPresent => "not yet present",
            Absence::Deleted => "deleted",
            Absence::NoProvenance => "no provenance",
        }
    }
}

/// Outcome of resolving one segment.
#[derive(Debug)]
enum Resolution<'h> {
    /// Present exactly as stored
    Keep,
    /// Present with a state derived from a history entry
    Project {
        entry: &'h HistoryEntry,
        segment: Segment,
    },
    /// Absent
    Exclude {
        entry: Option<&'h HistoryEntry>,
        reason: Absence,
    },
}

/// Reconstruction engine with injected configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconstructor {
    config: EngineConfig,
}

impl Reconstructor {
    /// Create an engine.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Reconstruct `document` as it existed at commit `target`.
    ///
    /// An id missing from the ledger yields the current segments with
    /// `is_historical == false`.
    #[must_use]
    pub fn reconstruct_at<'a>(&self, document: &'a Document, target: &str) -> Reconstruction<'a> {
        let ledger = document.ledger();
        let Some(target_index) = ledger.position(target) else {
            if self.config.trace {
                tracing::debug!(
                    target_commit = target,
                    "Commit not in ledger, returning current state"
                );
            }
            return Reconstruction::current(target, document);
        };

        let visible = ledger.prefix(target_index);
        let segments = document
            .content
            .iter()
            .enumerate()
            .filter_map(|(source_index, segment)| {
                let resolution = resolve_segment(segment, target, &visible);
                if self.config.trace {
                    trace_resolution(target, source_index, segment, &resolution);
                }
                let segment = match resolution {
                    Resolution::Keep => Cow::Borrowed(segment),
                    Resolution::Project { segment, .. } => Cow::Owned(segment),
                    Resolution::Exclude { .. } => return None,
                };
                Some(ProjectedSegment {
                    source_index,
                    segment,
                })
            })
            .collect();

        Reconstruction {
            commit: target.to_string(),
            segments,
            is_historical: target_index + 1 < ledger.len(),
        }
    }

    /// The latest state of `document`, labelled with the latest commit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyLedger`] if the document has no commits.
    pub fn current_state<'a>(
        &self,
        document: &'a Document,
    ) -> Result<Reconstruction<'a>, EngineError> {
        let latest = document.ledger().latest().ok_or(EngineError::EmptyLedger)?;
        Ok(Reconstruction::current(&latest.id, document))
    }
}

/// Reconstruct `document` at commit `target` with the default configuration.
#[must_use]
pub fn reconstruct_at<'a>(document: &'a Document, target: &str) -> Reconstruction<'a> {
    Reconstructor::default().reconstruct_at(document, target)
}

/// The latest state of `document` with the default configuration.
///
/// # Errors
///
/// Returns [`EngineError::EmptyLedger`] if the document has no commits.
pub fn current_state(document: &Document) -> Result<Reconstruction<'_>, EngineError> {
    Reconstructor::default().current_state(document)
}

fn resolve_segment<'h>(
    segment: &'h Segment,
    target: &str,
    visible: &HashSet<&str>,
) -> Resolution<'h> {
    if segment.kind == SegmentKind::Unchanged {
        return Resolution::Keep;
    }

    if segment.has_history() {
        let history = segment.history_entries();
        return match effective_entry(history, target, visible) {
            None => Resolution::Exclude {
                entry: None,
                reason: Absence::NotYetPresent,
            },
            Some(entry) if entry.action == Action::Deleted => Resolution::Exclude {
                entry: Some(entry),
                reason: Absence::Deleted,
            },
            Some(entry) => {
                let projected = project(segment, entry);
                if is_stored_state(segment, history, entry, &projected, visible) {
                    Resolution::Keep
                } else {
                    Resolution::Project {
                        entry,
                        segment: projected,
                    }
                }
            }
        };
    }

    match &segment.change {
        Some(change) if visible.contains(change.commit.as_str()) => {
            if segment.kind == SegmentKind::Deleted {
                Resolution::Exclude {
                    entry: None,
                    reason: Absence::Deleted,
                }
            } else {
                Resolution::Keep
            }
        }
        Some(_) => Resolution::Exclude {
            entry: None,
            reason: Absence::NotYetPresent,
        },
        None => Resolution::Exclude {
            entry: None,
            reason: Absence::NoProvenance,
        },
    }
}

/// Whether `projected` is exactly what `segment` already stores at the target.
///
/// The stored segment carries its whole history, so it is only a faithful view
/// when every recorded edit is visible and its `change` names the effective entry.
fn is_stored_state(
    segment: &Segment,
    history: &[HistoryEntry],
    entry: &HistoryEntry,
    projected: &Segment,
    visible: &HashSet<&str>,
) -> bool {
    history.last().is_some_and(|last| std::ptr::eq(last, entry))
        && projected.kind == segment.kind
        && projected.text == segment.text
        && projected.change == segment.change
        && history.iter().all(|e| visible.contains(e.commit.as_str()))
}

/// Latest history entry in effect at `target`.
///
/// An entry made by the target commit itself wins over the ledger filter, so
/// out-of-band entries queued after it cannot shadow it.
fn effective_entry<'h>(
    history: &'h [HistoryEntry],
    target: &str,
    visible: &HashSet<&str>,
) -> Option<&'h HistoryEntry> {
    if let Some(index) = history.iter().rposition(|e| e.commit == target) {
        return history.get(index);
    }
    history
        .iter()
        .rev()
        .find(|e| visible.contains(e.commit.as_str()))
}

fn project(segment: &Segment, entry: &HistoryEntry) -> Segment {
    let kind = if entry.action == Action::Added {
        SegmentKind::Added
    } else {
        SegmentKind::Modified
    };

    Segment {
        kind,
        text: entry.resulting_text().unwrap_or(&segment.text).to_string(),
        change: Some(Change {
            commit: entry.commit.clone(),
            before: entry.before.clone(),
            modifications: entry.modifications.clone(),
        }),
        history: None,
    }
}

fn trace_resolution(
    target: &str,
    source_index: usize,
    segment: &Segment,
    resolution: &Resolution<'_>,
) {
    match resolution {
        Resolution::Keep => tracing::debug!(
            target_commit = target,
            source_index,
            kind = %segment.kind,
            "Segment kept"
        ),
        Resolution::Project { entry, segment: projected } => tracing::debug!(
            target_commit = target,
            source_index,
            entry_commit = %entry.commit,
            action = %entry.action,
            fallback_text = entry.resulting_text().is_none(),
            text_len = projected.text.len(),
            "Segment projected from history"
        ),
        Resolution::Exclude { entry, reason } => tracing::debug!(
            target_commit = target,
            source_index,
            entry_commit = entry.map(|e| e.commit.as_str()),
            reason = reason.as_str(),
            "Segment excluded"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Commit, Modification};

    fn commits(ids: &[&str]) -> Vec<Commit> {
        ids.iter()
            .map(|id| Commit {
                id: (*id).to_string(),
                author: "alice".to_string(),
                email: String::new(),
                date: "2025-01-01T00:00:00Z".to_string(),
                message: format!("commit {id}"),
            })
            .collect()
    }

    fn entry(commit: &str, action: Action) -> HistoryEntry {
        HistoryEntry {
            commit: commit.to_string(),
            author: "alice".to_string(),
            date: String::new(),
            message: String::new(),
            action,
            before: None,
            after: None,
            text: None,
            modifications: None,
        }
    }

    fn added(commit: &str, text: &str) -> HistoryEntry {
        HistoryEntry {
            text: Some(text.to_string()),
            ..entry(commit, Action::Added)
        }
    }

    fn modified(commit: &str, before: &str, after: &str) -> HistoryEntry {
        HistoryEntry {
            before: Some(before.to_string()),
            after: Some(after.to_string()),
            ..entry(commit, Action::Modified)
        }
    }

    fn texts<'r>(r: &'r Reconstruction<'_>) -> Vec<&'r str> {
        r.segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn scenario_latest_qualifying_entry() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![Segment::with_history(
                SegmentKind::Modified,
                "B",
                vec![added("C1", "A"), modified("C3", "A", "B")],
            )],
        );

        let at_c2 = reconstruct_at(&doc, "C2");
        assert_eq!(texts(&at_c2), vec!["A"]);
        assert!(at_c2.is_historical);
        assert_eq!(at_c2.segments[0].kind, SegmentKind::Added);

        let at_c3 = reconstruct_at(&doc, "C3");
        assert_eq!(texts(&at_c3), vec!["B"]);
        assert!(!at_c3.is_historical);
    }

    #[test]
    fn history_before_first_entry_is_absent() {
        let doc = Document::new(
            commits(&["C0", "C1"]),
            vec![Segment::with_history(SegmentKind::Added, "A", vec![added("C1", "A")])],
        );

        assert!(reconstruct_at(&doc, "C0").is_empty());
        assert_eq!(reconstruct_at(&doc, "C1").len(), 1);
    }

    #[test]
    fn history_deleted_entry_excludes() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![Segment::with_history(
                SegmentKind::Deleted,
                "A",
                vec![added("C1", "A"), entry("C2", Action::Deleted)],
            )],
        );

        assert_eq!(texts(&reconstruct_at(&doc, "C1")), vec!["A"]);
        assert!(reconstruct_at(&doc, "C2").is_empty());
        assert!(reconstruct_at(&doc, "C3").is_empty());
    }

    #[test]
    fn target_match_beats_ledger_filter() {
        // C1's entry was recorded after C2's, out of ledger order.
        let doc = Document::new(
            commits(&["C1", "C2"]),
            vec![Segment::with_history(
                SegmentKind::Modified,
                "late",
                vec![added("C2", "from c2"), modified("C1", "from c2", "late")],
            )],
        );

        let at_c2 = reconstruct_at(&doc, "C2");
        assert_eq!(texts(&at_c2), vec!["from c2"]);
    }

    #[test]
    fn duplicate_commit_entries_last_wins() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![Segment::with_history(
                SegmentKind::Modified,
                "third",
                vec![
                    added("C1", "first"),
                    modified("C1", "first", "second"),
                    modified("C3", "second", "third"),
                ],
            )],
        );

        assert_eq!(texts(&reconstruct_at(&doc, "C1")), vec!["second"]);
        assert_eq!(texts(&reconstruct_at(&doc, "C2")), vec!["second"]);
    }

    #[test]
    fn text_fallback_order() {
        let mut both = modified("C1", "x", "after");
        both.text = Some("text".to_string());
        let mut text_only = entry("C1", Action::Modified);
        text_only.text = Some("text".to_string());
        let neither = entry("C1", Action::Modified);

        let doc = Document::new(
            commits(&["C1", "C2"]),
            vec![
                Segment::with_history(
                    SegmentKind::Modified,
                    "cur1",
                    vec![both, modified("C2", "after", "cur1")],
                ),
                Segment::with_history(
                    SegmentKind::Modified,
                    "cur2",
                    vec![text_only, modified("C2", "text", "cur2")],
                ),
                Segment::with_history(
                    SegmentKind::Modified,
                    "cur3",
                    vec![neither, modified("C2", "", "cur3")],
                ),
            ],
        );

        assert_eq!(texts(&reconstruct_at(&doc, "C1")), vec!["after", "text", "cur3"]);
    }

    #[test]
    fn projected_change_comes_from_entry() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![Segment::with_history(
                SegmentKind::Modified,
                "v3",
                vec![added("C1", "v1"), modified("C2", "v1", "v2"), modified("C3", "v2", "v3")],
            )],
        );

        let at_c2 = reconstruct_at(&doc, "C2");
        let segment = &at_c2.segments[0];
        assert!(segment.is_projected());
        assert_eq!(segment.kind, SegmentKind::Modified);
        let change = segment.change.as_ref().unwrap();
        assert_eq!(change.commit, "C2");
        assert_eq!(change.before.as_deref(), Some("v1"));
        assert!(segment.history.is_none());
    }

    fn with_stored_change(mut segment: Segment, commit: &str, before: &str) -> Segment {
        segment.change = Some(Change {
            commit: commit.to_string(),
            before: Some(before.to_string()),
            modifications: None,
        });
        segment
    }

    #[test]
    fn latest_history_entry_passes_segment_through() {
        let segment = Segment::with_history(
            SegmentKind::Modified,
            "v2",
            vec![added("C1", "v1"), modified("C2", "v1", "v2")],
        );
        let doc = Document::new(
            commits(&["C1", "C2"]),
            vec![with_stored_change(segment, "C2", "v1")],
        );

        let at_c2 = reconstruct_at(&doc, "C2");
        assert!(!at_c2.segments[0].is_projected());
        assert_eq!(*at_c2.segments[0].segment, doc.content[0]);
    }

    #[test]
    fn stored_change_missing_modifications_is_projected() {
        let mut edit = modified("C2", "A", "B");
        edit.modifications = Some(vec![Modification {
            offset: 0,
            old: "A".to_string(),
            new: "B".to_string(),
        }]);
        let segment =
            Segment::with_history(SegmentKind::Modified, "B", vec![added("C1", "A"), edit]);
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![with_stored_change(segment, "C2", "A")],
        );

        let at_c2 = reconstruct_at(&doc, "C2");
        let segment = &at_c2.segments[0];
        assert!(segment.is_projected());
        assert!(segment.history.is_none());
        let change = segment.change.as_ref().unwrap();
        assert_eq!(change.commit, "C2");
        assert_eq!(change.modifications.as_ref().unwrap()[0].new, "B");
    }

    #[test]
    fn future_history_is_not_carried_into_past_view() {
        // The C3 entry was recorded before C1's, out of ledger order.
        let mut segment = Segment::with_history(
            SegmentKind::Added,
            "late",
            vec![added("C3", "early"), added("C1", "late")],
        );
        segment.change = Some(Change {
            commit: "C3".to_string(),
            before: None,
            modifications: None,
        });
        let doc = Document::new(commits(&["C1", "C2", "C3"]), vec![segment]);

        let at_c1 = reconstruct_at(&doc, "C1");
        let segment = &at_c1.segments[0];
        assert!(segment.is_projected());
        assert_eq!(segment.text, "late");
        assert_eq!(segment.change.as_ref().unwrap().commit, "C1");
        assert!(segment.history.is_none());
    }

    #[test]
    fn single_change_segments() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![
                Segment::unchanged("head"),
                Segment::with_change(SegmentKind::Added, "new", "C2"),
                Segment::with_change(SegmentKind::Deleted, "gone", "C2"),
            ],
        );

        assert_eq!(texts(&reconstruct_at(&doc, "C1")), vec!["head"]);
        assert_eq!(texts(&reconstruct_at(&doc, "C2")), vec!["head", "new"]);
        assert_eq!(texts(&reconstruct_at(&doc, "C3")), vec!["head", "new"]);
    }

    #[test]
    fn segment_without_provenance_is_excluded() {
        let mut orphan = Segment::unchanged("orphan");
        orphan.kind = SegmentKind::Modified;
        let doc = Document::new(commits(&["C1"]), vec![orphan, Segment::unchanged("kept")]);

        let result = reconstruct_at(&doc, "C1");
        assert_eq!(texts(&result), vec!["kept"]);
        assert_eq!(result.source_indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn empty_history_falls_back_to_change() {
        let mut segment = Segment::with_change(SegmentKind::Added, "x", "C2");
        segment.history = Some(Vec::new());
        let doc = Document::new(commits(&["C1", "C2"]), vec![segment]);

        assert!(reconstruct_at(&doc, "C1").is_empty());
        assert_eq!(reconstruct_at(&doc, "C2").len(), 1);
    }

    #[test]
    fn history_entry_with_unknown_commit_is_ignored() {
        let doc = Document::new(
            commits(&["C1", "C2"]),
            vec![Segment::with_history(
                SegmentKind::Modified,
                "ghost",
                vec![added("C1", "real"), modified("ZZ", "real", "ghost")],
            )],
        );

        assert_eq!(texts(&reconstruct_at(&doc, "C2")), vec!["real"]);
    }

    #[test]
    fn unknown_commit_returns_current() {
        let doc = Document::new(
            commits(&["C1"]),
            vec![Segment::with_change(SegmentKind::Deleted, "gone", "C1")],
        );

        let result = reconstruct_at(&doc, "nonexistent");
        assert_eq!(result.commit, "nonexistent");
        assert!(!result.is_historical);
        assert_eq!(texts(&result), vec!["gone"]);
    }

    #[test]
    fn current_state_uses_latest_commit() {
        let doc = Document::new(commits(&["C1", "C2"]), vec![Segment::unchanged("a")]);
        let current = current_state(&doc).unwrap();
        assert_eq!(current.commit, "C2");
        assert!(!current.is_historical);
        assert_eq!(current.text(), "a");
    }

    #[test]
    fn current_state_on_empty_ledger() {
        let doc = Document::new(Vec::new(), vec![Segment::unchanged("a")]);
        assert_eq!(current_state(&doc), Err(EngineError::EmptyLedger));

        let result = reconstruct_at(&doc, "C1");
        assert!(!result.is_historical);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn traced_engine_matches_untraced() {
        let doc = Document::new(
            commits(&["C1", "C2", "C3"]),
            vec![
                Segment::unchanged("u"),
                Segment::with_history(
                    SegmentKind::Modified,
                    "B",
                    vec![added("C1", "A"), modified("C3", "A", "B")],
                ),
                Segment::with_change(SegmentKind::Deleted, "d", "C2"),
            ],
        );

        let traced = Reconstructor::new(EngineConfig::traced());
        assert!(traced.config().trace);
        for id in ["C1", "C2", "C3", "missing"] {
            assert_eq!(traced.reconstruct_at(&doc, id), reconstruct_at(&doc, id));
        }
    }

    #[test]
    fn serializes_flattened_segments() {
        let doc = Document::new(commits(&["C1"]), vec![Segment::unchanged("u")]);
        let value = serde_json::to_value(reconstruct_at(&doc, "C1")).unwrap();

        assert_eq!(value["commit"], "C1");
        assert_eq!(value["is_historical"], false);
        assert_eq!(value["segments"][0]["source_index"], 0);
        assert_eq!(value["segments"][0]["type"], "unchanged");
        assert_eq!(value["segments"][0]["text"], "u");
    }
}
