//! Case-insensitive text search across every version of a document.

use serde::Serialize;

use crate::ledger::Ledger;
use crate::model::{Document, HistoryEntry, Segment};

/// Which text of a segment matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// The latest text
    Current,
    /// The text recorded on a history entry
    History,
    /// The pre-edit text of the latest change
    Before,
}

/// One search match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Position of the segment in `Document::content`
    pub segment_index: usize,
    /// Which text matched
    pub source: MatchSource,
    /// The full text that contained the query
    pub match_text: String,
    /// Commit the matched text is attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Message of that commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
    /// Author of that commit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Search current text, history texts and pre-edit texts for `query`.
///
/// Hits are returned in segment order; within a segment the current text
/// comes first, then history entries in order, then the change's `before`.
/// A blank query matches nothing.
#[must_use]
pub fn search(document: &Document, query: &str) -> Vec<SearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let needle = query.to_lowercase();
    let ledger = document.ledger();
    let mut hits = Vec::new();

    for (segment_index, segment) in document.content.iter().enumerate() {
        let change_commit = segment.change.as_ref().map(|c| c.commit.as_str());

        if contains(&segment.text, &needle) {
            hits.push(attributed(
                &ledger,
                segment_index,
                MatchSource::Current,
                &segment.text,
                change_commit,
            ));
        }

        for entry in segment.history_entries() {
            let text = entry_text(entry);
            if contains(text, &needle) {
                hits.push(history_hit(&ledger, segment_index, entry, text));
            }
        }

        if let Some(before) = before_text(segment) {
            if contains(before, &needle) {
                hits.push(attributed(
                    &ledger,
                    segment_index,
                    MatchSource::Before,
                    before,
                    change_commit,
                ));
            }
        }
    }

    tracing::debug!(query, hits = hits.len(), "Searched document");
    hits
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn entry_text(entry: &HistoryEntry) -> &str {
    entry
        .resulting_text()
        .or(entry.before.as_deref())
        .unwrap_or_default()
}

fn before_text(segment: &Segment) -> Option<&str> {
    segment.change.as_ref()?.before.as_deref()
}

fn attributed(
    ledger: &Ledger<'_>,
    segment_index: usize,
    source: MatchSource,
    text: &str,
    commit: Option<&str>,
) -> SearchHit {
    let found = commit.and_then(|id| ledger.get(id));
    SearchHit {
        segment_index,
        source,
        match_text: text.to_string(),
        commit: commit.map(str::to_string),
        commit_message: found.map(|c| c.message.clone()),
        author: found.map(|c| c.author.clone()),
    }
}

fn history_hit(
    ledger: &Ledger<'_>,
    segment_index: usize,
    entry: &HistoryEntry,
    text: &str,
) -> SearchHit {
    let found = ledger.get(&entry.commit);
    SearchHit {
        segment_index,
        source: MatchSource::History,
        match_text: text.to_string(),
        commit: Some(entry.commit.clone()),
        commit_message: Some(found.map_or_else(|| entry.message.clone(), |c| c.message.clone())),
        author: Some(found.map_or_else(|| entry.author.clone(), |c| c.author.clone())),
    }
}
