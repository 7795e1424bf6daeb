//! Document History Format (DHF) data model.
//!
//! Mirrors the JSON envelope produced by the history exporter:
//!
//! ```json
//! { "document": {..}, "view": {..}, "commits": [..], "content": [..], "summary": {..} }
//! ```
//!
//! Only `commits` and `content` drive reconstruction. The other sections are
//! descriptive and may be absent.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;

/// Lifecycle classification of a segment in the latest state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Present at every point in time, never edited
    Unchanged,
    /// Introduced by a commit
    Added,
    /// Removed by a commit
    Deleted,
    /// Edited by one or more commits
    Modified,
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentKind::Unchanged => write!(f, "unchanged"),
            SegmentKind::Added => write!(f, "added"),
            SegmentKind::Deleted => write!(f, "deleted"),
            SegmentKind::Modified => write!(f, "modified"),
        }
    }
}

/// The kind of edit a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Segment first appeared
    Added,
    /// Segment text changed
    Modified,
    /// Segment was removed
    Deleted,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Added => write!(f, "added"),
            Action::Modified => write!(f, "modified"),
            Action::Deleted => write!(f, "deleted"),
        }
    }
}

/// A commit in the document ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Unique commit identifier
    pub id: String,
    /// Author name
    pub author: String,
    /// Author email
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// ISO-8601 commit timestamp
    pub date: String,
    /// Commit message
    pub message: String,
}

impl Commit {
    /// Parse the commit date as an RFC 3339 timestamp.
    ///
    /// Dates are informational only; ledger order never depends on them.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }
}

/// A sub-string edit within a segment's text. Descriptive only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    /// Character offset of the edit within the segment text
    pub offset: i64,
    /// Replaced text
    pub old: String,
    /// Replacement text
    pub new: String,
}

/// Summary of the latest edit applied to a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Commit that made the edit
    pub commit: String,
    /// Segment text before the edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Fine-grained edits within the segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Vec<Modification>>,
}

/// One recorded edit against a segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Commit that made the edit
    pub commit: String,
    /// Author of the commit
    #[serde(default)]
    pub author: String,
    /// Commit date as recorded on the entry
    #[serde(default)]
    pub date: String,
    /// Commit message as recorded on the entry
    #[serde(default)]
    pub message: String,
    /// What the edit did
    pub action: Action,
    /// Text before the edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Text after the edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Text at the time of the edit (used by `added` entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Fine-grained edits within the segment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Vec<Modification>>,
}

impl HistoryEntry {
    /// Text the segment had right after this edit, if recorded.
    ///
    /// `after` wins over `text`. Empty strings count as not recorded.
    #[must_use]
    pub fn resulting_text(&self) -> Option<&str> {
        non_empty(self.after.as_deref()).or_else(|| non_empty(self.text.as_deref()))
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// A contiguous unit of document text with one lifecycle classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Lifecycle classification in the latest state
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Latest text
    pub text: String,
    /// Latest edit, for segments with a single recorded change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<Change>,
    /// Full chronological edit history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
}

impl Segment {
    /// Create an unchanged segment.
    #[must_use]
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Unchanged,
            text: text.into(),
            change: None,
            history: None,
        }
    }

    /// Create a segment carrying a single change reference.
    #[must_use]
    pub fn with_change(
        kind: SegmentKind,
        text: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            change: Some(Change {
                commit: commit.into(),
                before: None,
                modifications: None,
            }),
            history: None,
        }
    }

    /// Create a segment carrying a full edit history.
    #[must_use]
    pub fn with_history(
        kind: SegmentKind,
        text: impl Into<String>,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            change: None,
            history: Some(history),
        }
    }

    /// History entries, or an empty slice when none are recorded.
    #[must_use]
    pub fn history_entries(&self) -> &[HistoryEntry] {
        self.history.as_deref().unwrap_or_default()
    }

    /// Whether the segment carries a non-empty history.
    #[must_use]
    pub fn has_history(&self) -> bool {
        !self.history_entries().is_empty()
    }
}

/// Source file and repository the history was extracted from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Path of the markdown file within the repository
    #[serde(default)]
    pub path: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// Branch name
    #[serde(default)]
    pub branch: String,
    /// Commit the export was generated at
    #[serde(default)]
    pub current_commit: String,
    /// Export timestamp
    #[serde(default)]
    pub generated_at: String,
}

/// Time window the export covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewWindow {
    /// Start of the window
    #[serde(default)]
    pub since: String,
    /// End of the window (`now` for open-ended)
    #[serde(default)]
    pub until: String,
}

/// Number of commits made by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    /// Author name
    pub name: String,
    /// Commits in the ledger by this author
    pub commits: usize,
}

/// Aggregate statistics for a document's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of commits in the ledger
    #[serde(default)]
    pub total_commits: usize,
    /// Commit counts per author
    #[serde(default)]
    pub authors: Vec<AuthorCount>,
    /// Lines in `added` segments
    #[serde(default)]
    pub lines_added: usize,
    /// Lines in `deleted` segments
    #[serde(default)]
    pub lines_deleted: usize,
    /// Lines in `modified` segments
    #[serde(default)]
    pub lines_modified: usize,
}

/// A complete DHF document: commit ledger plus annotated content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Source file description
    #[serde(rename = "document", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<DocumentMeta>,
    /// Exported time window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewWindow>,
    /// Commit ledger, oldest first
    #[serde(default)]
    pub commits: Vec<Commit>,
    /// Annotated segments of the latest state
    #[serde(default)]
    pub content: Vec<Segment>,
    /// Precomputed statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl Document {
    /// Create a document from a ledger and content.
    #[must_use]
    pub fn new(commits: Vec<Commit>, content: Vec<Segment>) -> Self {
        Self {
            commits,
            content,
            ..Self::default()
        }
    }

    /// Parse a document from DHF JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON does not match the DHF structure.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a DHF JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            commits = document.commits.len(),
            segments = document.content.len(),
            "Loaded document"
        );
        Ok(document)
    }

    /// Ledger view over this document's commits.
    #[must_use]
    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.commits)
    }
}

/// Errors from loading a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Content is not valid DHF JSON
    #[error("invalid DHF JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
