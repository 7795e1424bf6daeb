//! Summary statistics computed from a document.

use crate::model::{AuthorCount, Document, SegmentKind, Summary};

/// Compute commit and line statistics for `document`.
///
/// Authors are listed in order of first appearance in the ledger.
#[must_use]
pub fn summarize(document: &Document) -> Summary {
    let mut authors: Vec<AuthorCount> = Vec::new();
    for commit in &document.commits {
        match authors.iter_mut().find(|a| a.name == commit.author) {
            Some(author) => author.commits += 1,
            None => authors.push(AuthorCount {
                name: commit.author.clone(),
                commits: 1,
            }),
        }
    }

    let mut summary = Summary {
        total_commits: document.commits.len(),
        authors,
        ..Summary::default()
    };

    for segment in &document.content {
        let lines = line_count(&segment.text);
        match segment.kind {
            SegmentKind::Added => summary.lines_added += lines,
            SegmentKind::Deleted => summary.lines_deleted += lines,
            SegmentKind::Modified => summary.lines_modified += lines,
            SegmentKind::Unchanged => {}
        }
    }

    summary
}

/// Number of lines in `text`, not counting a final trailing newline.
fn line_count(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.strip_suffix('\n').unwrap_or(text).split('\n').count()
}
