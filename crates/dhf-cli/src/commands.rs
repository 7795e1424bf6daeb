//! Subcommand implementations.
//!
//! Each command renders to a `String` so output can be tested without a
//! terminal; `main` does the printing.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use dhf_core::{
    search, summarize, validate, Document, Reconstruction, ReconstructionCache, Reconstructor,
};

use crate::cli::OutputFormat;
use crate::config::CliConfig;

/// Load a DHF document from disk.
///
/// # Errors
///
/// Returns error if the file is missing or not valid DHF JSON.
pub fn load(path: &Path) -> Result<Document> {
    Document::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Render the document at each requested commit, or its current state.
///
/// # Errors
///
/// Returns error if no commit is requested and the ledger is empty, or if
/// JSON serialization fails.
pub fn show(
    document: &Document,
    at: &[String],
    config: &CliConfig,
    format: OutputFormat,
) -> Result<String> {
    let engine = Reconstructor::new(config.engine);

    if at.is_empty() {
        let current = engine
            .current_state(document)
            .context("Cannot show current state")?;
        return render_reconstructions(&[&current], format);
    }

    // Repeated commits are served from the cache.
    let cache = ReconstructionCache::new(document, engine);
    let results: Vec<_> = at.iter().map(|commit| cache.get(commit)).collect();
    let refs: Vec<&Reconstruction<'_>> = results.iter().map(|result| &**result).collect();
    render_reconstructions(&refs, format)
}

fn render_reconstructions(results: &[&Reconstruction<'_>], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            if let [single] = results {
                Ok(serde_json::to_string_pretty(single)?)
            } else {
                Ok(serde_json::to_string_pretty(results)?)
            }
        }
        OutputFormat::Text => {
            if let [single] = results {
                return Ok(single.text());
            }
            let mut out = String::new();
            for result in results {
                let label = if result.is_historical { " (historical)" } else { "" };
                let _ = writeln!(out, "==> {}{label} <==", result.commit);
                out.push_str(&result.text());
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(out)
        }
    }
}

/// Render the commit ledger, marking the latest commit.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn log(document: &Document, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&document.commits)?);
    }

    let ledger = document.ledger();
    let mut out = String::new();
    for commit in ledger.iter() {
        let marker = if ledger.is_latest(&commit.id) { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} {}  {}  {}  {}",
            commit.id, commit.date, commit.author, commit.message
        );
    }
    Ok(out)
}

/// Render search hits for `query`.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn search_document(document: &Document, query: &str, format: OutputFormat) -> Result<String> {
    let hits = search(document, query);
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&hits)?);
    }

    let mut out = String::new();
    for hit in &hits {
        let source = match hit.source {
            dhf_core::MatchSource::Current => "current",
            dhf_core::MatchSource::History => "history",
            dhf_core::MatchSource::Before => "before",
        };
        let _ = write!(out, "[{}] {source}", hit.segment_index);
        if let Some(commit) = &hit.commit {
            let _ = write!(out, " {commit}");
        }
        if let Some(author) = &hit.author {
            let _ = write!(out, " by {author}");
        }
        let _ = writeln!(out, ": {}", hit.match_text.trim_end());
    }
    let _ = writeln!(out, "{} match(es)", hits.len());
    Ok(out)
}

/// Render the validation report. The flag is `true` when the document is valid.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn validate_document(document: &Document, format: OutputFormat) -> Result<(String, bool)> {
    let report = validate(document);
    let valid = report.is_valid();
    if format == OutputFormat::Json {
        return Ok((serde_json::to_string_pretty(&report)?, valid));
    }

    let mut out = String::new();
    for violation in &report.violations {
        let _ = writeln!(out, "{violation}");
    }
    let _ = writeln!(
        out,
        "{} commits, {} segments, {} problem(s)",
        report.commit_count,
        report.segment_count,
        report.violations.len()
    );
    Ok((out, valid))
}

/// Render computed summary statistics.
///
/// # Errors
///
/// Returns error if JSON serialization fails.
pub fn summary(document: &Document, format: OutputFormat) -> Result<String> {
    let summary = summarize(document);
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&summary)?);
    }

    let mut out = String::new();
    let _ = writeln!(out, "commits: {}", summary.total_commits);
    for author in &summary.authors {
        let _ = writeln!(out, "  {}: {}", author.name, author.commits);
    }
    let _ = writeln!(
        out,
        "lines: +{} -{} ~{}",
        summary.lines_added, summary.lines_deleted, summary.lines_modified
    );
    Ok(out)
}
