//! # DHF Core
//!
//! Document History Format model and time-travel reconstruction engine.
//!
//! A DHF document is one markdown content stream split into segments, each
//! annotated with its change provenance, plus the ledger of commits that
//! produced it. This crate provides:
//! - Typed model of the on-disk JSON envelope
//! - Ledger helpers where array position is the only ordering authority
//! - Reconstruction of the document as it existed at any commit
//! - A memoizing reconstruction cache for repeated lookups
//! - Load-time validation, cross-version search, and summary computation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod engine;
pub mod ledger;
pub mod model;
pub mod search;
pub mod summary;
pub mod validation;

pub use cache::ReconstructionCache;
pub use engine::{
    current_state, reconstruct_at, EngineConfig, EngineError, ProjectedSegment, Reconstruction,
    Reconstructor,
};
pub use ledger::Ledger;
pub use model::{
    Action, AuthorCount, Change, Commit, Document, DocumentMeta, HistoryEntry, LoadError,
    Modification, Segment, SegmentKind, Summary, ViewWindow,
};
pub use search::{search, MatchSource, SearchHit};
pub use summary::summarize;
pub use validation::{validate, ValidationReport, Violation, ViolationKind};
