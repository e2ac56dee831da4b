//! spindle-tag library interface
//!
//! Exposes the reconciliation engine, tag store, lookup chain, and session
//! reporting for the interactive binary and for tests.

pub mod engine;
pub mod lookup;
pub mod report;
pub mod selection;
pub mod store;
pub mod types;
pub mod workflow;

pub use engine::ReconcileEngine;
pub use store::{Id3TagStore, TagStore};
pub use types::{BulkEditRequest, CommitResult, CoverArt, Field, TrackMetadata};
