// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod posting;
pub mod scoring;
pub mod state;
pub mod tier;

// Fetch + notification collaborators around the core.
pub mod ingest;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::engine::{DecisionBatch, DecisionEngine, RoutingDecision};
pub use crate::posting::{NormalizedPosting, PostingIdentity};
pub use crate::scoring::{ScoreBreakdown, ScoreCalculator};
pub use crate::state::{AlertRecord, MergePatch, StateSnapshot};
pub use crate::tier::{Channel, Tier};
