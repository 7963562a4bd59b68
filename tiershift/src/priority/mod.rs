//! Priority scoring and eviction candidate selection.
//!
//! Scoring is a pure function from tracker state to a 0–100 priority per
//! cached file; eviction selects the lowest-priority files until enough
//! bytes are reclaimed.

mod engine;
mod eviction;
mod score;

pub use engine::{PriorityConfig, PriorityEngine};
pub use eviction::{select_eviction_candidates, EvictionCandidate};
pub use score::{score, ScoreContext, EPISODES_PER_SEASON_ESTIMATE};
