//! Demand modeling and the need filter.
//!
//! Builds per-run indexes of what viewers still want (needed TV positions,
//! needed movies) from the media server's on-deck and watchlist answers,
//! then decides per cached file whether it belongs on cache or array.

mod filter;
mod index;

pub use filter::{CacheRequest, DemandItem, NeedFilter, RefreshRequest, WorkPlan};
pub use index::DemandIndex;
