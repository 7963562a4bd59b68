//! Persistent trackers recording why a file is cached and when.
//!
//! Three independently locked key→record maps, each backed by a JSON file:
//! cache timestamps (keyed by cache path), watchlist membership and on-deck
//! membership (both keyed by media path). Each is loaded once at startup and
//! rewritten after every mutation.

mod cache;
mod migrate;
mod ondeck;
mod record;
mod store;
mod watchlist;

pub use cache::CacheTracker;
pub use migrate::{migrate_cache_tracker, MigrateResult};
pub use ondeck::OnDeckTracker;
pub use record::{CacheSource, CachedFileRecord, EpisodeInfo, OnDeckRecord, WatchlistRecord};
pub use store::TrackerError;
pub use watchlist::WatchlistTracker;
