//! Tracker record types and their on-disk shapes.

use std::collections::BTreeSet;

use chrono::serde::ts_seconds;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Why a file was first placed on cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    /// Queued because it is someone's next episode.
    #[serde(rename = "ondeck")]
    OnDeck,
    /// Queued from a watchlist.
    Watchlist,
    /// Found on cache before this tool started tracking it.
    PreExisting,
    /// Recorded by a version that did not store a source.
    Unknown,
}

/// Record for a file currently on cache, keyed by cache path.
///
/// Created the instant a file lands on cache and never overwritten while it
/// stays there; deleted when the file is relocated back to the array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFileRecord {
    /// When the file landed on cache.
    #[serde(with = "ts_seconds")]
    pub cached_at: DateTime<Utc>,
    /// Why it was cached.
    pub source: CacheSource,
}

/// On-disk shape of a cache record.
///
/// Early versions stored a bare epoch timestamp; the structured record came
/// later. The sum type exists only at the deserialization boundary and is
/// normalized immediately on load.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CachedFileShape {
    Record(CachedFileRecord),
    LegacyTimestamp(i64),
}

impl CachedFileShape {
    /// Normalize to the current record shape.
    pub fn normalize(self) -> CachedFileRecord {
        match self {
            CachedFileShape::Record(record) => record,
            CachedFileShape::LegacyTimestamp(secs) => CachedFileRecord {
                cached_at: Utc
                    .timestamp_opt(secs, 0)
                    .single()
                    .unwrap_or_else(Utc::now),
                source: CacheSource::Unknown,
            },
        }
    }

    /// Whether this shape needs the on-disk migration.
    pub fn is_legacy(&self) -> bool {
        matches!(self, CachedFileShape::LegacyTimestamp(_))
    }
}

/// Watchlist membership record, keyed by media path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistRecord {
    /// When the item was (most recently) added to a watchlist.
    ///
    /// Only moves forward: a second user adding the same item with a later
    /// timestamp wins.
    #[serde(with = "ts_seconds")]
    pub watchlisted_at: DateTime<Utc>,
    /// Users who have this item on their watchlist.
    pub users: BTreeSet<String>,
    /// Last run in which the media server reported this item.
    #[serde(with = "ts_seconds")]
    pub last_seen: DateTime<Utc>,
}

/// Episode detail attached to an on-deck record for TV content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Show grouping key.
    pub show: String,
    /// Season number.
    pub season: u32,
    /// Episode number within the season.
    pub episode: u32,
    /// Whether this is a viewer's current episode, not a pre-fetched one.
    pub is_current_ondeck: bool,
}

/// On-deck membership record, keyed by media path.
///
/// On-deck state is ephemeral: the whole map is cleared at the start of each
/// run before being repopulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDeckRecord {
    /// All users this item is queued for, including pre-fetch.
    pub users: BTreeSet<String>,
    /// Users for whom this is the current episode.
    pub ondeck_users: BTreeSet<String>,
    /// Last run in which the media server reported this item.
    #[serde(with = "ts_seconds")]
    pub last_seen: DateTime<Utc>,
    /// Episode coordinates for TV content; `None` for movies.
    pub episode_info: Option<EpisodeInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_source_serializes_to_spec_tags() {
        assert_eq!(
            serde_json::to_string(&CacheSource::OnDeck).unwrap(),
            "\"ondeck\""
        );
        assert_eq!(
            serde_json::to_string(&CacheSource::PreExisting).unwrap(),
            "\"pre_existing\""
        );
    }

    #[test]
    fn cached_record_round_trips() {
        let record = CachedFileRecord {
            cached_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            source: CacheSource::Watchlist,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CachedFileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn legacy_timestamp_normalizes_to_unknown_source() {
        let shape: CachedFileShape = serde_json::from_str("1700000000").unwrap();
        assert!(shape.is_legacy());

        let record = shape.normalize();
        assert_eq!(record.cached_at.timestamp(), 1_700_000_000);
        assert_eq!(record.source, CacheSource::Unknown);
    }

    #[test]
    fn structured_shape_is_not_legacy() {
        let shape: CachedFileShape =
            serde_json::from_str(r#"{"cached_at": 1700000000, "source": "ondeck"}"#).unwrap();
        assert!(!shape.is_legacy());
        assert_eq!(shape.normalize().source, CacheSource::OnDeck);
    }

    #[test]
    fn watchlist_record_round_trips() {
        let record = WatchlistRecord {
            watchlisted_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            users: BTreeSet::from(["alice".to_string(), "bob".to_string()]),
            last_seen: Utc.timestamp_opt(1_700_100_000, 0).unwrap(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: WatchlistRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
