//! Needed-position index built from on-deck and watchlist answers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::identity::{episode_marker, media_identity, show_key};

/// Still-wanted positions for one show.
#[derive(Debug, Default)]
struct ShowDemand {
    /// Minimum still-wanted episode per season.
    min_wanted: BTreeMap<u32, u32>,
    /// Lowest season anyone is currently watching, from on-deck items.
    min_ondeck_season: Option<u32>,
}

/// Per-run index of needed TV positions and needed movies.
///
/// Derived from on-deck ∪ watchlist; rebuilt every run.
#[derive(Debug, Default)]
pub struct DemandIndex {
    tv: HashMap<String, ShowDemand>,
    movies: HashSet<String>,
}

impl DemandIndex {
    /// Build the index from the two path lists supplied by the media
    /// server query layer.
    pub fn build<'a>(
        on_deck: impl IntoIterator<Item = &'a Path>,
        watchlist: impl IntoIterator<Item = &'a Path>,
    ) -> Self {
        let mut index = Self::default();
        for path in on_deck {
            index.add(path, true);
        }
        for path in watchlist {
            index.add(path, false);
        }
        index
    }

    fn add(&mut self, path: &Path, from_ondeck: bool) {
        let identity = media_identity(path);

        match episode_marker(&identity) {
            Some(marker) => {
                let demand = self.tv.entry(show_key(path)).or_default();
                demand
                    .min_wanted
                    .entry(marker.season)
                    .and_modify(|min| *min = (*min).min(marker.episode))
                    .or_insert(marker.episode);
                if from_ondeck {
                    demand.min_ondeck_season = Some(
                        demand
                            .min_ondeck_season
                            .map_or(marker.season, |s| s.min(marker.season)),
                    );
                }
            }
            None => {
                self.movies.insert(identity);
            }
        }
    }

    /// Whether a cached file is still needed on cache.
    ///
    /// TV episodes are releasable once their episode number is strictly
    /// below the minimum wanted episode for that season, or their whole
    /// season is below the minimum on-deck season; future seasons are
    /// always retained. Movies are releasable once their identity is
    /// absent from the needed sets.
    pub fn is_needed(&self, path: &Path) -> bool {
        let identity = media_identity(path);

        let marker = match episode_marker(&identity) {
            Some(marker) => marker,
            None => return self.movies.contains(&identity),
        };

        let demand = match self.tv.get(&show_key(path)) {
            Some(demand) => demand,
            None => return false,
        };

        if let Some(min_season) = demand.min_ondeck_season {
            if marker.season < min_season {
                return false;
            }
        }

        match demand.min_wanted.get(&marker.season) {
            Some(&min_episode) => marker.episode >= min_episode,
            // Season with no wanted position: pre-fetched ahead, retained
            None => true,
        }
    }

    /// Whether the index is empty (no demand at all).
    pub fn is_empty(&self) -> bool {
        self.tv.is_empty() && self.movies.is_empty()
    }
}
