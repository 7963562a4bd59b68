//! The priority score.
//!
//! Additive from a base of 50, clamped to [0, 100]. Higher scores keep a
//! file on cache longer; eviction takes the lowest scores first.

use chrono::{DateTime, Duration, Utc};

use crate::tracker::{CacheSource, CachedFileRecord, OnDeckRecord, WatchlistRecord};

/// Starting score before any adjustment.
const BASE_SCORE: i32 = 50;

/// Bonus for files cached because they are someone's next episode.
const ONDECK_SOURCE_BONUS: i32 = 20;

/// Per-user bonus and its cap.
const PER_USER_BONUS: i32 = 5;
const USER_BONUS_CAP: i32 = 15;

/// Bonus for the viewer's current episode.
const CURRENT_EPISODE_BONUS: i32 = 15;

/// Bonus for episodes shortly ahead of the current one.
const NEAR_EPISODE_BONUS: i32 = 10;

/// Rough episodes-per-season used to weigh cross-season episode distance.
///
/// A heuristic with no configuration hook; the exact value is not
/// load-bearing.
pub const EPISODES_PER_SEASON_ESTIMATE: u32 = 13;

/// Everything the score is computed from.
///
/// `current_episode` is the viewer's current (season, episode) for the
/// show this file belongs to, when known from on-deck state.
#[derive(Debug)]
pub struct ScoreContext<'a> {
    pub cached: &'a CachedFileRecord,
    pub watchlist: Option<&'a WatchlistRecord>,
    pub ondeck: Option<&'a OnDeckRecord>,
    pub current_episode: Option<(u32, u32)>,
    pub prefetch_count: u32,
    pub now: DateTime<Utc>,
}

/// Compute the priority score for one cached file.
pub fn score(ctx: &ScoreContext) -> u8 {
    let mut score = BASE_SCORE;

    if ctx.cached.source == CacheSource::OnDeck {
        score += ONDECK_SOURCE_BONUS;
    }

    score += user_bonus(ctx);
    score += cache_recency_bonus(ctx.now - ctx.cached.cached_at);

    if let Some(watchlist) = ctx.watchlist {
        score += age_adjustment(ctx.now - watchlist.watchlisted_at);
    }
    if let Some(ondeck) = ctx.ondeck {
        score += age_adjustment(ctx.now - ondeck.last_seen);
        score += episode_position_bonus(ctx, ondeck);
    }

    score.clamp(0, 100) as u8
}

/// +5 per distinct user across watchlist and on-deck records, capped at 15.
fn user_bonus(ctx: &ScoreContext) -> i32 {
    let mut users = std::collections::BTreeSet::new();
    if let Some(watchlist) = ctx.watchlist {
        users.extend(watchlist.users.iter());
    }
    if let Some(ondeck) = ctx.ondeck {
        users.extend(ondeck.users.iter());
    }
    (PER_USER_BONUS * users.len() as i32).min(USER_BONUS_CAP)
}

/// Recently cached files score higher, discouraging thrash from files
/// bouncing between tiers.
fn cache_recency_bonus(age: Duration) -> i32 {
    if age < Duration::hours(24) {
        15
    } else if age < Duration::hours(72) {
        10
    } else if age < Duration::days(7) {
        5
    } else {
        0
    }
}

/// Fresh interest scores up, long-dormant interest scores down.
///
/// Applied to both watchlist age and on-deck staleness.
fn age_adjustment(age: Duration) -> i32 {
    if age < Duration::days(7) {
        10
    } else if age > Duration::days(60) {
        -10
    } else {
        0
    }
}

/// Position bonus for TV episodes; never negative, since far-ahead
/// pre-fetched episodes are intentional, not stale.
fn episode_position_bonus(ctx: &ScoreContext, ondeck: &OnDeckRecord) -> i32 {
    let info = match &ondeck.episode_info {
        Some(info) => info,
        None => return 0,
    };

    if info.is_current_ondeck {
        return CURRENT_EPISODE_BONUS;
    }

    let (current_season, current_episode) = match ctx.current_episode {
        Some(position) => position,
        None => return 0,
    };

    let this = info.season * EPISODES_PER_SEASON_ESTIMATE + info.episode;
    let current = current_season * EPISODES_PER_SEASON_ESTIMATE + current_episode;
    if this <= current {
        return 0;
    }

    let near_window = ctx.prefetch_count.div_ceil(2);
    if this - current <= near_window {
        NEAR_EPISODE_BONUS
    } else {
        0
    }
}
