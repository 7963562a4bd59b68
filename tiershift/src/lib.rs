//! TierShift - Demand-driven media relocation between storage tiers.
//!
//! This library relocates media files between a slow bulk "array" tier and
//! a fast "cache" tier based on predicted near-term demand (on-deck
//! viewing, watchlists), and reclaims cache space via priority-based
//! eviction when capacity is constrained.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use tiershift::config::Settings;
//! use tiershift::service::{MediaItem, TierShiftService};
//!
//! let settings = Settings::load()?;
//! let service = TierShiftService::new(settings)?;
//!
//! // One relocation pass with the media server's current answers
//! let report = service.run_pass(on_deck, watchlist).await?;
//! ```

pub mod config;
pub mod demand;
pub mod exclusion;
pub mod identity;
pub mod mapping;
pub mod priority;
pub mod relocate;
pub mod service;
pub mod tracker;

/// Version of the TierShift library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
