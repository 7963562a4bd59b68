//! Path translation between media-server, array and cache coordinates.
//!
//! The same file is known under three roots: the path the media server
//! reports (`/data/media/...`), the array path (`/mnt/user0/media/...`) and
//! the cache path (`/mnt/cache/media/...`). Translation is driven by an
//! ordered set of mapping rules evaluated longest-prefix-first so that
//! overlapping prefixes resolve deterministically.

mod translator;
mod types;

pub use translator::PathTranslator;
pub use types::{CacheTarget, PathMapping};
