//! Mapping rule types.

use std::path::{Path, PathBuf};

/// One path mapping rule, loaded from configuration.
///
/// Immutable for the duration of a run. A mapping with no cache prefix, or
/// with `cacheable` unset, marks its subtree as never eligible for caching
/// (remote or read-only storage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    /// Rule name, for logs and configuration sections.
    pub name: String,
    /// Path prefix as the media server sees it.
    pub media_prefix: PathBuf,
    /// Path prefix on the array tier.
    pub array_prefix: PathBuf,
    /// Path prefix on the cache tier, if this subtree may be cached.
    pub cache_prefix: Option<PathBuf>,
    /// Whether files under this mapping may be moved to cache.
    pub cacheable: bool,
    /// Disabled mappings are consulted for classification but never match.
    pub enabled: bool,
}

impl PathMapping {
    /// Rebase `path` from `from` onto `to`, if `path` lives under `from`.
    pub(super) fn rebase(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
        path.strip_prefix(from).ok().map(|rest| to.join(rest))
    }
}

/// Result of asking where a file belongs on the cache tier.
///
/// `NotCacheable` is a routing signal, never an error: the caller leaves
/// the file on the array and skips it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheTarget<'a> {
    /// The file may be cached at this path under this mapping.
    Cacheable(PathBuf, &'a PathMapping),
    /// The matched mapping declares no cache tier for this subtree.
    NotCacheable,
}

impl<'a> CacheTarget<'a> {
    /// The cache path, if the target is cacheable.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CacheTarget::Cacheable(path, _) => Some(path),
            CacheTarget::NotCacheable => None,
        }
    }
}
