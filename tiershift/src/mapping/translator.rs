//! The path translator.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::types::{CacheTarget, PathMapping};

/// Translates paths between the three coordinate systems.
///
/// Mappings are tried longest-prefix-first among enabled rules. Disabled
/// rules are still consulted so a path under one is classified as "known but
/// intentionally skipped" rather than unmapped. Paths matching no rule at
/// all are reported once per distinct top-level folder to avoid log storms.
pub struct PathTranslator {
    mappings: Vec<PathMapping>,
    warned_roots: Mutex<HashSet<String>>,
}

impl PathTranslator {
    /// Create a translator over the configured mapping rules.
    pub fn new(mappings: Vec<PathMapping>) -> Self {
        Self {
            mappings,
            warned_roots: Mutex::new(HashSet::new()),
        }
    }

    /// The configured mapping rules.
    pub fn mappings(&self) -> &[PathMapping] {
        &self.mappings
    }

    /// Translate a media-server path to its array path.
    ///
    /// A path that already starts with an array prefix is returned unchanged
    /// (idempotent translation). Returns `None` when the path matches a
    /// disabled mapping (silently) or no mapping at all (warned once per
    /// top-level folder).
    pub fn to_array(&self, media_path: &Path) -> Option<(PathBuf, &PathMapping)> {
        // Idempotent: already in array coordinates
        if let Some(mapping) = self.longest_match(media_path, |m| Some(m.array_prefix.as_path())) {
            if mapping.enabled {
                return Some((media_path.to_path_buf(), mapping));
            }
            return None;
        }

        match self.longest_match(media_path, |m| Some(m.media_prefix.as_path())) {
            Some(mapping) if mapping.enabled => {
                PathMapping::rebase(media_path, &mapping.media_prefix, &mapping.array_prefix)
                    .map(|p| (p, mapping))
            }
            Some(_) => None, // disabled mapping: known but intentionally skipped
            None => {
                self.warn_unmapped(media_path);
                None
            }
        }
    }

    /// Translate an array path to its cache path.
    ///
    /// Returns [`CacheTarget::NotCacheable`] when the matched mapping has no
    /// cache prefix or is marked non-cacheable, and for unmatched paths.
    pub fn to_cache(&self, array_path: &Path) -> CacheTarget<'_> {
        let mapping = match self.longest_enabled_match(array_path, |m| Some(m.array_prefix.as_path())) {
            Some(m) => m,
            None => return CacheTarget::NotCacheable,
        };

        if !mapping.cacheable {
            return CacheTarget::NotCacheable;
        }

        match mapping.cache_prefix.as_deref() {
            Some(cache_prefix) => {
                match PathMapping::rebase(array_path, &mapping.array_prefix, cache_prefix) {
                    Some(path) => CacheTarget::Cacheable(path, mapping),
                    None => CacheTarget::NotCacheable,
                }
            }
            None => CacheTarget::NotCacheable,
        }
    }

    /// Translate a cache path back to its array path.
    pub fn to_array_from_cache(&self, cache_path: &Path) -> Option<(PathBuf, &PathMapping)> {
        let mapping =
            self.longest_enabled_match(cache_path, |m| m.cache_prefix.as_deref())?;
        let cache_prefix = mapping.cache_prefix.as_deref()?;
        PathMapping::rebase(cache_path, cache_prefix, &mapping.array_prefix)
            .map(|p| (p, mapping))
    }

    /// Longest-prefix match across all mappings (enabled or not).
    fn longest_match<'a>(
        &'a self,
        path: &Path,
        prefix: impl Fn(&'a PathMapping) -> Option<&'a Path>,
    ) -> Option<&'a PathMapping> {
        self.mappings
            .iter()
            .filter_map(|m| {
                let p = prefix(m)?;
                path.starts_with(p).then(|| (p.components().count(), m))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, m)| m)
    }

    /// Longest-prefix match restricted to enabled mappings.
    fn longest_enabled_match<'a>(
        &'a self,
        path: &Path,
        prefix: impl Fn(&'a PathMapping) -> Option<&'a Path>,
    ) -> Option<&'a PathMapping> {
        self.mappings
            .iter()
            .filter(|m| m.enabled)
            .filter_map(|m| {
                let p = prefix(m)?;
                path.starts_with(p).then(|| (p.components().count(), m))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, m)| m)
    }

    /// Warn about an unmapped path, once per distinct top-level folder.
    fn warn_unmapped(&self, path: &Path) {
        let root = top_level_folder(path);
        let mut warned = match self.warned_roots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if warned.insert(root.clone()) {
            warn!(folder = %root, "Path matches no configured mapping, skipping its files");
        }
    }
}

/// Root plus first named component, used to group unmapped-path warnings.
fn top_level_folder(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
            Component::Normal(name) => {
                out.push(name);
                break;
            }
            _ => {}
        }
    }
    out.display().to_string()
}
