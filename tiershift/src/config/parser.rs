//! INI parsing logic for converting `Ini` → `Settings`.
//!
//! The single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use crate::mapping::PathMapping;

use super::file::SettingsError;
use super::settings::Settings;
use super::size::parse_size;

/// Section-name prefix for mapping rules (`[mapping:movies]`).
const MAPPING_SECTION_PREFIX: &str = "mapping:";

/// Parse an `Ini` object into `Settings`.
///
/// Starts from `Settings::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    if let Some(section) = ini.section(Some("general")) {
        if let Some(v) = section.get("tracker_directory") {
            let v = v.trim();
            if !v.is_empty() {
                settings = settings.with_tracker_directory(expand_tilde(v));
            }
        }
        if let Some(v) = section.get("exclusion_file") {
            let v = v.trim();
            if !v.is_empty() {
                settings.general.exclusion_file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("retention_hours") {
            settings.general.retention_hours =
                v.parse().map_err(|_| SettingsError::InvalidValue {
                    section: "general".to_string(),
                    key: "retention_hours".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer (hours)".to_string(),
                })?;
        }
        if let Some(v) = section.get("watchlist_stale_days") {
            settings.general.watchlist_stale_days =
                v.parse().map_err(|_| SettingsError::InvalidValue {
                    section: "general".to_string(),
                    key: "watchlist_stale_days".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (days)".to_string(),
                })?;
        }
        if let Some(v) = section.get("prefetch_count") {
            settings.general.prefetch_count =
                v.parse().map_err(|_| SettingsError::InvalidValue {
                    section: "general".to_string(),
                    key: "prefetch_count".to_string(),
                    value: v.to_string(),
                    reason: "must be a non-negative integer".to_string(),
                })?;
        }
    }

    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("max_size") {
            settings.cache.max_size = parse_size(v).map_err(|_| SettingsError::InvalidValue {
                section: "cache".to_string(),
                key: "max_size".to_string(),
                value: v.to_string(),
                reason: "expected format like '2TB', '500GB', or '750MB'".to_string(),
            })?;
        }
        if let Some(v) = section.get("min_priority") {
            let parsed: u8 = v.parse().map_err(|_| SettingsError::InvalidValue {
                section: "cache".to_string(),
                key: "min_priority".to_string(),
                value: v.to_string(),
                reason: "must be an integer between 0 and 100".to_string(),
            })?;
            if parsed > 100 {
                return Err(SettingsError::InvalidValue {
                    section: "cache".to_string(),
                    key: "min_priority".to_string(),
                    value: v.to_string(),
                    reason: "must be an integer between 0 and 100".to_string(),
                });
            }
            settings.cache.min_priority = parsed;
        }
    }

    if let Some(section) = ini.section(Some("workers")) {
        if let Some(v) = section.get("cache") {
            settings.workers.cache = parse_worker_count("cache", v)?;
        }
        if let Some(v) = section.get("array") {
            settings.workers.array = parse_worker_count("array", v)?;
        }
    }

    for (name, properties) in ini.iter() {
        let section_name = match name {
            Some(n) if n.starts_with(MAPPING_SECTION_PREFIX) => n,
            _ => continue,
        };
        let mapping_name = &section_name[MAPPING_SECTION_PREFIX.len()..];

        let media_path = require_path(section_name, "media_path", properties.get("media_path"))?;
        let array_path = require_path(section_name, "array_path", properties.get("array_path"))?;
        let cache_path = properties
            .get("cache_path")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(expand_tilde);

        settings.mappings.push(PathMapping {
            name: mapping_name.to_string(),
            media_prefix: media_path,
            array_prefix: array_path,
            cache_prefix: cache_path,
            cacheable: parse_bool(section_name, "cacheable", properties.get("cacheable"), true)?,
            enabled: parse_bool(section_name, "enabled", properties.get("enabled"), true)?,
        });
    }

    Ok(settings)
}

fn parse_worker_count(key: &str, value: &str) -> Result<usize, SettingsError> {
    let parsed: usize = value.parse().map_err(|_| SettingsError::InvalidValue {
        section: "workers".to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: "must be a positive integer".to_string(),
    })?;
    if parsed == 0 {
        return Err(SettingsError::InvalidValue {
            section: "workers".to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    Ok(parsed)
}

fn require_path(
    section: &str,
    key: &str,
    value: Option<&str>,
) -> Result<PathBuf, SettingsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(expand_tilde(v)),
        None => Err(SettingsError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: String::new(),
            reason: "required".to_string(),
        }),
    }
}

fn parse_bool(
    section: &str,
    key: &str,
    value: Option<&str>,
    default: bool,
) -> Result<bool, SettingsError> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v == "true" || v == "yes" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "no" || v == "0" => Ok(false),
        Some(v) => Err(SettingsError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: v,
            reason: "must be true or false".to_string(),
        }),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Settings, SettingsError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn empty_config_yields_defaults() {
        let settings = parse("").unwrap();
        assert_eq!(
            settings.general.retention_hours,
            super::super::settings::DEFAULT_RETENTION_HOURS
        );
        assert!(settings.mappings.is_empty());
    }

    #[test]
    fn parses_general_and_cache_sections() {
        let settings = parse(
            "[general]\n\
             tracker_directory = /var/lib/tiershift\n\
             retention_hours = 6\n\
             prefetch_count = 10\n\
             [cache]\n\
             max_size = 1TB\n\
             min_priority = 40\n\
             [workers]\n\
             cache = 8\n\
             array = 3\n",
        )
        .unwrap();

        assert_eq!(
            settings.general.tracker_directory,
            PathBuf::from("/var/lib/tiershift")
        );
        assert_eq!(settings.general.retention_hours, 6);
        assert_eq!(settings.general.prefetch_count, 10);
        assert_eq!(settings.cache.max_size, 1024u64.pow(4));
        assert_eq!(settings.cache.min_priority, 40);
        assert_eq!(settings.workers.cache, 8);
        assert_eq!(settings.workers.array, 3);
    }

    #[test]
    fn parses_mapping_sections() {
        let settings = parse(
            "[mapping:movies]\n\
             media_path = /data/movies\n\
             array_path = /mnt/user0/movies\n\
             cache_path = /mnt/cache/movies\n\
             [mapping:remote]\n\
             media_path = /data/remote\n\
             array_path = /mnt/remotes/gdrive\n\
             cacheable = false\n\
             enabled = false\n",
        )
        .unwrap();

        assert_eq!(settings.mappings.len(), 2);

        let movies = settings
            .mappings
            .iter()
            .find(|m| m.name == "movies")
            .unwrap();
        assert_eq!(movies.cache_prefix, Some(PathBuf::from("/mnt/cache/movies")));
        assert!(movies.cacheable);
        assert!(movies.enabled);

        let remote = settings
            .mappings
            .iter()
            .find(|m| m.name == "remote")
            .unwrap();
        assert_eq!(remote.cache_prefix, None);
        assert!(!remote.cacheable);
        assert!(!remote.enabled);
    }

    #[test]
    fn mapping_without_array_path_is_rejected() {
        let result = parse(
            "[mapping:broken]\n\
             media_path = /data/movies\n",
        );
        assert!(matches!(
            result,
            Err(SettingsError::InvalidValue { ref key, .. }) if key == "array_path"
        ));
    }

    #[test]
    fn invalid_size_is_rejected_with_context() {
        let result = parse("[cache]\nmax_size = lots\n");
        match result {
            Err(SettingsError::InvalidValue { section, key, .. }) => {
                assert_eq!(section, "cache");
                assert_eq!(key, "max_size");
            }
            other => panic!("expected InvalidValue, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn zero_workers_are_rejected() {
        assert!(parse("[workers]\ncache = 0\n").is_err());
    }

    #[test]
    fn min_priority_above_100_is_rejected() {
        assert!(parse("[cache]\nmin_priority = 150\n").is_err());
    }
}
