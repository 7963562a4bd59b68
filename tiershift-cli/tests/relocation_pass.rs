//! End-to-end relocation passes over temporary array/cache tiers.
//!
//! Exercises the full library surface the way the `run` command does:
//! settings → service → pass → follow-up pass, against real files.

use std::path::PathBuf;

use tempfile::TempDir;

use tiershift::config::Settings;
use tiershift::mapping::PathMapping;
use tiershift::relocate::BACKUP_SUFFIX;
use tiershift::service::{MediaItem, TierShiftService};

struct Tiers {
    temp_dir: TempDir,
    array: PathBuf,
    cache: PathBuf,
}

impl Tiers {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let array = temp_dir.path().join("array");
        let cache = temp_dir.path().join("cache");
        std::fs::create_dir_all(array.join("tv/Show/Season 01")).unwrap();
        std::fs::create_dir_all(array.join("movies")).unwrap();
        std::fs::create_dir_all(&cache).unwrap();
        Self {
            temp_dir,
            array,
            cache,
        }
    }

    fn settings(&self) -> Settings {
        let mut settings = Settings::default()
            .with_tracker_directory(self.temp_dir.path().join("state"))
            .with_mapping(PathMapping {
                name: "media".to_string(),
                media_prefix: self.temp_dir.path().join("library"),
                array_prefix: self.array.clone(),
                cache_prefix: Some(self.cache.clone()),
                cacheable: true,
                enabled: true,
            });
        settings.general.retention_hours = 0;
        settings
    }

    fn media(&self, rel: &str) -> PathBuf {
        self.temp_dir.path().join("library").join(rel)
    }

    fn seed_array(&self, rel: &str, bytes: usize) -> PathBuf {
        let path = self.array.join(rel);
        std::fs::write(&path, vec![7u8; bytes]).unwrap();
        path
    }

    fn backup_marker(&self, rel: &str) -> PathBuf {
        let original = self.array.join(rel);
        let mut name = original.file_name().unwrap().to_os_string();
        name.push(BACKUP_SUFFIX);
        original.with_file_name(name)
    }
}

#[tokio::test]
async fn full_pass_moves_restores_and_survives_a_second_pass() {
    let tiers = Tiers::new();

    let episode = "tv/Show/Season 01/Show - S01E02 [1080p].mkv";
    let movie = "movies/Heat (1995).mkv";
    let leftover = "movies/Alien (1979).mkv";

    tiers.seed_array(episode, 4096);
    tiers.seed_array(movie, 2048);

    // An untracked leftover from before this tool ran sits on cache
    let leftover_cache = tiers.cache.join(leftover);
    std::fs::create_dir_all(leftover_cache.parent().unwrap()).unwrap();
    std::fs::write(&leftover_cache, vec![7u8; 1024]).unwrap();

    let service = TierShiftService::new(tiers.settings()).unwrap();

    let on_deck = vec![MediaItem::for_user(tiers.media(episode), "alice")];
    let watchlist = vec![MediaItem::for_user(tiers.media(movie), "bob")];

    let report = service
        .run_pass(on_deck.clone(), watchlist.clone())
        .await
        .unwrap();

    assert_eq!(report.batch.files_to_cache, 2);
    assert_eq!(report.error_count(), 0);

    // Wanted files landed on cache; originals became backup markers
    assert!(tiers.cache.join(episode).exists());
    assert!(tiers.cache.join(movie).exists());
    assert!(!tiers.array.join(episode).exists());
    assert!(tiers.backup_marker(episode).exists());
    assert!(tiers.backup_marker(movie).exists());

    // Untracked files are never reclaimed
    assert!(leftover_cache.exists());

    // Exclusion list protects the cached copies from the external mover
    let exclusions =
        std::fs::read_to_string(tiers.temp_dir.path().join("state/exclusions.txt")).unwrap();
    assert!(exclusions.contains("Heat (1995).mkv"));
    assert!(exclusions.contains("Show - S01E02"));

    // Second pass with identical demand: everything is a no-op refresh
    let second = service.run_pass(on_deck, watchlist).await.unwrap();
    assert_eq!(second.batch.files_to_cache, 0);
    assert_eq!(second.error_count(), 0);
    assert!(tiers.cache.join(movie).exists());

    // Third pass with empty demand: cached files return to the array
    let third = service.run_pass(vec![], vec![]).await.unwrap();
    assert_eq!(third.batch.files_to_array, 2);
    assert_eq!(third.error_count(), 0);

    assert!(tiers.array.join(episode).exists());
    assert!(tiers.array.join(movie).exists());
    assert!(!tiers.cache.join(episode).exists());
    assert!(!tiers.cache.join(movie).exists());
    assert!(!tiers.backup_marker(episode).exists());
    assert!(!tiers.backup_marker(movie).exists());
}

#[tokio::test]
async fn upgraded_cache_copy_supersedes_the_marker_generation() {
    let tiers = Tiers::new();
    let service = TierShiftService::new(tiers.settings()).unwrap();

    let episode = "tv/Show/Season 01/Show - S01E02.mkv";
    tiers.seed_array(episode, 1000);

    // First pass caches the original generation
    let on_deck = vec![MediaItem::for_user(tiers.media(episode), "alice")];
    service.run_pass(on_deck, vec![]).await.unwrap();
    assert!(tiers.backup_marker(episode).exists());

    // The cache copy is upgraded in place (new rip, larger file)
    let cached = tiers.cache.join(episode);
    std::fs::write(&cached, vec![9u8; 2000]).unwrap();

    // Releasing it must carry the new content back, not the marker's
    let report = service.run_pass(vec![], vec![]).await.unwrap();
    assert_eq!(report.batch.files_to_array, 1);
    assert_eq!(report.error_count(), 0);

    let restored = std::fs::read(tiers.array.join(episode)).unwrap();
    assert_eq!(restored.len(), 2000);
    assert!(!tiers.backup_marker(episode).exists());
    assert!(!cached.exists());
}

#[tokio::test]
async fn retention_window_holds_fresh_files() {
    let tiers = Tiers::new();
    let mut settings = tiers.settings();
    settings.general.retention_hours = 12;

    let service = TierShiftService::new(settings).unwrap();

    let movie = "movies/Heat (1995).mkv";
    tiers.seed_array(movie, 512);

    // Cache it, then immediately drop it from demand
    let watchlist = vec![MediaItem::for_user(tiers.media(movie), "alice")];
    service.run_pass(vec![], watchlist).await.unwrap();
    assert!(tiers.cache.join(movie).exists());

    let report = service.run_pass(vec![], vec![]).await.unwrap();

    // Cached an instant ago: held, not released
    assert_eq!(report.batch.files_to_array, 0);
    assert_eq!(report.held, 1);
    assert!(tiers.cache.join(movie).exists());
}

#[tokio::test]
async fn state_survives_service_restart() {
    let tiers = Tiers::new();

    let movie = "movies/Heat (1995).mkv";
    tiers.seed_array(movie, 256);

    {
        let service = TierShiftService::new(tiers.settings()).unwrap();
        let watchlist = vec![MediaItem::for_user(tiers.media(movie), "alice")];
        service.run_pass(vec![], watchlist).await.unwrap();
    }

    // A fresh service over the same state directory still knows the file
    let service = TierShiftService::new(tiers.settings()).unwrap();
    let status = service.status();
    assert_eq!(status.cached_files, 1);
    assert_eq!(status.exclusion_entries, 1);

    // And releases it once demand is gone
    let report = service.run_pass(vec![], vec![]).await.unwrap();
    assert_eq!(report.batch.files_to_array, 1);
    assert!(tiers.array.join(movie).exists());
}
