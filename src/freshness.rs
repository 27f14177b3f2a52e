//! "Data as of" timestamps for the chart footnote.
//!
//! The newest modification time of the files in a folder is cached per
//! folder with a time-to-live and a bounded, least-recently-used capacity,
//! so rendering many charts in one run does not hit the filesystem for each.

use crate::error::{PlotError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;
use walkdir::WalkDir;

/// Default time-to-live of a cached timestamp.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Default number of folders kept in the cache.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Returned for a folder without any regular files.
pub const UNKNOWN_TIMESTAMP: &str = "unknown";

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y - %H:%M:%S";

#[derive(Debug, Clone)]
struct CachedTimestamp {
    value: String,
    computed_at: Instant,
}

/// Per-folder cache of freshness timestamps.
#[derive(Debug)]
pub struct FreshnessCache {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<PathBuf, CachedTimestamp>,
    /// Keys ordered from least to most recently used.
    order: Vec<PathBuf>,
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl FreshnessCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Timestamp of the newest file in `folder`, served from cache when fresh.
    pub fn get_timestamp(&mut self, folder: &Path) -> Result<String> {
        self.get_or_compute_at(folder, Instant::now())
    }

    /// Cache lookup against an explicit clock reading.
    pub fn get_or_compute_at(&mut self, folder: &Path, now: Instant) -> Result<String> {
        let key = folder.to_path_buf();

        if let Some(cached) = self.entries.get(&key) {
            if now.saturating_duration_since(cached.computed_at) < self.ttl {
                let value = cached.value.clone();
                self.touch(&key);
                return Ok(value);
            }
            debug!("Freshness cache expired for {}", folder.display());
        }

        let value = newest_timestamp(folder)?;
        self.insert(
            key,
            CachedTimestamp {
                value: value.clone(),
                computed_at: now,
            },
        );
        Ok(value)
    }

    /// Drops the cached value for one folder.
    pub fn invalidate(&mut self, folder: &Path) {
        if self.entries.remove(folder).is_some() {
            self.order.retain(|k| k != folder);
        }
    }

    /// Drops every cached value.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: PathBuf, value: CachedTimestamp) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.insert(key.clone(), value).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push(key);

        while self.entries.len() > self.capacity {
            if self.order.is_empty() {
                break;
            }
            let evicted = self.order.remove(0);
            debug!("Evicting freshness entry for {}", evicted.display());
            self.entries.remove(&evicted);
        }
    }

    fn touch(&mut self, key: &Path) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos);
            self.order.push(k);
        }
    }
}

/// Formats the newest modification time among the direct-child files of
/// `folder`, or [`UNKNOWN_TIMESTAMP`] when there are none.
pub fn newest_timestamp(folder: &Path) -> Result<String> {
    if !folder.is_dir() {
        return Err(PlotError::MissingFolder {
            path: folder.to_path_buf(),
        });
    }

    let mut newest: Option<SystemTime> = None;
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(folder).to_path_buf();
            PlotError::io(path, e.into())
        })?;
        // follows symlinks, so linked exports count too
        if !entry.path().is_file() {
            continue;
        }
        let modified = std::fs::metadata(entry.path())
            .map_err(|e| PlotError::io(entry.path(), e))?
            .modified()
            .map_err(|e| PlotError::io(entry.path(), e))?;
        newest = Some(newest.map_or(modified, |current| current.max(modified)));
    }

    Ok(match newest {
        Some(time) => format_timestamp(time),
        None => UNKNOWN_TIMESTAMP.to_string(),
    })
}

/// Formats a point in time as `DD.MM.YYYY - HH:MM:SS` in UTC.
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs::File;
    use tempfile::TempDir;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SystemTime {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().into()
    }

    fn write_with_mtime(dir: &Path, name: &str, mtime: SystemTime) {
        let path = dir.join(name);
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn test_single_file_timestamp_format() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(dir.path(), "export.csv", utc(2024, 1, 2, 3, 4, 5));

        let ts = newest_timestamp(dir.path()).unwrap();
        assert_eq!(ts, "02.01.2024 - 03:04:05");
    }

    #[test]
    fn test_newest_file_wins_and_subfolders_ignored() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(dir.path(), "old.csv", utc(2023, 5, 1, 10, 0, 0));
        write_with_mtime(dir.path(), "new.txt", utc(2024, 6, 30, 23, 59, 58));
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        write_with_mtime(&nested, "newest.csv", utc(2025, 1, 1, 0, 0, 0));

        let ts = newest_timestamp(dir.path()).unwrap();
        assert_eq!(ts, "30.06.2024 - 23:59:58");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_export_counts() {
        let outside = TempDir::new().unwrap();
        write_with_mtime(outside.path(), "real.csv", utc(2024, 3, 4, 5, 6, 7));
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("real.csv"), dir.path().join("link.csv"))
            .unwrap();

        let ts = newest_timestamp(dir.path()).unwrap();
        assert_eq!(ts, "04.03.2024 - 05:06:07");
    }

    #[test]
    fn test_empty_folder_returns_sentinel() {
        let dir = TempDir::new().unwrap();
        assert_eq!(newest_timestamp(dir.path()).unwrap(), UNKNOWN_TIMESTAMP);
    }

    #[test]
    fn test_missing_folder_is_error() {
        let dir = TempDir::new().unwrap();
        let err = newest_timestamp(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PlotError::MissingFolder { .. }));
    }

    #[test]
    fn test_cached_value_survives_file_change_within_ttl() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(dir.path(), "a.csv", utc(2024, 1, 2, 3, 4, 5));

        let mut cache = FreshnessCache::default();
        let start = Instant::now();
        let first = cache.get_or_compute_at(dir.path(), start).unwrap();

        write_with_mtime(dir.path(), "b.csv", utc(2024, 2, 3, 4, 5, 6));
        let second = cache
            .get_or_compute_at(dir.path(), start + Duration::from_secs(599))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second, "02.01.2024 - 03:04:05");
    }

    #[test]
    fn test_expired_value_is_recomputed() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(dir.path(), "a.csv", utc(2024, 1, 2, 3, 4, 5));

        let mut cache = FreshnessCache::default();
        let start = Instant::now();
        cache.get_or_compute_at(dir.path(), start).unwrap();

        write_with_mtime(dir.path(), "b.csv", utc(2024, 2, 3, 4, 5, 6));
        let after = cache
            .get_or_compute_at(dir.path(), start + Duration::from_secs(600))
            .unwrap();

        assert_eq!(after, "03.02.2024 - 04:05:06");
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let dir = TempDir::new().unwrap();
        write_with_mtime(dir.path(), "a.csv", utc(2024, 1, 2, 3, 4, 5));

        let mut cache = FreshnessCache::default();
        cache.get_timestamp(dir.path()).unwrap();
        write_with_mtime(dir.path(), "b.csv", utc(2024, 2, 3, 4, 5, 6));

        cache.invalidate(dir.path());
        assert!(cache.is_empty());
        assert_eq!(
            cache.get_timestamp(dir.path()).unwrap(),
            "03.02.2024 - 04:05:06"
        );
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let dirs: Vec<TempDir> = (0..3).map(|_| TempDir::new().unwrap()).collect();
        let mut cache = FreshnessCache::new(DEFAULT_TTL, 2);
        let now = Instant::now();

        cache.get_or_compute_at(dirs[0].path(), now).unwrap();
        cache.get_or_compute_at(dirs[1].path(), now).unwrap();
        // Touch the first folder so the second becomes least recently used.
        cache.get_or_compute_at(dirs[0].path(), now).unwrap();
        cache.get_or_compute_at(dirs[2].path(), now).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.entries.contains_key(dirs[0].path()));
        assert!(!cache.entries.contains_key(dirs[1].path()));
        assert!(cache.entries.contains_key(dirs[2].path()));
    }
}
