//! Daily snapshot cache.
//!
//! At most one download of the source dataset per calendar day:
//!
//! - snapshots are dated, immutable files (`owid-covid-data_<date>.csv`);
//!   a new day's snapshot supersedes yesterday's, nothing is deleted
//! - the download log is a plain-text append-only file, loaded at open into
//!   an ordered set of already-fetched date keys
//!
//! The guarantee is sequential and single-process; there is no cross-process
//! lock.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::data::source::DataSource;
use crate::error::AppError;

/// Log file name inside the data directory.
pub const LOG_FILE_NAME: &str = "download_log.txt";

/// One calendar day's immutable, file-backed copy of the full dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub path: PathBuf,
}

impl Snapshot {
    /// Raw snapshot bytes, exactly as fetched.
    pub fn read_bytes(&self) -> Result<Vec<u8>, AppError> {
        fs::read(&self.path).map_err(|e| {
            AppError::usage(format!(
                "Failed to read snapshot '{}': {e}",
                self.path.display()
            ))
        })
    }
}

/// Append-only record of which calendar days already have a snapshot.
///
/// Each line is `<YYYY-MM-DD> - downloaded`. Lines that do not start with a
/// parseable date are ignored on load, so a hand-edited log never wedges the
/// cache.
#[derive(Debug)]
pub struct DownloadLog {
    path: PathBuf,
    fetched: BTreeSet<NaiveDate>,
}

impl DownloadLog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let mut fetched = BTreeSet::new();

        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                AppError::usage(format!(
                    "Failed to read download log '{}': {e}",
                    path.display()
                ))
            })?;
            for line in contents.lines() {
                let key = line.split_whitespace().next().unwrap_or("");
                if let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") {
                    fetched.insert(date);
                }
            }
        }

        Ok(Self { path, fetched })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.fetched.contains(&day)
    }

    /// Most recent fetched day, for status displays.
    pub fn latest(&self) -> Option<NaiveDate> {
        self.fetched.iter().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.fetched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetched.is_empty()
    }

    fn record(&mut self, day: NaiveDate) -> Result<(), AppError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::usage(format!(
                    "Failed to open download log '{}': {e}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{day} - downloaded").map_err(|e| {
            AppError::usage(format!(
                "Failed to append to download log '{}': {e}",
                self.path.display()
            ))
        })?;
        self.fetched.insert(day);
        Ok(())
    }
}

/// Owns the data directory and the download log.
///
/// Constructed once at startup and passed where needed; there is no
/// module-level state.
#[derive(Debug)]
pub struct SnapshotCache {
    data_dir: PathBuf,
    log: DownloadLog,
}

impl SnapshotCache {
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|e| {
            AppError::usage(format!(
                "Failed to create data directory '{}': {e}",
                data_dir.display()
            ))
        })?;
        let log = DownloadLog::open(data_dir.join(LOG_FILE_NAME))?;
        Ok(Self { data_dir, log })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log(&self) -> &DownloadLog {
        &self.log
    }

    /// Dated file path for a given day's snapshot.
    pub fn snapshot_path(&self, day: NaiveDate) -> PathBuf {
        self.data_dir.join(format!("owid-covid-data_{day}.csv"))
    }

    /// Return `today`'s snapshot, downloading it first if this is the first
    /// call of the day.
    ///
    /// On fetch failure nothing is written: no snapshot file is recorded as
    /// successful and the log keeps its previous contents.
    pub fn ensure_snapshot(
        &mut self,
        today: NaiveDate,
        source: &dyn DataSource,
    ) -> Result<Snapshot, AppError> {
        let path = self.snapshot_path(today);

        // The log answers "was today already fetched?"; the file check guards
        // against a snapshot deleted out from under a truthful log, in which
        // case we refetch instead of failing.
        if self.log.contains(today) && path.exists() {
            return Ok(Snapshot { date: today, path });
        }

        let bytes = source.fetch_raw()?;

        let mut file = File::create(&path).map_err(|e| {
            AppError::usage(format!(
                "Failed to create snapshot '{}': {e}",
                path.display()
            ))
        })?;
        file.write_all(&bytes).map_err(|e| {
            AppError::usage(format!("Failed to write snapshot '{}': {e}", path.display()))
        })?;

        if !self.log.contains(today) {
            self.log.record(today)?;
        }

        Ok(Snapshot { date: today, path })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::ErrorKind;

    struct CountingSource {
        bytes: Vec<u8>,
        calls: Cell<usize>,
    }

    impl CountingSource {
        fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.to_vec(),
                calls: Cell::new(0),
            }
        }
    }

    impl DataSource for CountingSource {
        fn fetch_raw(&self) -> Result<Vec<u8>, AppError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.bytes.clone())
        }
    }

    struct FailingSource;

    impl DataSource for FailingSource {
        fn fetch_raw(&self) -> Result<Vec<u8>, AppError> {
            Err(AppError::fetch("Dataset request failed with status 503."))
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn second_call_same_day_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnapshotCache::open(dir.path()).unwrap();
        let source = CountingSource::new(b"location,date,total_cases\n");
        let today = day(2021, 6, 30);

        let first = cache.ensure_snapshot(today, &source).unwrap();
        let second = cache.ensure_snapshot(today, &source).unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_bytes_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnapshotCache::open(dir.path()).unwrap();
        let payload = b"location,date,total_cases\nItaly,2021-01-01,100\n";
        let source = CountingSource::new(payload);

        let snapshot = cache.ensure_snapshot(day(2021, 1, 2), &source).unwrap();
        assert_eq!(snapshot.read_bytes().unwrap(), payload);
    }

    #[test]
    fn a_new_day_fetches_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnapshotCache::open(dir.path()).unwrap();
        let source = CountingSource::new(b"x");

        cache.ensure_snapshot(day(2021, 1, 1), &source).unwrap();
        cache.ensure_snapshot(day(2021, 1, 2), &source).unwrap();

        assert_eq!(source.calls.get(), 2);
        assert!(cache.snapshot_path(day(2021, 1, 1)).exists());
        assert!(cache.snapshot_path(day(2021, 1, 2)).exists());
    }

    #[test]
    fn failed_fetch_leaves_the_log_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnapshotCache::open(dir.path()).unwrap();
        let today = day(2021, 6, 30);

        let err = cache.ensure_snapshot(today, &FailingSource).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(!cache.log().contains(today));
        assert!(!dir.path().join(LOG_FILE_NAME).exists());

        // A later call on the same day still fetches.
        let source = CountingSource::new(b"ok");
        cache.ensure_snapshot(today, &source).unwrap();
        assert_eq!(source.calls.get(), 1);
        assert!(cache.log().contains(today));
    }

    #[test]
    fn log_survives_a_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let today = day(2021, 6, 30);
        {
            let mut cache = SnapshotCache::open(dir.path()).unwrap();
            cache
                .ensure_snapshot(today, &CountingSource::new(b"x"))
                .unwrap();
        }

        let cache = SnapshotCache::open(dir.path()).unwrap();
        assert!(cache.log().contains(today));
        assert_eq!(cache.log().latest(), Some(today));
        assert_eq!(cache.log().len(), 1);
    }

    #[test]
    fn missing_snapshot_file_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SnapshotCache::open(dir.path()).unwrap();
        let source = CountingSource::new(b"x");
        let today = day(2021, 6, 30);

        let snapshot = cache.ensure_snapshot(today, &source).unwrap();
        fs::remove_file(&snapshot.path).unwrap();

        cache.ensure_snapshot(today, &source).unwrap();
        assert_eq!(source.calls.get(), 2);
        // Still a single log line's worth of state.
        assert_eq!(cache.log().len(), 1);
    }
}
