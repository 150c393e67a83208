//! JSON file store shared between processes

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tokio::sync::watch;
use tracing::debug;

use super::TimerStore;
use crate::{error::Result, state::TimerRecord};

/// Store backed by one JSON document. Each write goes to its own uniquely
/// named temp file in the same directory, which is then renamed over the
/// target, so concurrent writers never share a temp file and readers never
/// observe a torn record.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    tx: watch::Sender<TimerRecord>,
}

impl FileStore {
    /// Open the store at `path`; the file is created on first write
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let record = read_record(&path)?;
        let (tx, _) = watch::channel(record);
        debug!("Opened timer store at {}", path.display());
        Ok(Self { path, tx })
    }

    /// Default location under the user's state directory
    pub fn default_path() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("better-timer")
            .join("timer.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_record(path: &Path) -> Result<TimerRecord> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(TimerRecord::new()),
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(TimerRecord::new()),
        Err(e) => Err(e.into()),
    }
}

impl TimerStore for FileStore {
    fn get(&self) -> Result<TimerRecord> {
        let record = read_record(&self.path)?;
        self.tx.send_if_modified(|cached| {
            let changed = *cached != record;
            *cached = record;
            changed
        });
        Ok(record)
    }

    fn set(&self, record: &TimerRecord) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(record)?)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        self.tx.send_replace(*record);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<TimerRecord> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("timer.json")).unwrap();
        assert_eq!(store.get().unwrap(), TimerRecord::new());
    }

    #[test]
    fn writes_are_visible_to_other_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timer.json");
        let panel = FileStore::open(&path).unwrap();
        let daemon = FileStore::open(&path).unwrap();

        let record = TimerRecord {
            running: true,
            end_time: Some(42_000),
            remaining: 42,
            total: 42,
            timer_finished: false,
        };
        panel.set(&record).unwrap();
        assert_eq!(daemon.get().unwrap(), record);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"endTime\": 42000"));
    }

    #[test]
    fn reads_refresh_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timer.json");
        let writer = FileStore::open(&path).unwrap();
        let reader = FileStore::open(&path).unwrap();
        let mut rx = reader.subscribe();

        writer.set(&TimerRecord::finished()).unwrap();
        assert!(!rx.has_changed().unwrap());
        reader.get().unwrap();
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn concurrent_writers_never_corrupt_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timer.json");

        let writers: Vec<_> = (0..2u64)
            .map(|id| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = FileStore::open(&path).unwrap();
                    for step in 0..500u64 {
                        let record = TimerRecord {
                            remaining: id * 1_000 + step,
                            total: id * 1_000 + step,
                            ..TimerRecord::new()
                        };
                        store.set(&record).unwrap();
                        let read = store.get().unwrap();
                        assert_eq!(read.remaining, read.total);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let last = FileStore::open(&path).unwrap().get().unwrap();
        assert!([499, 1_499].contains(&last.remaining));
        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn default_path_ends_in_app_directory() {
        let path = FileStore::default_path();
        assert!(path.ends_with("better-timer/timer.json"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timer.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileStore::open(&path).is_err());
    }
}
