use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pager_logging::pager_info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::FeedItem;

const SNAPSHOT_FILENAME: &str = "feed_snapshot.json";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    Version(u32),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    items: Vec<FeedItem>,
}

/// Writes the store contents to `{dir}/feed_snapshot.json`.
pub fn save_snapshot(dir: &Path, items: &[FeedItem]) -> Result<PathBuf, PersistError> {
    let content = serde_json::to_vec_pretty(&Snapshot {
        version: SNAPSHOT_VERSION,
        items: items.to_vec(),
    })?;
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(SNAPSHOT_FILENAME, &content)?;
    pager_info!("Saved {} feed items to {:?}", items.len(), path);
    Ok(path)
}

/// Reads a snapshot written by [`save_snapshot`]. A missing file is an empty feed.
pub fn load_snapshot(dir: &Path) -> Result<Vec<FeedItem>, PersistError> {
    let path = dir.join(SNAPSHOT_FILENAME);
    let content = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let snapshot: Snapshot = serde_json::from_slice(&content)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistError::Version(snapshot.version));
    }
    pager_info!("Loaded {} feed items from {:?}", snapshot.items.len(), path);
    Ok(snapshot.items)
}
