//! Audio file store with LRU eviction.
//!
//! Generated audio is written to `{dir}/{uuid}.{ext}` and indexed in memory.
//! When the index is full, the least recently used file is deleted from disk.
//! Files left by an earlier run are indexed on open, oldest first by mtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use crate::config::ServiceConfig;
use crate::error::{MusicError, Result};
use crate::types::{AudioFormat, AudioReference, GeneratedAudio};

/// Where a stored artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAudio {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
    pub format: AudioFormat,
}

struct IndexEntry {
    path: PathBuf,
    format: AudioFormat,
    last_used: u64,
}

/// Bounded in-memory index. Uses a logical clock so ordering is exact.
struct StorageIndex {
    entries: HashMap<String, IndexEntry>,
    clock: u64,
}

impl StorageIndex {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, file_name: &str) -> Option<(PathBuf, AudioFormat)> {
        let now = self.tick();
        let entry = self.entries.get_mut(file_name)?;
        entry.last_used = now;
        Some((entry.path.clone(), entry.format))
    }

    fn evict_lru(&mut self) -> Option<PathBuf> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(k, _)| k.clone())?;
        self.entries.remove(&oldest).map(|entry| entry.path)
    }
}

/// Disk-backed store for generated audio.
pub struct AudioStore {
    dir: PathBuf,
    public_url: String,
    max_files: usize,
    index: Mutex<StorageIndex>,
}

impl std::fmt::Debug for AudioStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStore")
            .field("dir", &self.dir)
            .field("public_url", &self.public_url)
            .field("max_files", &self.max_files)
            .field("len", &self.len())
            .finish()
    }
}

impl AudioStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub async fn open(
        dir: impl Into<PathBuf>,
        public_url: impl Into<String>,
        max_files: usize,
    ) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            MusicError::storage_failed(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let max_files = max_files.max(1);
        let mut index = StorageIndex {
            entries: HashMap::new(),
            clock: 0,
        };
        for (file_name, path, format) in scan_existing(&dir).await? {
            let now = index.tick();
            index.entries.insert(
                file_name,
                IndexEntry {
                    path,
                    format,
                    last_used: now,
                },
            );
        }

        let mut evicted = Vec::new();
        while index.entries.len() > max_files {
            match index.evict_lru() {
                Some(old) => evicted.push(old),
                None => break,
            }
        }
        remove_evicted(evicted).await;

        tracing::debug!(dir = %dir.display(), files = index.entries.len(), "audio store opened");

        Ok(Self {
            dir,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_files,
            index: Mutex::new(index),
        })
    }

    /// Opens the store described by the service configuration.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::open(
            config.effective_storage_path(),
            config.effective_public_url(),
            config.storage_max_files,
        )
        .await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public URL for a stored file name.
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/audio/{}", self.public_url, file_name)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.lock().entries.contains_key(file_name)
    }

    /// Writes inline audio to disk and indexes it.
    ///
    /// Audio that is already a URI has nothing to store and is rejected.
    pub async fn put(&self, audio: &GeneratedAudio) -> Result<StoredAudio> {
        let bytes = match audio.audio {
            AudioReference::Inline(ref bytes) => bytes,
            AudioReference::Uri(ref uri) => {
                return Err(MusicError::storage_failed(format!(
                    "audio is already stored at {}",
                    uri
                )))
            }
        };

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), audio.format.extension());
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            MusicError::storage_failed(format!("cannot write {}: {}", path.display(), e))
        })?;

        let evicted = {
            let mut index = self.lock();
            let mut evicted = Vec::new();
            while index.entries.len() >= self.max_files {
                match index.evict_lru() {
                    Some(old) => evicted.push(old),
                    None => break,
                }
            }
            let now = index.tick();
            index.entries.insert(
                file_name.clone(),
                IndexEntry {
                    path: path.clone(),
                    format: audio.format,
                    last_used: now,
                },
            );
            evicted
        };

        remove_evicted(evicted).await;

        tracing::debug!(file = %file_name, bytes = bytes.len(), "stored audio");

        Ok(StoredAudio {
            url: self.url_for(&file_name),
            file_name,
            path,
            format: audio.format,
        })
    }

    /// Reads a stored file by name. Unknown names yield `None`.
    pub async fn read(&self, file_name: &str) -> Result<Option<(Vec<u8>, AudioFormat)>> {
        let Some((path, format)) = self.lock().touch(file_name) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some((bytes, format))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.lock().entries.remove(file_name);
                Ok(None)
            }
            Err(e) => Err(MusicError::storage_failed(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StorageIndex> {
        self.index.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Parses a stored file name (`{uuid}.{ext}`) into its format.
fn stored_format(file_name: &str) -> Option<AudioFormat> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    uuid::Uuid::parse_str(stem).ok()?;
    AudioFormat::from_extension(ext)
}

/// Lists files written by earlier runs, oldest first.
async fn scan_existing(dir: &Path) -> Result<Vec<(String, PathBuf, AudioFormat)>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        MusicError::storage_failed(format!("cannot list {}: {}", dir.display(), e))
    })?;

    let mut found = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return Err(MusicError::storage_failed(format!(
                    "cannot list {}: {}",
                    dir.display(),
                    e
                )))
            }
        };
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(format) = stored_format(&file_name) else {
            continue;
        };
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        found.push((modified, file_name, entry.path(), format));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(found
        .into_iter()
        .map(|(_, file_name, path, format)| (file_name, path, format))
        .collect())
}

async fn remove_evicted(evicted: Vec<PathBuf>) {
    for old in evicted {
        if let Err(e) = tokio::fs::remove_file(&old).await {
            tracing::warn!(path = %old.display(), error = %e, "failed to delete evicted audio");
        } else {
            tracing::debug!(path = %old.display(), "evicted audio");
        }
    }
}
