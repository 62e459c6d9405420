use crate::error::Result;
use crate::models::PooledSamples;
use crate::utils::filename::{cache_file_name, is_cache_file};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Pooled samples keyed by fingerprint.
///
/// Entries live in a process-wide map and, when a directory is configured,
/// in one `<fingerprint>.json` file each. Entries are never mutated or
/// evicted here; I/O problems are logged and behave like a miss.
///
/// `get` and `put` do blocking file I/O; async callers run them on the
/// blocking pool.
#[derive(Debug, Default)]
pub struct ResultCache {
    dir: Option<PathBuf>,
    memory: RwLock<HashMap<String, Arc<PooledSamples>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    pub dir: Option<PathBuf>,
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub disk_bytes: u64,
}

impl CacheInfo {
    pub fn summary(&self) -> String {
        let location = self
            .dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(memory only)".to_string());
        format!(
            "Cache: {}\n  In memory: {} entries\n  On disk: {} entries, {:.1} KB",
            location,
            self.memory_entries,
            self.disk_entries,
            self.disk_bytes as f64 / 1024.0
        )
    }
}

impl ResultCache {
    /// Memory-only cache
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache persisted under `dir`, created if missing
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            memory: RwLock::new(HashMap::new()),
        })
    }

    pub fn get(&self, fingerprint: &str) -> Option<Arc<PooledSamples>> {
        if let Some(hit) = self.read_memory(fingerprint) {
            debug!(fingerprint, "Cache hit (memory)");
            return Some(hit);
        }

        let path = self.entry_path(fingerprint)?;
        if !path.exists() {
            return None;
        }

        match read_entry(&path) {
            Ok(pooled) => {
                debug!(fingerprint, "Cache hit (disk)");
                let pooled = Arc::new(pooled);
                self.write_memory(fingerprint, pooled.clone());
                Some(pooled)
            }
            Err(e) => {
                warn!(fingerprint, path = %path.display(), error = %e, "Unreadable cache entry, treating as miss");
                None
            }
        }
    }

    /// Store an entry; a concurrent put for the same fingerprint simply
    /// replaces it
    pub fn put(&self, fingerprint: &str, pooled: Arc<PooledSamples>) {
        if let Some(dir) = &self.dir {
            if let Err(e) = write_entry(dir, fingerprint, &pooled) {
                warn!(fingerprint, dir = %dir.display(), error = %e, "Could not persist cache entry");
            }
        }

        self.write_memory(fingerprint, pooled);
    }

    pub fn info(&self) -> Result<CacheInfo> {
        let memory_entries = self.memory.read().map(|m| m.len()).unwrap_or_default();
        let mut disk_entries = 0;
        let mut disk_bytes = 0;

        if let Some(dir) = &self.dir {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if is_cache_file(&path) {
                    disk_entries += 1;
                    disk_bytes += std::fs::metadata(&path)?.len();
                }
            }
        }

        Ok(CacheInfo {
            dir: self.dir.clone(),
            memory_entries,
            disk_entries,
            disk_bytes,
        })
    }

    /// Remove every entry; returns how many files were deleted
    pub fn clear(&self) -> Result<usize> {
        if let Ok(mut memory) = self.memory.write() {
            memory.clear();
        }

        let mut removed = 0;
        if let Some(dir) = &self.dir {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if is_cache_file(&path) {
                    std::fs::remove_file(&path)?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    fn entry_path(&self, fingerprint: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(cache_file_name(fingerprint)))
    }

    fn read_memory(&self, fingerprint: &str) -> Option<Arc<PooledSamples>> {
        self.memory
            .read()
            .ok()
            .and_then(|memory| memory.get(fingerprint).cloned())
    }

    fn write_memory(&self, fingerprint: &str, pooled: Arc<PooledSamples>) {
        match self.memory.write() {
            Ok(mut memory) => {
                memory.insert(fingerprint.to_string(), pooled);
            }
            Err(e) => warn!(fingerprint, error = %e, "In-memory cache poisoned"),
        }
    }
}

fn read_entry(path: &Path) -> Result<PooledSamples> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write to a temp file beside the target, then rename over it
fn write_entry(dir: &Path, fingerprint: &str, pooled: &PooledSamples) -> Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, pooled)?;
        writer.flush()?;
    }
    temp.persist(dir.join(cache_file_name(fingerprint)))
        .map_err(|e| e.error)?;
    Ok(())
}
