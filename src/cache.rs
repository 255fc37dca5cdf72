//! Persistent, directional cache of route costs.
//!
//! Entries are keyed by the ordered coordinate pair (each rounded to six
//! decimals) plus the provider that produced them, so `A -> B` and `B -> A`
//! are distinct and the two routing services never overwrite each other.
//! Only successful provider responses are stored.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::model::{Coordinate, CostEntry, ProviderKind};

/// Number of new entries between automatic flushes.
pub const DEFAULT_FLUSH_EVERY: usize = 10;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct CacheKey {
    from: String,
    to: String,
    provider: ProviderKind,
}

impl CacheKey {
    fn new(from: Coordinate, to: Coordinate, provider: ProviderKind) -> Self {
        Self {
            from: from.key(),
            to: to.key(),
            provider,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    from: String,
    to: String,
    entry: CostEntry,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<CacheRecord>,
}

#[derive(Debug)]
pub struct CostCache {
    path: Option<PathBuf>,
    entries: HashMap<CacheKey, CostEntry>,
    flush_every: usize,
    pending: usize,
}

impl CostCache {
    /// A cache backed by the JSON file at `path`. Call [`CostCache::load`]
    /// before use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: HashMap::new(),
            flush_every: DEFAULT_FLUSH_EVERY,
            pending: 0,
        }
    }

    /// A cache that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: HashMap::new(),
            flush_every: DEFAULT_FLUSH_EVERY,
            pending: 0,
        }
    }

    /// Sets the flush cadence. Zero disables periodic flushing.
    #[must_use]
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written since the last successful flush.
    pub fn pending_writes(&self) -> usize {
        self.pending
    }

    /// Replaces the in-memory contents with the file's.
    ///
    /// A missing, unreadable or corrupt file leaves the cache empty; the
    /// run goes on without cached costs. Returns the number of entries
    /// loaded.
    pub fn load(&mut self) -> usize {
        self.entries.clear();
        self.pending = 0;

        let Some(path) = self.path.clone() else {
            return 0;
        };

        match read_file(&path) {
            Ok(Some(records)) => {
                for record in records {
                    let key = CacheKey {
                        from: record.from,
                        to: record.to,
                        provider: record.entry.provider,
                    };
                    self.entries.insert(key, record.entry);
                }
                info!(path = %path.display(), entries = self.entries.len(), "loaded cost cache");
            }
            Ok(None) => {
                debug!(path = %path.display(), "no cost cache yet, starting empty");
            }
            Err(err) => {
                warn!(error = %err, "ignoring unusable cost cache");
            }
        }

        self.entries.len()
    }

    /// Looks up the entry a specific provider produced for `from -> to`.
    pub fn get(&self, from: Coordinate, to: Coordinate, provider: ProviderKind) -> Option<&CostEntry> {
        self.entries.get(&CacheKey::new(from, to, provider))
    }

    /// Looks up `from -> to`, preferring the primary provider's entry.
    pub fn lookup(&self, from: Coordinate, to: Coordinate) -> Option<&CostEntry> {
        self.get(from, to, ProviderKind::Primary)
            .or_else(|| self.get(from, to, ProviderKind::Fallback))
    }

    /// Stores `entry` under its provider, replacing any previous value.
    ///
    /// Every `flush_every` writes the cache is flushed to disk; a failed
    /// flush is logged and attempted again at the next cadence.
    pub fn put(&mut self, from: Coordinate, to: Coordinate, entry: CostEntry) {
        let key = CacheKey::new(from, to, entry.provider);
        self.entries.insert(key, entry);
        self.pending += 1;

        if self.flush_every > 0 && self.pending >= self.flush_every {
            if let Err(err) = self.flush() {
                warn!(error = %err, "periodic cost cache flush failed");
            }
        }
    }

    /// Writes every entry to disk.
    ///
    /// The file is replaced atomically so an interrupted write leaves the
    /// previous contents usable.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        let Some(path) = self.path.as_deref() else {
            self.pending = 0;
            return Ok(());
        };

        let mut records: Vec<(&CacheKey, &CostEntry)> = self.entries.iter().collect();
        records.sort_by(|a, b| a.0.cmp(b.0));
        let file = CacheFile {
            version: FORMAT_VERSION,
            entries: records
                .into_iter()
                .map(|(key, entry)| CacheRecord {
                    from: key.from.clone(),
                    to: key.to.clone(),
                    entry: entry.clone(),
                })
                .collect(),
        };

        write_file(path, &file)?;
        debug!(path = %path.display(), entries = file.entries.len(), "flushed cost cache");
        self.pending = 0;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<Option<Vec<CacheRecord>>, CacheError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let parsed: CacheFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CacheError::Format {
            path: path.to_path_buf(),
            source,
        })?;

    if parsed.version != FORMAT_VERSION {
        return Err(CacheError::Version {
            path: path.to_path_buf(),
            version: parsed.version,
        });
    }

    Ok(Some(parsed.entries))
}

fn write_file(path: &Path, contents: &CacheFile) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&tmp_path).map_err(io_err)?);
    serde_json::to_writer(&mut writer, contents).map_err(|source| CacheError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)?;
    drop(writer);
    fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}
