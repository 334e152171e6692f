//! Durable storage for per-identity day maps.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

use crate::error::{HistoryError, Result};
use crate::models::{DayKey, DayMap, Sample};

/// Where identity histories live between process runs.
///
/// Identities passed in are already normalized.
pub trait HistoryRepository: Send + Sync {
    /// Load the stored day map. A missing snapshot is an empty map, not an error.
    fn load(&self, identity: &str) -> Result<DayMap>;

    /// Replace the stored day map with `days`.
    fn save(&self, identity: &str, days: &DayMap) -> Result<()>;
}

/// One `<identity>.json` file per identity under a base directory.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    /// Use `dir` as the base directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "history directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing one identity.
    pub fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{identity}.json"))
    }

    fn checked_path(&self, identity: &str) -> Result<PathBuf> {
        if is_safe_file_stem(identity) {
            Ok(self.path_for(identity))
        } else {
            Err(HistoryError::UnsafeIdentity(identity.to_string()))
        }
    }
}

/// True when `identity` names a file directly inside the history directory.
pub fn is_safe_file_stem(identity: &str) -> bool {
    !identity.is_empty()
        && identity != "."
        && identity != ".."
        && !identity.contains(['/', '\\', '\0'])
}

/// Decode a stored day map. Keys longer than a day key are dropped instead
/// of failing the whole file.
fn decode_days(bytes: &[u8]) -> Result<DayMap> {
    // Go-style writers emit `null` for an empty map
    let raw: Option<BTreeMap<String, Vec<Sample>>> = serde_json::from_slice(bytes)?;
    let days = raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, samples)| match DayKey::from(&key) {
            Ok(day) => Some((day, samples)),
            Err(_) => {
                debug!(%key, "dropping history entry with oversized day key");
                None
            }
        })
        .collect();
    Ok(days)
}

impl HistoryRepository for JsonFileRepository {
    fn load(&self, identity: &str) -> Result<DayMap> {
        let bytes = match fs::read(self.checked_path(identity)?) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DayMap::new()),
            Err(err) => return Err(err.into()),
        };

        decode_days(&bytes)
    }

    fn save(&self, identity: &str, days: &DayMap) -> Result<()> {
        let path = self.checked_path(identity)?;
        let bytes = serde_json::to_vec(days)?;
        fs::write(path, bytes)?;
        debug!(%identity, days = days.len(), "wrote history file");
        Ok(())
    }
}

/// In-memory repository. Keeps the latest saved map per identity plus a
/// log of every save, so callers can see exactly when flushes happened.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    stored: Mutex<HashMap<String, DayMap>>,
    saves: Mutex<Vec<String>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored snapshot as if a previous process had flushed it.
    pub fn with_stored(self, identity: &str, days: DayMap) -> Self {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), days);
        self
    }

    /// Latest stored map for an identity.
    pub fn stored(&self, identity: &str) -> Option<DayMap> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    /// Identities saved so far, in save order (one entry per save).
    pub fn saves(&self) -> Vec<String> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryRepository for MemoryRepository {
    fn load(&self, identity: &str) -> Result<DayMap> {
        Ok(self.stored(identity).unwrap_or_default())
    }

    fn save(&self, identity: &str, days: &DayMap) -> Result<()> {
        self.stored
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), days.clone());
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(identity.to_string());
        Ok(())
    }
}
