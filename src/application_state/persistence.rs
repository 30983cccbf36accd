//! # Persistence
//!
//! Key/value storage for the two persisted records of a session:
//!
//! * `playerPosition` - `{"x": .., "y": .., "z": ..}`, written every frame
//! * `carvingSpheres` - `[{"x": .., "y": .., "z": .., "r": ..}, ..]`, written after every mining action
//!
//! Values are JSON strings, so any backend able to store text by key can persist a world.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use cgmath::Point3;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::{Result, TerrainError};

/// Storage key of the observer position record.
pub const PLAYER_POSITION_KEY: &str = "playerPosition";
/// Storage key of the carve sphere list.
pub const CARVING_SPHERES_KEY: &str = "carvingSpheres";

/// A text store addressed by key.
pub trait Storage {
    /// Returns the stored value, or `None` when nothing was stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn store(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a save directory.
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a save directory.
    pub fn open<P: Into<PathBuf>>(directory: P) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| TerrainError::Storage {
            key: directory.display().to_string(),
            source,
        })?;
        Ok(Self { directory })
    }

    /// Directory holding the record files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TerrainError::Storage {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        // Write then rename so a crash mid-write never leaves a truncated record.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .and_then(|_| fs::rename(&staging, &path))
            .map_err(|source| TerrainError::Storage {
                key: key.to_string(),
                source,
            })
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStorage {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted form of the observer position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerPosition {
    /// World x
    pub x: f64,
    /// World y
    pub y: f64,
    /// World z
    pub z: f64,
}

impl From<Point3<f64>> for PlayerPosition {
    fn from(p: Point3<f64>) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

impl From<PlayerPosition> for Point3<f64> {
    fn from(p: PlayerPosition) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

/// Writes the observer position record.
pub fn store_player_position(storage: &dyn Storage, position: Point3<f64>) -> Result<()> {
    let text = serde_json::to_string(&PlayerPosition::from(position))?;
    storage.store(PLAYER_POSITION_KEY, &text)
}

/// Reads the observer position record.
///
/// Absent, unreadable, malformed and non-finite records all yield `None`; the caller then
/// falls back to the configured spawn.
pub fn load_player_position(storage: &dyn Storage) -> Option<Point3<f64>> {
    let text = match storage.load(PLAYER_POSITION_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(err) => {
            warn!("Could not read {PLAYER_POSITION_KEY}, using spawn: {err}");
            return None;
        }
    };

    match serde_json::from_str::<Option<PlayerPosition>>(&text) {
        Ok(Some(p)) if p.x.is_finite() && p.y.is_finite() && p.z.is_finite() => Some(p.into()),
        Ok(Some(p)) => {
            warn!("Ignoring non-finite {PLAYER_POSITION_KEY} {p:?}");
            None
        }
        Ok(None) => None,
        Err(err) => {
            warn!("Corrupt {PLAYER_POSITION_KEY} record, using spawn: {err}");
            None
        }
    }
}
