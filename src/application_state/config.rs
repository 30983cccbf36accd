//! # Configuration
//!
//! Startup-time constants of the terrain, grouped by the subsystem that consumes them.
//!
//! Every field has a default matching the reference world, so a config file only needs
//! to name the values it overrides:
//!
//! ```json
//! { "streaming": { "load_radius": 2, "evict_radius": 7 } }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::core::{Result, TerrainError};

/// Complete terrain configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Density field and chunk grid settings
    pub terrain: TerrainConfig,
    /// Chunk residency radii
    pub streaming: StreamingConfig,
    /// Observer movement and spawn settings
    pub player: PlayerConfig,
    /// Mining ray settings
    pub carve: CarveConfig,
}

/// Settings for the density field and the per-chunk sample grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Edge length of a chunk, in world units and grid cells
    pub chunk_size: usize,
    /// Density threshold separating solid from empty
    pub isolevel: f32,
    /// Seed of the coherent noise source
    pub noise_seed: u32,
    /// Scale applied to world coordinates before sampling noise
    pub tunnel_scale: f64,
    /// Multiplier applied to the raw noise value
    pub noise_gain: f64,
    /// Offset subtracted after the gain, lower values produce more tunnel
    pub noise_offset: f64,
    /// Center of the containment shell
    pub world_center: [f64; 3],
    /// Radius of the containment shell
    pub containment_radius: f64,
    /// Weight of the containment falloff
    pub containment_weight: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            isolevel: 0.0,
            noise_seed: 0,
            tunnel_scale: 0.05,
            noise_gain: 10.0,
            noise_offset: 3.0,
            world_center: [32.0, 32.0, 32.0],
            containment_radius: 30.0,
            containment_weight: 0.3,
        }
    }
}

/// Radii, in chunks, controlling which chunks stay resident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chebyshev radius of the required neighborhood
    pub load_radius: i32,
    /// Manhattan distance beyond which resident chunks are evicted
    pub evict_radius: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_radius: 1,
            evict_radius: 4,
        }
    }
}

/// Observer movement and spawn settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Movement speed in world units per second
    pub move_speed: f64,
    /// Radians of rotation per pixel of mouse movement
    pub look_sensitivity: f64,
    /// Spawn position used when no position was persisted
    pub spawn_position: [f64; 3],
    /// Point the observer faces on a fresh spawn
    pub spawn_look_at: [f64; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 30.0,
            look_sensitivity: 0.002,
            spawn_position: [32.0, 32.0, 64.0],
            spawn_look_at: [32.0, 32.0, 32.0],
        }
    }
}

/// Shape of the carve ray fired by a mining action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarveConfig {
    /// Number of spheres appended per mining action
    pub steps: usize,
    /// Distance between consecutive spheres along the ray
    pub spacing: f64,
    /// Radius of each sphere
    pub radius: f64,
}

impl Default for CarveConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            spacing: 4.0,
            radius: 2.5,
        }
    }
}

impl Config {
    /// Reads a JSON config file, filling omitted fields with defaults, and validates it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TerrainError::Storage {
            key: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would break the streaming or carving invariants.
    pub fn validate(&self) -> Result<()> {
        let terrain = &self.terrain;
        if terrain.chunk_size == 0 {
            return Err(TerrainError::InvalidConfig("chunk_size must be positive".into()));
        }
        if terrain.chunk_size > u32::MAX as usize {
            return Err(TerrainError::InvalidConfig("chunk_size does not fit in u32".into()));
        }

        let streaming = &self.streaming;
        if streaming.load_radius < 0 {
            return Err(TerrainError::InvalidConfig("load_radius must not be negative".into()));
        }
        // The farthest required chunk sits at Manhattan distance 3 * load_radius.
        if streaming.evict_radius < 3 * streaming.load_radius
            || streaming.evict_radius <= streaming.load_radius
        {
            return Err(TerrainError::InvalidConfig(format!(
                "evict_radius {} would evict chunks inside load_radius {}",
                streaming.evict_radius, streaming.load_radius
            )));
        }

        let carve = &self.carve;
        if carve.spacing.is_nan() || carve.spacing <= 0.0 || carve.radius.is_nan() || carve.radius <= 0.0 {
            return Err(TerrainError::InvalidConfig(
                "carve spacing and radius must be positive".into(),
            ));
        }

        if self.player.move_speed.is_nan() || self.player.move_speed < 0.0 {
            return Err(TerrainError::InvalidConfig("move_speed must not be negative".into()));
        }

        Ok(())
    }
}
