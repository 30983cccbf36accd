//! # Terrain Errors
//!
//! Error taxonomy shared by every subsystem of the terrain core.
//!
//! Only failures that cannot be resolved locally are represented here:
//! - Queries outside resident chunks never error, they fall back to a conservative default.
//! - Corrupt persisted records are recovered where they are loaded and only logged.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors surfaced to callers of the terrain core.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A chunk grid or surface buffer could not be allocated.
    ///
    /// Generation is deterministic, so retrying without freeing memory elsewhere cannot succeed.
    #[error("failed to allocate {cells} density cells: {source}")]
    ResourceExhaustion {
        /// Number of cells that were requested
        cells: usize,
        /// Allocator failure
        #[source]
        source: TryReserveError,
    },

    /// The mesher could not turn a density grid into a surface.
    #[error("surface extraction failed: {0}")]
    Mesher(String),

    /// Reading or writing a persisted record failed.
    #[error("storage error for `{key}`: {source}")]
    Storage {
        /// Record key
        key: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A record or config file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value would break a terrain invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TerrainError>;
