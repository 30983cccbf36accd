//! # Core Module
//!
//! Fundamental types shared by the application and engine layers.
//!
//! ## Key Components
//! - `TerrainError`: The crate-wide error taxonomy
//! - `Result`: Shorthand for results carrying a `TerrainError`

pub mod error;

pub use error::{Result, TerrainError};
