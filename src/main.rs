//! # Tunnel Terrain Entry Point
//!
//! Calls into the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- [config.json] [--save-dir save]
//! ```

fn main() {
    tunnel_terrain::run();
}
