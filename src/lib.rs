#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Tunnel Terrain
//!
//! The core of a first-person underground exploration world: a procedural density field
//! with player-carved tunnels, streamed in fixed-size chunks around a moving observer.
//!
//! ## Key Modules
//!
//! * `application_state` - Configuration, input, persistence and the running session
//! * `core` - Error type shared by the crate
//! * `engine_state` - Density field, chunk streaming, walkability, mining and the observer
//!
//! ## Architecture
//!
//! The crate keeps a clear separation between:
//! * The density field, a pure function of position and the carve history
//! * Chunk residency, which caches sampled grids and extracted surfaces
//! * The renderer, reached only through the `SurfaceSink` trait
//! * Persistence, reached only through the `Storage` trait
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     tunnel_terrain::run();
//! }
//! ```

use std::path::PathBuf;

use application_state::{
    config::Config,
    persistence::{FileStorage, Storage},
    ApplicationState, Session,
};
use clap::Parser;
use engine_state::rendering::meshing::SurfaceNetsMesher;
use log::{error, info};
use winit::event_loop::{ControlFlow, EventLoop};

pub mod application_state;
pub mod core;
pub mod engine_state;

/// Command line of the native session.
#[derive(Parser, Debug)]
#[command(name = "tunnel-terrain", about = "Explore and mine a procedurally tunnelled world")]
pub struct Args {
    /// JSON config file; omitted fields keep their defaults
    pub config: Option<PathBuf>,
    /// Directory the player position and carve history are saved in
    #[arg(long, default_value = "save")]
    pub save_dir: PathBuf,
}

/// Runs the native application: restores the saved world and explores it in a window.
///
/// WASD moves, the mouse looks around once the pointer is locked with a click, a further
/// left click mines, and Escape quits.
pub fn run() {
    let args = Args::parse();

    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let session = match start_session(&args) {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to start session: {err}");
            return;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            error!("Failed to create event loop: {err}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut state = ApplicationState::new(session);
    if let Err(err) = event_loop.run_app(&mut state) {
        error!("Event loop failed: {err}");
    }
}

fn start_session(args: &Args) -> crate::core::Result<Session<SurfaceNetsMesher>> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let storage: Box<dyn Storage> = Box::new(FileStorage::open(args.save_dir.clone())?);
    Session::new(&config, SurfaceNetsMesher, storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_default_to_local_save() {
        let args = Args::try_parse_from(["tunnel-terrain"]).unwrap();
        assert_eq!(args.config, None);
        assert_eq!(args.save_dir, PathBuf::from("save"));
    }

    #[test]
    fn arguments_accept_config_and_save_dir() {
        let args =
            Args::try_parse_from(["tunnel-terrain", "world.json", "--save-dir", "/tmp/world"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("world.json")));
        assert_eq!(args.save_dir, PathBuf::from("/tmp/world"));
    }
}
