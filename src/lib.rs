// PHOTON: N-body physics sandbox with a wgpu renderer

pub mod app;
pub mod assets;
pub mod config;
pub mod rendering;
pub mod utils;
pub mod world;

pub use config::{load_settings, save_settings, SandboxSettings};
pub use rendering::scene::{ObjectKind, ObjectSpec, SceneError, SceneRegistry};
pub use world::{Integrator, Sandbox, SceneEvent};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
