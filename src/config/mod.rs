pub mod settings;

// Re-export commonly used types
pub use settings::{
    SandboxSettings, PhysicsSettings, SimulationSettings, WindowSettings, AssetSettings,
    save_settings, load_settings,
};
