use std::fs;
use std::path::PathBuf;
use directories::ProjectDirs;
use serde::{Serialize, Deserialize};

const SETTINGS_FILE: &str = "sandbox.toml";

// =============================================================================
// Sandbox Configuration System
// =============================================================================

/// Stylised constants for the N-body step. The values are tuned for a scene
/// a few units across, not for SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravitational_constant: f64,
    pub restitution: f64,       // 0 = perfectly plastic, 1 = perfectly elastic
    pub correction_percent: f64,
    pub slop: f64,              // overlap tolerated before positional correction
    pub initial_spin_degrees: [f64; 3],
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravitational_constant: 6.67430e-6,
            restitution: 0.8,
            correction_percent: 0.8,
            slop: 0.01,
            initial_spin_degrees: [0.0, 9.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub fixed_dt: f64,
    pub start_paused: bool,
    pub seed_example_scene: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            fixed_dt: 0.016,
            start_paused: false,
            seed_example_scene: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "PHOTON".to_string(),
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub texture_dir: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            texture_dir: PathBuf::from("assets/textures"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxSettings {
    pub physics: PhysicsSettings,
    pub simulation: SimulationSettings,
    pub window: WindowSettings,
    pub assets: AssetSettings,
}

impl SandboxSettings {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn from_toml(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }
}

fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "photon", "photon-sandbox")
        .map(|proj| proj.config_dir().join(SETTINGS_FILE))
}

pub fn save_settings(settings: &SandboxSettings) -> std::io::Result<()> {
    if let Some(path) = settings_path() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = settings.to_toml()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, toml)?;
    }
    Ok(())
}

pub fn load_settings() -> Option<SandboxSettings> {
    let path = settings_path()?;
    let data = fs::read_to_string(&path).ok()?;
    match SandboxSettings::from_toml(&data) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("Ignoring malformed settings at {:?}: {}", path, e);
            None
        }
    }
}
