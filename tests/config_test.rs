use photon_sandbox::config::{PhysicsSettings, SandboxSettings, SimulationSettings};
use photon_sandbox::world::PhysicsParams;

#[test]
fn test_default_settings_round_trip() {
    let settings = SandboxSettings::default();
    let toml = settings.to_toml().expect("defaults serialize");
    let parsed = SandboxSettings::from_toml(&toml).expect("defaults parse");
    assert_eq!(parsed, settings);
}

#[test]
fn test_partial_file_fills_defaults() {
    let data = r#"
        [physics]
        restitution = 0.5

        [simulation]
        start_paused = true
    "#;
    let settings = SandboxSettings::from_toml(data).expect("partial settings parse");

    assert_eq!(settings.physics.restitution, 0.5);
    assert_eq!(settings.physics.gravitational_constant, PhysicsSettings::default().gravitational_constant);
    assert!(settings.simulation.start_paused);
    assert_eq!(settings.simulation.fixed_dt, SimulationSettings::default().fixed_dt);
    assert_eq!(settings.window.width, 800);
    assert_eq!(settings.window.height, 600);
}

#[test]
fn test_malformed_file_is_rejected() {
    assert!(SandboxSettings::from_toml("[physics\nrestitution = ").is_err());
    assert!(SandboxSettings::from_toml("[physics]\nrestitution = \"high\"").is_err());
}

#[test]
fn test_physics_params_follow_settings() {
    let mut settings = PhysicsSettings::default();
    settings.initial_spin_degrees = [1.0, 2.0, 3.0];
    settings.slop = 0.05;
    let params = PhysicsParams::from(settings);
    assert_eq!(params.initial_spin.to_array(), [1.0, 2.0, 3.0]);
    assert_eq!(params.slop, 0.05);
    assert_eq!(params.restitution, 0.8);
}
