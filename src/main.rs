use photon_sandbox::app::App;
use photon_sandbox::config::{load_settings, save_settings, SandboxSettings};
use photon_sandbox::rendering::buffer::HeadlessAllocator;
use photon_sandbox::utils::logging::{init_logging, log_system_info};
use photon_sandbox::world::Sandbox;
use tracing::{info, warn};
use winit::event_loop::{ControlFlow, EventLoop};

const DEFAULT_HEADLESS_FRAMES: u64 = 600;

fn main() -> anyhow::Result<()> {
    init_logging();
    log_system_info();
    info!("{} {}", photon_sandbox::APP_NAME, photon_sandbox::VERSION);

    let settings = load_settings().unwrap_or_else(|| {
        info!("No saved settings, using defaults");
        let settings = SandboxSettings::default();
        if let Err(e) = save_settings(&settings) {
            warn!("Could not save default settings: {}", e);
        }
        settings
    });

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("--headless") {
        let frames = match args.next() {
            Some(n) => n.parse()?,
            None => DEFAULT_HEADLESS_FRAMES,
        };
        run_headless(settings, frames);
        return Ok(());
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(settings);
    event_loop.run_app(&mut app)?;
    app.into_result()
}

/// Steps the example scene without a window and logs where the bodies end up.
fn run_headless(settings: SandboxSettings, frames: u64) {
    let mut sandbox = Sandbox::new(HeadlessAllocator::new(), settings);
    if let Err(e) = sandbox.seed_example_scene() {
        warn!("Example scene incomplete: {}", e);
    }
    for _ in 0..frames {
        sandbox.tick();
    }
    for (record, body) in sandbox.scene().objects().iter().filter_map(|record| {
        let body = sandbox.physics().body(record.body?)?;
        Some((record, body))
    }) {
        info!(
            "{}: position {:?}, velocity {:?}, mass {}",
            record.name, body.position, body.velocity, body.mass()
        );
    }
    info!("Total momentum after {} frames: {:?}", frames, sandbox.physics().total_momentum());
    sandbox.shutdown();
}
