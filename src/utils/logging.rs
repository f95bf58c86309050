use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use std::env;
use std::fs;
use std::io;

const LOG_FILE: &str = "log.txt";

/// Console plus session log file, filtered by `RUST_LOG` when set.
pub fn init_logging() {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let enable_wgpu_logging = env::var("WGPU_LOG").map_or(false, |v| v == "1");
    let enable_backtrace = env::var("RUST_BACKTRACE").map_or(false, |v| v == "1");

    // Remove existing log file so each session starts clean
    if let Err(e) = fs::remove_file(LOG_FILE) {
        if e.kind() != io::ErrorKind::NotFound {
            eprintln!("Warning: Failed to remove existing {}: {}", LOG_FILE, e);
        }
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&log_level);
        let mut directives = vec!["photon_sandbox=debug"];
        if enable_wgpu_logging {
            directives.extend(["wgpu=debug", "wgpu_core=debug", "wgpu_hal=debug", "naga=debug"]);
        }
        for directive in directives {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    });

    let console = fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true);

    // Console logging still works if the file cannot be created
    let file = match fs::File::create(LOG_FILE) {
        Ok(log_file) => Some(
            fmt::layer()
                .with_writer(log_file)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false),
        ),
        Err(e) => {
            eprintln!("Warning: Failed to create {}: {}", LOG_FILE, e);
            None
        }
    };

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .is_err()
    {
        return;
    }

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", log_level);
    tracing::info!("WGPU logging enabled: {}", enable_wgpu_logging);
}

/// Log system information for debugging
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", env::consts::OS);
    tracing::info!("Architecture: {}", env::consts::ARCH);
    tracing::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if let Ok(backend) = env::var("WGPU_BACKEND") {
        tracing::info!("WGPU Backend: {}", backend);
    }
    if let Ok(adapter) = env::var("WGPU_ADAPTER_NAME") {
        tracing::info!("WGPU Adapter: {}", adapter);
    }
    tracing::info!("==========================");
}

pub fn handle_wgpu_result<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) -> Result<T, E> {
    match &result {
        Ok(_) => {
            tracing::debug!("WGPU operation '{}' completed successfully", operation);
        }
        Err(e) => {
            tracing::error!("WGPU operation '{}' failed: {}", operation, e);
        }
    }
    result
}

pub fn log_adapter_info(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    tracing::info!("=== WGPU Adapter Information ===");
    tracing::info!("Name: {}", info.name);
    tracing::info!("Backend: {:?}", info.backend);
    tracing::info!("Device Type: {:?}", info.device_type);
    tracing::info!("Driver: {} ({})", info.driver, info.driver_info);
    tracing::info!("================================");
}

pub fn log_device_info(device: &wgpu::Device) {
    let limits = device.limits();
    tracing::info!(
        "Device limits: max bind groups {}, max uniform buffer {} bytes, max texture 2D {}",
        limits.max_bind_groups,
        limits.max_uniform_buffer_binding_size,
        limits.max_texture_dimension_2d
    );
    tracing::debug!("Device features: {:?}", device.features());
}
