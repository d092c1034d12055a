pub mod channels; // Inter-component communication channels
pub mod config; // Configuration management
pub mod coordinator; // Frame decoding pipeline and availability
pub mod error; // Frame rejection reasons
pub mod home_assistant; // Home Assistant discovery
pub mod mqtt; // MQTT client and messaging
pub mod omnik; // Omnik logger frame format and transport
pub mod options; // Command line options parsing
pub mod prelude; // Common imports and types
pub mod utils; // Utility functions

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;

/// Long-running parts of the bridge, kept together so they can be stopped in order.
#[derive(Clone)]
pub struct Components {
    pub listener: Listener,
    pub coordinator: Coordinator,
    pub mqtt: Mqtt,
}

impl Components {
    /// Stops intake first so that no new frames arrive while the coordinator
    /// and MQTT client wind down.
    pub fn stop(&self) {
        info!("Stopping all components...");

        self.listener.stop();
        self.coordinator.stop();
        self.mqtt.stop();
    }
}

/// Sets up env_logger with timestamps; `level` is used unless RUST_LOG is set.
pub fn init_logging(level: &str) {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
    {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

/// Runs the bridge until `shutdown_rx` fires.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, config: ConfigWrapper) -> Result<()> {
    info!("omnik-bridge {} starting", CARGO_PKG_VERSION);

    let channels = Channels::new();

    info!("Initializing components...");

    let coordinator = Coordinator::new(config.clone(), channels.clone());
    let coordinator_clone = coordinator.clone();
    let coordinator_handle = tokio::spawn(async move {
        if let Err(e) = coordinator_clone.start().await {
            error!("Coordinator task failed: {}", e);
        }
    });

    let mqtt = Mqtt::new(config.clone(), channels.clone(), coordinator.shared_stats.clone());
    let mqtt_clone = mqtt.clone();
    let mqtt_handle = tokio::spawn(async move {
        if let Err(e) = mqtt_clone.start().await {
            error!("MQTT task failed: {}", e);
        }
    });

    let listener = Listener::new(config.clone(), channels.clone());
    let listener_clone = listener.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener_clone.start().await {
            error!("Listener task failed: {}", e);
        }
    });

    let components = Components {
        listener,
        coordinator,
        mqtt,
    };

    info!("Waiting for shutdown signal...");
    let _ = shutdown_rx.recv().await;

    info!("Shutdown signal received, stopping components...");
    components.stop();

    for (name, handle) in [
        ("listener", listener_handle),
        ("coordinator", coordinator_handle),
        ("mqtt", mqtt_handle),
    ] {
        if let Err(e) = handle.await {
            error!("Error waiting for {} task: {}", name, e);
        }
    }

    if let Ok(stats) = components.coordinator.shared_stats.lock() {
        stats.print_summary();
    }

    info!("Shutdown complete");
    Ok(())
}
