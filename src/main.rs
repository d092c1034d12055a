use omnik_bridge::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    let config = ConfigWrapper::new(options.config_file.clone())?;

    omnik_bridge::init_logging(&config.loglevel());
    info!("Using config file: {}", options.config_file);
    config.log_summary();

    // Create a channel for shutdown signaling
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        let _ = shutdown_tx_clone.send(());
    });

    if let Some(runtime) = options.runtime {
        info!("Stopping after {} seconds", runtime);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(runtime)).await;
            let _ = shutdown_tx.send(());
        });
    }

    if let Err(e) = omnik_bridge::app(shutdown_rx, config).await {
        error!("Application error: {}", e);
        return Err(e);
    }

    Ok(())
}
