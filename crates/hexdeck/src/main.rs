use hexdeck::{HexdeckServerBuilder, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hexdeck=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        addr = %config.bind_addr(),
        data_dir = ?config.data_dir,
        tick_ms = config.tick_period.as_millis() as u64,
        "starting hexdeck server"
    );

    let server = HexdeckServerBuilder::from_config(&config)?.build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;
    Ok(())
}
