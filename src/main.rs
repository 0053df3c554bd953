use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use package_tracker::{
    config::Config,
    dispatcher::IntentDispatcher,
    formatter::UtteranceFormatter,
    server,
    shipment::ShipEngineClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let dispatcher = Arc::new(IntentDispatcher::new(
        Arc::new(ShipEngineClient::new(config.clone())?),
        UtteranceFormatter::new(config.display_offset),
    ));

    tracing::info!(
        shipengine_url = %config.shipengine_url,
        display_offset = %config.display_offset,
        "Package tracker starting"
    );

    server::run_server(config, dispatcher).await?;

    Ok(())
}
