//! `devsquad serve` — start the WebSocket gateway.

use devsquad_config::AppConfig;
use tracing::info;

pub async fn run(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.gateway.port = port;
    }

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        model = %config.llm.model,
        "Starting DevSquad gateway"
    );

    devsquad_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))
}
