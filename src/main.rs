use anyhow::{Context, Result};
use clap::Parser;
use pixelart_agent::app::{build_agent, check_providers};
use pixelart_agent::models::Config;
use pixelart_agent::server::{router, AppState};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pixelart-agent")]
#[command(about = "Serve pixel-art and sprite design generation over HTTP")]
struct CliArgs {
    /// Address to bind (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Use mock text and image providers regardless of configuration.
    #[arg(long)]
    mock: bool,
}

impl CliArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.mock {
            config.use_mock = true;
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixelart_agent=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pixelart-agent");

    let args = CliArgs::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    args.apply(&mut config);

    let agent = build_agent(&config).context("Failed to initialize providers")?;
    check_providers(&agent).await;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Starting server");

    axum::serve(listener, router(AppState::new(agent)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = CliArgs::parse_from(["pixelart-agent", "--port", "9000", "--mock"]);
        let mut config = Config {
            use_mock: false,
            ..Config::default()
        };
        args.apply(&mut config);

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.use_mock);
    }

    #[test]
    fn test_cli_rejects_invalid_port() {
        assert!(CliArgs::try_parse_from(["pixelart-agent", "--port", "http"]).is_err());
    }
}
