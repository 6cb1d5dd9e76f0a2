use anyhow::Result;
use clap::Parser;
use mathsolver_gateway::ai::GeminiClient;
use mathsolver_gateway::models::Config;
use mathsolver_gateway::server::GatewayServer;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mathsolver-gateway")]
#[command(about = "Serve math problem solving over HTTP via Gemini")]
struct CliArgs {
    /// Address to bind (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT).
    #[arg(long, value_parser = parse_port_arg)]
    port: Option<u16>,
}

fn parse_port_arg(input: &str) -> std::result::Result<u16, String> {
    input
        .parse::<u16>()
        .map_err(|_| format!("Invalid port '{}'. Expected a number from 0 to 65535", input))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathsolver_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mathsolver-gateway v{}", env!("CARGO_PKG_VERSION"));

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    if config.gemini_api_key.is_none() {
        warn!("Neither GEMINI_API_KEY nor GOOGLE_API_KEY is set; solve endpoints will fail");
    }

    let model = Arc::new(GeminiClient::new(config.gemini_api_key.clone()));
    let server = GatewayServer::new(config, model);

    if let Err(e) = server.run().await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
