//! Campaign Letters — handwritten-letter campaign composition service.
//!
//! Main entry point that wires the stores, the wizard and the API server.

use campaign_api::ApiServer;
use campaign_core::config::AppConfig;
use campaign_management::ManagementState;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "campaign-letters")]
#[command(about = "Handwritten-letter campaign composition service")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CAMPAIGN_LETTERS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_LETTERS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics exporter port (overrides config)
    #[arg(long, env = "CAMPAIGN_LETTERS__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Handwriting preview delay in milliseconds (overrides config)
    #[arg(long, env = "CAMPAIGN_LETTERS__HANDWRITING__PREVIEW_DELAY_MS")]
    preview_delay_ms: Option<u64>,

    /// Start with empty stores instead of the demo recipients and template
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campaign_letters=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign Letters starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }
    if let Some(delay) = cli.preview_delay_ms {
        config.handwriting.preview_delay_ms = delay;
    }
    if cli.no_seed {
        config.store.seed_demo_data = false;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        preview_timeout_ms = config.wizard.preview_timeout_ms,
        submit_timeout_ms = config.wizard.submit_timeout_ms,
        session_ttl_secs = config.wizard.session_ttl_secs,
        seed_demo_data = config.store.seed_demo_data,
        "Configuration loaded"
    );

    // Stores, session registry and submission orchestrator
    let management = ManagementState::from_config(&config)?;
    let sweep_every = std::time::Duration::from_secs(config.wizard.session_sweep_secs.max(1));
    let sessions = management.sessions.clone();

    let api_server = ApiServer::new(config, management);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Spawn abandoned-session sweep
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sessions.evict_expired();
        }
    });

    info!("Campaign Letters is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
