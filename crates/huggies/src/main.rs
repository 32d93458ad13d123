//! huggies - demo MCP connector for Huggies parenting tools
//!
//! Subcommands:
//! - `huggies serve` - Run the MCP server (default)
//! - `huggies config` - Print the effective configuration as TOML

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use huggiesconf::{ConfigSources, HuggiesConfig};
use skybridge::SessionManager;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use huggies::{app, KnowledgeBase};

mod telemetry;

#[derive(Parser)]
#[command(name = "huggies")]
#[command(about = "Huggies demo MCP connector")]
#[command(version)]
struct Cli {
    /// Config file to load in place of ./huggies.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// HTTP port to bind
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Public base URL for widget links
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding the built widget bundle
    #[arg(long, global = true)]
    assets_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server
    Serve,

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    fn load_config(&self) -> Result<(HuggiesConfig, ConfigSources)> {
        let (mut config, sources) = HuggiesConfig::load_with_sources_from(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(port) = self.port {
            config.bind.port = port;
        }
        if let Some(base_url) = &self.base_url {
            config.widgets.base_url = base_url.clone();
        }
        if let Some(assets_dir) = &self.assets_dir {
            config.widgets.assets_dir = assets_dir.clone();
        }
        Ok((config, sources))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, sources) = cli.load_config()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config => {
            print!("{}", config.to_toml());
        }
        Commands::Serve => {
            telemetry::init(
                &config.telemetry.log_level,
                config.telemetry.otlp_endpoint.as_deref(),
            )?;
            info!(
                files = ?sources.files,
                env_overrides = ?sources.env_overrides,
                "Configuration loaded"
            );
            serve(config).await?;
        }
    }

    Ok(())
}

async fn serve(config: HuggiesConfig) -> Result<()> {
    info!("Huggies MCP server starting");
    info!("   Assets: {}", config.widgets.assets_dir.display());
    info!("   Base URL: {}", config.widgets.base_url);

    let kb = KnowledgeBase::load(config.knowledge.path.as_deref())?;
    let state = app::build_state(&config, kb)?;

    let cancel_token = CancellationToken::new();
    let _cleanup_handle = skybridge::spawn_cleanup_task(
        Arc::clone(state.sessions()),
        Duration::from_secs(config.sessions.cleanup_interval_secs.max(1)),
        Duration::from_secs(config.sessions.idle_timeout_secs),
        cancel_token.clone(),
    );

    let sessions = Arc::clone(state.sessions());
    let app = app::router(state);

    let addr = config.bind.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Huggies ready!");
    info!("   MCP (Streamable): POST http://{}/mcp", addr);
    info!("   MCP (SSE): GET http://{}/mcp/sse + POST http://{}/mcp/message", addr, addr);
    info!("   Assets: GET http://{}/assets/{{filename}}", addr);
    info!("   Health: GET http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sessions, cancel_token))
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT/SIGTERM, then stop the cleanup task and close every
/// session. Open SSE streams end with their session, otherwise graceful
/// shutdown would wait on them forever.
async fn shutdown_signal(sessions: Arc<SessionManager>, cancel_token: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    cancel_token.cancel();
    let closed = sessions.close_all();
    info!(closed, "Sessions closed");
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
