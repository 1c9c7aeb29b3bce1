mod api;
mod background;
mod router;
mod startup;
mod state;
mod status;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::state::AppState;

// ── CLI ─────────────────────────────────────────────────────────────

/// apiloom: public API catalog, flows and execution over HTTP.
#[derive(Parser, Debug)]
#[command(name = "apiloom-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve {
        /// Skip the startup ingest; the catalog stays empty until POST /init.
        #[arg(long, env = "APILOOM_LAZY_INIT", default_value_t = false)]
        lazy: bool,
    },
    /// Run a full ingest of every source and print the results.
    Ingest,
    /// Bootstrap the catalog and print the generated flows.
    Flows,
}

fn load_config() -> apiloom_core::Config {
    apiloom_core::config::load_dotenv();
    apiloom_core::Config::from_env()
}

async fn serve(state: Arc<AppState>, lazy: bool) -> anyhow::Result<()> {
    if !lazy {
        startup::initialize(&state).await;
    }
    background::spawn_refresh_loop(state.clone());

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = router::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr} (docs at /docs)");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn ingest(state: &AppState) -> anyhow::Result<()> {
    let results = state.ingestor.ingest_all().await;
    for result in &results {
        info!(
            source = %result.source_id,
            success = result.success,
            found = result.apis_found,
            added = result.apis_added,
            updated = result.apis_updated,
            skipped = result.apis_skipped,
            "ingest result"
        );
        for error in &result.errors {
            tracing::warn!(source = %result.source_id, "{error}");
        }
    }
    println!("{}", serde_json::to_string_pretty(&results)?);
    println!("{}", serde_json::to_string_pretty(&state.store.get_stats())?);
    Ok(())
}

async fn flows(state: &AppState) -> anyhow::Result<()> {
    startup::initialize(state).await;
    let flows = state.store.get_all_flows();
    if flows.is_empty() {
        anyhow::bail!("no flow template resolved against the catalog");
    }
    for flow in &flows {
        if let Some(text) = state.composer.describe_flow(&flow.id) {
            println!("{text}\n");
        }
    }
    Ok(())
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config();
    config.log_summary();

    let state = Arc::new(AppState::from_config(config)?);

    match cli.command.unwrap_or(Command::Serve { lazy: false }) {
        Command::Serve { lazy } => serve(state, lazy).await,
        Command::Ingest => ingest(&state).await,
        Command::Flows => flows(&state).await,
    }
}
