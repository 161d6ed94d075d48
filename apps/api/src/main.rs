mod catalog;
mod cli;
mod config;
mod db;
mod documents;
mod errors;
mod evaluation;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;
mod store;

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Command, ServeArgs};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matching::orchestrator::Orchestrator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting screener v{}", env!("CARGO_PKG_VERSION"));

    match cli.cmd {
        Command::Serve(args) => serve(config, args).await,
        Command::Score(args) => cli::run_score(&config, args).await,
        Command::Evaluate(args) => cli::run_evaluate(&config, args).await,
    }
}

async fn serve(config: Config, args: ServeArgs) -> Result<()> {
    let ctx = Arc::new(config.run_context()?);
    info!(
        "Run context: {} categories, bounds [{}, {}], {} concurrent requests",
        ctx.weighting.categories().count(),
        ctx.bounds.min,
        ctx.bounds.max,
        ctx.concurrency_limit
    );

    // Initialize PostgreSQL
    let db = create_pool(config.require_database_url()?).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.require_api_key()?.to_string())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let port = args.port.unwrap_or(config.port);
    let state = AppState {
        db,
        orchestrator: Orchestrator::new(Arc::new(llm), ctx),
        config,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
