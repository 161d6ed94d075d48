use sqlx::PgPool;

use crate::config::Config;
use crate::matching::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Owns the bounded answer-engine pool; every request shares it.
    pub orchestrator: Orchestrator,
    pub config: Config,
}
