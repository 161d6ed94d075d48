use std::str::FromStr;

use anyhow::{Context, Result};

use crate::catalog::{CategoryWeighting, RunContext, ScoreBounds};

/// Application configuration loaded from environment variables.
/// Secrets are optional at load time and required by the commands that use them.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub score_min: f64,
    pub score_max: f64,
    pub max_concurrent_requests: usize,
    /// `category=weight,...`; `None` uses the built-in weighting.
    pub category_weights: Option<String>,
    /// Candidates every human screener ranks per job.
    pub panel_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Config {
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|v| !v.is_empty()),
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            score_min: parse_or(&lookup, "SCORE_MIN", 0.0)?,
            score_max: parse_or(&lookup, "SCORE_MAX", 100.0)?,
            max_concurrent_requests: parse_or(&lookup, "MAX_CONCURRENT_REQUESTS", 16)?,
            category_weights: lookup("CATEGORY_WEIGHTS").filter(|v| !v.trim().is_empty()),
            panel_size: parse_or(&lookup, "PANEL_SIZE", 8)?,
        })
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.anthropic_api_key
            .as_deref()
            .context("Required environment variable 'ANTHROPIC_API_KEY' is not set")
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("Required environment variable 'DATABASE_URL' is not set")
    }

    /// Builds the read-only context shared by every scoring call of a run.
    pub fn run_context(&self) -> Result<RunContext> {
        let weighting = match &self.category_weights {
            Some(spec) => CategoryWeighting::parse(spec).context("Invalid CATEGORY_WEIGHTS")?,
            None => CategoryWeighting::default(),
        };
        let bounds = ScoreBounds::new(self.score_min, self.score_max)
            .context("Invalid SCORE_MIN / SCORE_MAX")?;
        if self.max_concurrent_requests == 0 {
            anyhow::bail!("MAX_CONCURRENT_REQUESTS must be at least 1");
        }
        Ok(RunContext::new(
            weighting,
            bounds,
            self.max_concurrent_requests,
        ))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
