//! Server Configuration
//!
//! Configuration is loaded from environment variables with defaults that
//! work for local development. Database errors are logged but do not
//! prevent startup: when no database is reachable the server falls back to
//! the in-memory store.

use std::str::FromStr;
use std::time::Duration;

use sqlx::PgPool;

/// Runtime configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on (`SERVER_PORT`, default 3000)
    pub port: u16,
    /// Maximum message content length in characters
    /// (`COURIER_MAX_CONTENT_CHARS`, default 4096)
    pub max_content_chars: usize,
    /// Per-dispatch send timeout (`COURIER_DISPATCH_TIMEOUT_MS`, default 5000)
    pub dispatch_timeout: Duration,
    /// Per-connection send-queue capacity (`COURIER_CHANNEL_CAPACITY`,
    /// default 256)
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            max_content_chars: 4096,
            dispatch_timeout: Duration::from_millis(5000),
            channel_capacity: 256,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            port: env_or("SERVER_PORT", defaults.port),
            max_content_chars: env_or("COURIER_MAX_CONTENT_CHARS", defaults.max_content_chars),
            dispatch_timeout: Duration::from_millis(env_or(
                "COURIER_DISPATCH_TIMEOUT_MS",
                defaults.dispatch_timeout.as_millis() as u64,
            )),
            channel_capacity: env_or("COURIER_CHANNEL_CAPACITY", defaults.channel_capacity),
        };
        tracing::info!(?config, "configuration loaded");
        config
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(name, value = %value, "unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Load and initialize the database connection pool
///
/// Reads `DATABASE_URL`, connects, and runs migrations. Returns `None` when
/// the variable is unset or the connection fails; the server then runs on
/// the in-memory store.
pub async fn load_database() -> Option<PgPool> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, falling back to in-memory message store");
            return None;
        }
    };

    tracing::info!("connecting to database...");
    let pool = match PgPool::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("failed to create database connection pool: {:?}", e);
            tracing::warn!("falling back to in-memory message store");
            return None;
        }
    };

    tracing::info!("running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("database migrations completed"),
        Err(e) => {
            // Migrations might have already been applied by another replica.
            tracing::error!("failed to run database migrations: {:?}", e);
            tracing::warn!("continuing - database might not be up to date");
        }
    }

    Some(pool)
}

/// Parse the startup token directory from `COURIER_TOKENS`.
///
/// The format is comma-separated `token:identity` pairs, e.g.
/// `t-alice:alice,t-bob:bob`. Malformed pairs are skipped with a warning.
pub fn load_tokens() -> Vec<(String, String)> {
    let raw = match std::env::var("COURIER_TOKENS") {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, ':');
            match (parts.next(), parts.next()) {
                (Some(token), Some(identity)) if !token.is_empty() && !identity.is_empty() => {
                    Some((token.to_string(), identity.to_string()))
                }
                _ => {
                    tracing::warn!(pair, "skipping malformed token entry");
                    None
                }
            }
        })
        .collect()
}
