//! Postgres pool for the scan history store.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use batik_core::{defaults, Error, Result};

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(defaults::DB_ACQUIRE_TIMEOUT_SECS))
        .idle_timeout(Duration::from_secs(defaults::DB_IDLE_TIMEOUT_SECS))
}

/// Open a pool of at most `max_connections` against `database_url`.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    if max_connections == 0 {
        return Err(Error::Config(
            "pool needs at least one connection".to_string(),
        ));
    }

    let start = Instant::now();
    let pool = pool_options(max_connections)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections,
        duration_ms = start.elapsed().as_millis() as u64,
        "Scan history pool ready"
    );
    Ok(pool)
}

/// Log pool occupancy; warns once every connection is checked out.
pub fn log_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;

    debug!(
        subsystem = "db",
        component = "pool",
        op = "metrics",
        pool_size = size,
        pool_idle = idle,
        "Pool occupancy"
    );

    if size > 0 && idle == 0 {
        warn!(
            subsystem = "db",
            component = "pool",
            pool_size = size,
            "All scan history connections in use"
        );
    }
}
