use std::{ops::Deref, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

/// Settings for connecting to the application database.
#[derive(Clone, Debug)]
pub struct DatabaseOptions {
    pub url: String,
    pub pool_size: u32,
    pub timeout_seconds: u8,
}

#[derive(Clone)]
pub struct PostgresConnection(PgPool);

impl PostgresConnection {
    /// Open a connection pool using the provided options.
    pub async fn connect(opts: &DatabaseOptions) -> anyhow::Result<Self> {
        debug!(
            pool_size = opts.pool_size,
            timeout_seconds = opts.timeout_seconds,
            "Connecting to database."
        );

        let pool = PgPoolOptions::new()
            .max_connections(opts.pool_size)
            .acquire_timeout(Duration::from_secs(opts.timeout_seconds.into()))
            .connect(&opts.url)
            .await?;

        Ok(Self(pool))
    }
}

impl Deref for PostgresConnection {
    type Target = PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
