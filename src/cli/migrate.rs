use anyhow::Context;
use sqlx::PgPool;
use tracing::info;

use crate::database::{DatabaseOptions, PostgresConnection};

pub struct MigrationOpts {
    pub database: DatabaseOptions,
}

/// Apply every migration embedded from `migrations-sqlx` that has not been
/// applied yet.
pub async fn run_migrations(opts: MigrationOpts) -> anyhow::Result<()> {
    let connection = PostgresConnection::connect(&opts.database).await?;

    sqlx::migrate!("./migrations-sqlx")
        .run(&*connection)
        .await
        .context("Failed to run database migrations.")?;

    info!("Database migrations are up to date.");

    PgPool::close(&connection).await;

    Ok(())
}
