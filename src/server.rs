use std::{net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    cors::cors_layer,
    database::{DatabaseOptions, PostgresConnection},
    ledger::services::LedgerService,
    repos::DynAccountRepo,
};

pub struct Options {
    pub database: DatabaseOptions,
    pub bind_address: SocketAddr,
}

#[derive(Clone)]
pub struct AppState {
    ledger_service: LedgerService,
}

impl AppState {
    pub fn new(ledger_service: LedgerService) -> Self {
        Self { ledger_service }
    }
}

impl FromRef<AppState> for LedgerService {
    fn from_ref(state: &AppState) -> Self {
        state.ledger_service.clone()
    }
}

/// Build the application router with its middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(crate::ledger::http::routes())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(opts: Options) -> anyhow::Result<()> {
    let db_connection = PostgresConnection::connect(&opts.database).await?;

    let account_repo: DynAccountRepo = Arc::new(db_connection);

    let ledger_service = LedgerService::new(account_repo);

    let app = app(AppState::new(ledger_service.clone()));

    info!(address = %opts.bind_address, "Starting server.");

    axum::Server::bind(&opts.bind_address)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ledger_service.close().await?;

    info!("Server stopped.");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal."),
        Err(error) => {
            error!(?error, "Failed to listen for shutdown signal.");

            std::future::pending::<()>().await;
        }
    }
}
