use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::ledger::errors::{ErrorKind, LedgerError};

/// Map an error kind to the status code it is reported with.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidName
        | ErrorKind::InvalidCloseTime
        | ErrorKind::InvalidCodeLength
        | ErrorKind::BalanceOutOfRange
        | ErrorKind::CurrencyMismatch
        | ErrorKind::UpdateInvalidatesBalance => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound | ErrorKind::NoBalances => StatusCode::NOT_FOUND,
        ErrorKind::AccountDeleted | ErrorKind::AlreadyDeleted => StatusCode::CONFLICT,
        ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub enum ApiError {
    /// A request that could not be parsed into a ledger operation.
    BadRequestReason(String),
    Ledger(LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequestReason(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorRep {
                    message,
                    kind: None,
                }),
            )
                .into_response(),
            Self::Ledger(error) => {
                let kind = error.kind();
                let status = status_for(kind);

                // Storage details stay in the logs.
                let message = if status.is_server_error() {
                    error!(?error, ?kind, "Request failed with a server error.");

                    match kind {
                        ErrorKind::StorageUnavailable => "Storage is unavailable.".to_owned(),
                        _ => "Internal server error.".to_owned(),
                    }
                } else {
                    error.to_string()
                };

                (
                    status,
                    Json(ErrorRep {
                        message,
                        kind: Some(kind),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(error: LedgerError) -> Self {
        Self::Ledger(error)
    }
}

pub type ApiResponse<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorRep {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}
