//! Errors produced by ledger operations.
//!
//! Every failure is a [`LedgerError`], and every [`LedgerError`] belongs to
//! exactly one [`ErrorKind`]. Transports translate kinds into their own status
//! codes without inspecting the error any further.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::{
    accounts::{AccountId, AccountInvalidity},
    balances::BalanceId,
    currency::{CurrencyCode, CurrencyCodeInvalidity},
};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The account data broke one or more construction rules.
    #[error("invalid account: {0:?}")]
    InvalidAccount(Vec<AccountInvalidity>),

    /// A standalone currency code was malformed.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrencyCode(Vec<CurrencyCodeInvalidity>),

    #[error("balance dated {date} is outside the account's open range starting {opened}")]
    BalanceOutOfRange {
        date: DateTime<Utc>,
        opened: DateTime<Utc>,
        closed: Option<DateTime<Utc>>,
    },

    #[error("balance currency {found} does not match the account currency {expected}")]
    CurrencyMismatch {
        expected: CurrencyCode,
        found: CurrencyCode,
    },

    /// Applying an update would leave an existing balance invalid. The source
    /// is the validation failure of that balance under the proposed account.
    #[error("update would invalidate balance {balance_id}")]
    UpdateInvalidatesBalance {
        balance_id: BalanceId,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("account {0} has been deleted")]
    AccountDeleted(AccountId),

    #[error("account {0} has already been deleted")]
    AlreadyDeleted(AccountId),

    #[error("account {0} not found")]
    NotFound(AccountId),

    #[error("no balance recorded at or before {at}")]
    NoBalances { at: DateTime<Utc> },

    #[error("storage is unavailable")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// The closed set of error kinds a caller may need to distinguish.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidName,
    InvalidCloseTime,
    InvalidCodeLength,
    BalanceOutOfRange,
    CurrencyMismatch,
    UpdateInvalidatesBalance,
    AccountDeleted,
    AlreadyDeleted,
    NotFound,
    NoBalances,
    StorageUnavailable,
    StorageError,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAccount(invalidities) => invalidities
                .first()
                .map(AccountInvalidity::kind)
                .unwrap_or(ErrorKind::InvalidName),
            Self::InvalidCurrencyCode(_) => ErrorKind::InvalidCodeLength,
            Self::BalanceOutOfRange { .. } => ErrorKind::BalanceOutOfRange,
            Self::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
            Self::UpdateInvalidatesBalance { .. } => ErrorKind::UpdateInvalidatesBalance,
            Self::AccountDeleted(_) => ErrorKind::AccountDeleted,
            Self::AlreadyDeleted(_) => ErrorKind::AlreadyDeleted,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoBalances { .. } => ErrorKind::NoBalances,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::Storage(_) => ErrorKind::StorageError,
        }
    }
}

impl AccountInvalidity {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Name => ErrorKind::InvalidName,
            Self::CloseTime => ErrorKind::InvalidCloseTime,
            Self::Currency(_) => ErrorKind::InvalidCodeLength,
        }
    }
}
