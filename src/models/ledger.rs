use std::convert::TryFrom;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::ledger::domain;

/// An account row.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub opened: DateTime<Utc>,
    pub closed: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A balance row.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Balance {
    pub id: i64,
    pub account_id: i64,
    pub date: DateTime<Utc>,
    pub amount: i64,
}

impl TryFrom<Account> for domain::accounts::StoredAccount {
    type Error = anyhow::Error;

    fn try_from(model: Account) -> Result<Self, Self::Error> {
        let id = model.id;

        // Rows go through the same validation as any other input.
        let account = domain::accounts::Account::new(domain::accounts::AccountData {
            name: model.name,
            currency: model.currency,
            opened: model.opened,
            closed: model.closed,
            deleted_at: model.deleted_at,
        })
        .with_context(|| format!("Account row {} is invalid.", id))?;

        Ok(Self::new(id, account))
    }
}

impl From<Balance> for domain::balances::StoredBalance {
    fn from(model: Balance) -> Self {
        Self::new(
            model.id,
            domain::balances::Balance::new(model.date, model.amount),
        )
    }
}
