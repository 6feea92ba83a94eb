use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::domain::{
    self,
    accounts::AccountId,
    balances::{BalanceId, Balances},
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ResourceCollection<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ResourceCollection<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub currency: String,
    pub opened: DateTime<Utc>,
    pub closed: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&domain::accounts::StoredAccount> for Account {
    fn from(stored: &domain::accounts::StoredAccount) -> Self {
        let account = &stored.account;

        Self {
            id: stored.id,
            name: account.name().to_owned(),
            currency: account.currency().to_string(),
            opened: account.opened(),
            closed: account.closed(),
            deleted_at: account.deleted_at(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Balance {
    pub id: BalanceId,
    pub date: DateTime<Utc>,
    pub amount: i64,
}

impl From<&domain::balances::StoredBalance> for Balance {
    fn from(stored: &domain::balances::StoredBalance) -> Self {
        Self {
            id: stored.id,
            date: stored.balance.date(),
            amount: stored.balance.amount(),
        }
    }
}

/// An account along with one or more of its balances.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountBalances {
    pub account: Account,
    pub balances: Vec<Balance>,
}

impl From<(&domain::accounts::StoredAccount, &Balances)> for AccountBalances {
    fn from((account, balances): (&domain::accounts::StoredAccount, &Balances)) -> Self {
        Self {
            account: account.into(),
            balances: balances.iter().map(Balance::from).collect(),
        }
    }
}

/// An account with the balance it held at a single instant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AccountBalance {
    pub account: Account,
    pub balance: Balance,
}

impl From<&domain::reports::AccountBalance> for AccountBalance {
    fn from(row: &domain::reports::AccountBalance) -> Self {
        Self {
            account: (&row.account).into(),
            balance: (&row.balance).into(),
        }
    }
}

/// A report of account balances at an instant, in the requested order.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BalanceReport {
    pub at: DateTime<Utc>,
    pub sort: domain::reports::SortKey,
    pub items: Vec<AccountBalance>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Health {
    pub available: bool,
}
