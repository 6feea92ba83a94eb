use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{accounts::StoredAccount, balances::StoredBalance};

/// An account together with the balance it held at some instant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountBalance {
    pub account: StoredAccount,
    pub balance: StoredBalance,
}

/// The order to present a collection of account balances in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Ascending account ID.
    #[default]
    Id,

    /// Account name, then ID.
    Name,

    /// Ascending amount, so the largest debts come first.
    Amount,

    /// Ascending absolute amount.
    #[serde(rename = "magnitude")]
    AmountMagnitude,
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown sort key {0:?}, expected one of: id, name, amount, magnitude")]
pub struct UnknownSortKey(pub String);

impl SortKey {
    pub fn compare(&self, a: &AccountBalance, b: &AccountBalance) -> Ordering {
        let by_id = a.account.id.cmp(&b.account.id);

        match self {
            Self::Id => by_id,
            Self::Name => a
                .account
                .account
                .name()
                .cmp(b.account.account.name())
                .then(by_id),
            Self::Amount => a
                .balance
                .balance
                .amount()
                .cmp(&b.balance.balance.amount())
                .then(by_id),
            Self::AmountMagnitude => a
                .balance
                .balance
                .amount()
                .unsigned_abs()
                .cmp(&b.balance.balance.amount().unsigned_abs())
                .then(by_id),
        }
    }

    pub fn sort(&self, balances: &mut [AccountBalance]) {
        balances.sort_by(|a, b| self.compare(a, b));
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Amount => "amount",
            Self::AmountMagnitude => "magnitude",
        }
    }
}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "amount" => Ok(Self::Amount),
            "magnitude" | "amount-magnitude" => Ok(Self::AmountMagnitude),
            _ => Err(UnknownSortKey(s.to_owned())),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
