use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::errors::LedgerError;

pub type BalanceId = i64;

/// An amount that an account held at a specific instant.
///
/// The amount is an integer number of the account currency's minor units, for
/// example pence for `GBP`. A balance has no currency of its own; it is only
/// meaningful alongside the account it belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Balance {
    date: DateTime<Utc>,
    amount: i64,
}

/// Input data for recording a new balance.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BalanceData {
    pub date: DateTime<Utc>,
    pub amount: i64,

    /// An optional currency code. If provided, it must match the currency of
    /// the account the balance is recorded against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl Balance {
    pub fn new(date: DateTime<Utc>, amount: i64) -> Self {
        Self { date, amount }
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

impl From<&BalanceData> for Balance {
    fn from(data: &BalanceData) -> Self {
        Self::new(data.date, data.amount)
    }
}

/// A balance that has been persisted and assigned an ID.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StoredBalance {
    pub id: BalanceId,
    pub balance: Balance,
}

impl StoredBalance {
    pub fn new(id: BalanceId, balance: Balance) -> Self {
        Self { id, balance }
    }

    fn sort_key(&self) -> (DateTime<Utc>, BalanceId) {
        (self.balance.date, self.id)
    }
}

/// The balances recorded for a single account.
///
/// The collection is always kept in chronological order, with balances on the
/// same date ordered by ascending ID.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Balances(Vec<StoredBalance>);

impl Balances {
    pub fn new(balances: Vec<StoredBalance>) -> Self {
        let mut collection = Self(balances);
        collection.sort();

        collection
    }

    /// Put the balances into chronological order, breaking ties by ID.
    pub fn sort(&mut self) {
        self.0.sort_by_key(StoredBalance::sort_key);
    }

    /// Find the balance that applied at an instant.
    ///
    /// A balance is assumed to hold until a later one replaces it, so the
    /// result is the most recent balance dated at or before `at`. If several
    /// balances share that date, the one with the highest ID wins.
    ///
    /// # Returns
    ///
    /// [`LedgerError::NoBalances`] if there are no balances, or if all of them
    /// are dated after `at`.
    pub fn at(&self, at: DateTime<Utc>) -> Result<&StoredBalance, LedgerError> {
        let applicable = self.0.partition_point(|stored| stored.balance.date <= at);

        applicable
            .checked_sub(1)
            .and_then(|index| self.0.get(index))
            .ok_or(LedgerError::NoBalances { at })
    }

    /// The most recently dated balance.
    pub fn latest(&self) -> Option<&StoredBalance> {
        self.0.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredBalance> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<StoredBalance> for Balances {
    fn from_iter<I: IntoIterator<Item = StoredBalance>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for Balances {
    type Item = StoredBalance;
    type IntoIter = std::vec::IntoIter<StoredBalance>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
