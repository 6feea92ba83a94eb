use chrono::{DateTime, Utc};
use semval::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ledger::errors::LedgerError;

use super::{
    balances::{Balance, Balances},
    currency::{CurrencyCode, CurrencyCodeInvalidity},
};

pub type AccountId = i64;

/// A named ledger denominated in a single currency, valid between its opening
/// and (optional) closing time.
///
/// An account can only be obtained through [`Account::new()`], so every
/// instance satisfies the name and time range rules.
#[derive(Clone, Debug)]
pub struct Account {
    name: String,
    currency: CurrencyCode,
    opened: DateTime<Utc>,
    closed: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

/// Input data describing an account.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AccountData {
    pub name: String,
    pub currency: String,
    pub opened: DateTime<Utc>,
    #[serde(default)]
    pub closed: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccountInvalidity {
    /// The name is empty or only contains whitespace.
    Name,

    /// The close time is not strictly after the open time.
    CloseTime,

    Currency(CurrencyCodeInvalidity),
}

impl Account {
    /// Construct a new account.
    ///
    /// # Arguments
    /// * `data` - The account's name, currency, open time and optional close
    ///   and deletion times.
    ///
    /// # Returns
    ///
    /// The account, or [`LedgerError::InvalidAccount`] listing every rule the
    /// data broke.
    pub fn new(data: AccountData) -> Result<Self, LedgerError> {
        Self::validated_from(data)
            .map_err(|(_, context)| LedgerError::InvalidAccount(context.into_iter().collect()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn opened(&self) -> DateTime<Utc> {
        self.opened
    }

    pub fn closed(&self) -> Option<DateTime<Utc>> {
        self.closed
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// An account is open if it has no close time.
    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }

    /// Determine if the account's time range contains an instant. Both ends of
    /// the range are inclusive.
    pub fn open_at(&self, instant: DateTime<Utc>) -> bool {
        self.opened <= instant && self.closed.map_or(true, |closed| instant <= closed)
    }

    /// Check that a balance could belong to this account.
    ///
    /// A balance has no currency of its own, so this only checks that the
    /// balance falls within the account's time range.
    pub fn validate_balance(&self, balance: &Balance) -> Result<(), LedgerError> {
        if self.open_at(balance.date()) {
            Ok(())
        } else {
            Err(LedgerError::BalanceOutOfRange {
                date: balance.date(),
                opened: self.opened,
                closed: self.closed,
            })
        }
    }

    /// Check that a currency explicitly attached to a balance matches the
    /// account's currency.
    pub fn validate_currency(&self, currency: &CurrencyCode) -> Result<(), LedgerError> {
        if &self.currency == currency {
            Ok(())
        } else {
            Err(LedgerError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: currency.clone(),
            })
        }
    }
}

/// Accounts are equal when their name, currency and time range match. The
/// deletion time is not compared.
impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.currency == other.currency
            && self.opened == other.opened
            && self.closed == other.closed
    }
}

impl Eq for Account {}

impl Validate for Account {
    type Invalidity = AccountInvalidity;

    fn validate(&self) -> ValidationResult<Self::Invalidity> {
        let closes_too_early = self.closed.map_or(false, |closed| closed <= self.opened);

        ValidationContext::new()
            .invalidate_if(self.name.trim().is_empty(), AccountInvalidity::Name)
            .invalidate_if(closes_too_early, AccountInvalidity::CloseTime)
            .validate_with(&self.currency, AccountInvalidity::Currency)
            .into()
    }
}

impl ValidatedFrom<AccountData> for Account {
    fn validated_from(from: AccountData) -> ValidatedResult<Self> {
        let into = Account {
            name: from.name,
            currency: CurrencyCode::unvalidated(from.currency),
            opened: from.opened,
            closed: from.closed,
            deleted_at: from.deleted_at,
        };

        match into.validate() {
            Ok(()) => Ok(into),
            Err(context) => Err((into, context)),
        }
    }
}

impl From<&Account> for AccountData {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            currency: account.currency.to_string(),
            opened: account.opened,
            closed: account.closed,
            deleted_at: account.deleted_at,
        }
    }
}

/// An account that has been persisted and assigned an ID.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoredAccount {
    pub id: AccountId,
    pub account: Account,
}

impl StoredAccount {
    pub fn new(id: AccountId, account: Account) -> Self {
        Self { id, account }
    }

    /// Check that a new balance may be recorded against this account.
    ///
    /// Deleted accounts accept no new balances. Otherwise the balance must fall
    /// within the account's time range.
    pub fn admit_balance(&self, balance: &Balance) -> Result<(), LedgerError> {
        if self.account.is_deleted() {
            return Err(LedgerError::AccountDeleted(self.id));
        }

        self.account.validate_balance(balance)
    }

    /// Replace the account's details.
    ///
    /// The update is all or nothing. The currency is fixed at creation, and
    /// every existing balance must remain valid under the proposed details.
    ///
    /// # Arguments
    /// * `updates` - The proposed account details. The deletion time is
    ///   ignored; it is carried over from the current state.
    /// * `existing` - All balances currently recorded for the account.
    ///
    /// # Returns
    ///
    /// The updated account with the same ID.
    pub fn update(&self, updates: Account, existing: &Balances) -> Result<Self, LedgerError> {
        if self.account.is_deleted() {
            return Err(LedgerError::AccountDeleted(self.id));
        }

        updates
            .validate()
            .map_err(|context| LedgerError::InvalidAccount(context.into_iter().collect()))?;

        updates.validate_currency(self.account.currency())?;

        let proposed = Account {
            deleted_at: self.account.deleted_at,
            ..updates
        };

        for stored in existing.iter() {
            proposed
                .validate_balance(&stored.balance)
                .map_err(|error| LedgerError::UpdateInvalidatesBalance {
                    balance_id: stored.id,
                    source: Box::new(error),
                })?;
        }

        Ok(Self {
            id: self.id,
            account: proposed,
        })
    }

    /// Soft delete the account.
    ///
    /// Deletion is permanent, so deleting an account a second time fails.
    pub fn mark_deleted(&mut self, at: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.account.is_deleted() {
            return Err(LedgerError::AlreadyDeleted(self.id));
        }

        self.account.deleted_at = Some(at);

        Ok(())
    }
}
