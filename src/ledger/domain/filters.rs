//! Predicates for selecting accounts.

use chrono::{DateTime, Utc};

use super::accounts::{AccountId, StoredAccount};

/// A composable predicate over accounts.
#[derive(Clone, Debug, PartialEq)]
pub enum AccountFilter {
    /// The account had been opened by the instant and was not deleted at or
    /// before it. A closed account still existed after closing.
    Existed(DateTime<Utc>),

    /// The account's time range contains the instant.
    OpenAt(DateTime<Utc>),

    /// The account has one of the listed IDs.
    Ids(Vec<AccountId>),

    /// Every inner filter matches. An empty list matches everything.
    All(Vec<AccountFilter>),

    /// At least one inner filter matches. An empty list matches nothing.
    Any(Vec<AccountFilter>),
}

impl AccountFilter {
    pub fn matches(&self, stored: &StoredAccount) -> bool {
        match self {
            Self::Existed(at) => {
                stored.account.opened() <= *at
                    && stored
                        .account
                        .deleted_at()
                        .map_or(true, |deleted_at| *at < deleted_at)
            }
            Self::OpenAt(at) => stored.account.open_at(*at),
            Self::Ids(ids) => ids.contains(&stored.id),
            Self::All(filters) => filters.iter().all(|filter| filter.matches(stored)),
            Self::Any(filters) => filters.iter().any(|filter| filter.matches(stored)),
        }
    }

    pub fn and(self, other: AccountFilter) -> Self {
        match self {
            Self::All(mut filters) => {
                filters.push(other);
                Self::All(filters)
            }
            first => Self::All(vec![first, other]),
        }
    }

    pub fn or(self, other: AccountFilter) -> Self {
        match self {
            Self::Any(mut filters) => {
                filters.push(other);
                Self::Any(filters)
            }
            first => Self::Any(vec![first, other]),
        }
    }

    /// Select the matching accounts, preserving their order.
    pub fn apply<'a>(&self, accounts: &'a [StoredAccount]) -> Vec<&'a StoredAccount> {
        accounts
            .iter()
            .filter(|stored| self.matches(stored))
            .collect()
    }
}
