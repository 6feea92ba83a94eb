use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;

use crate::ledger::{
    domain::{
        accounts::{Account, AccountId, StoredAccount},
        balances::{Balance, Balances, StoredBalance},
    },
    errors::LedgerError,
};

use super::AccountRepo;

/// An account repository held in memory.
///
/// Every operation runs under a single lock, which gives the same all or
/// nothing behaviour as the database transactions.
#[derive(Default)]
pub struct MemoryRepo {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, StoredAccount>,
    balances: Vec<(AccountId, StoredBalance)>,
    last_account_id: AccountId,
    last_balance_id: i64,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::StorageUnavailable(anyhow!(
                "memory repository is offline"
            )));
        }

        self.state
            .lock()
            .map_err(|_| LedgerError::Storage(anyhow!("memory repository lock poisoned")))
    }
}

impl MemoryState {
    fn account(&self, id: AccountId) -> Result<&StoredAccount, LedgerError> {
        self.accounts.get(&id).ok_or(LedgerError::NotFound(id))
    }

    fn balances(&self, id: AccountId) -> Balances {
        self.balances
            .iter()
            .filter(|(account_id, _)| *account_id == id)
            .map(|(_, balance)| *balance)
            .collect()
    }
}

#[async_trait]
impl AccountRepo for MemoryRepo {
    async fn available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn insert_account(&self, account: Account) -> Result<StoredAccount, LedgerError> {
        let mut state = self.lock()?;

        state.last_account_id += 1;
        let stored = StoredAccount::new(state.last_account_id, account);
        state.accounts.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn select_account(&self, id: AccountId) -> Result<StoredAccount, LedgerError> {
        self.lock()?.account(id).cloned()
    }

    async fn select_accounts(&self) -> Result<Vec<StoredAccount>, LedgerError> {
        Ok(self.lock()?.accounts.values().cloned().collect())
    }

    async fn update_account(
        &self,
        original: &StoredAccount,
        updates: Account,
    ) -> Result<StoredAccount, LedgerError> {
        let mut state = self.lock()?;

        let balances = state.balances(original.id);
        let updated = state.account(original.id)?.update(updates, &balances)?;
        state.accounts.insert(updated.id, updated.clone());

        Ok(updated)
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut state = self.lock()?;

        let mut account = state.account(id)?.clone();
        account.mark_deleted(Utc::now())?;
        state.accounts.insert(id, account);

        Ok(())
    }

    async fn insert_balance(
        &self,
        account: &StoredAccount,
        balance: Balance,
    ) -> Result<StoredBalance, LedgerError> {
        let mut state = self.lock()?;

        state.account(account.id)?.admit_balance(&balance)?;

        state.last_balance_id += 1;
        let stored = StoredBalance::new(state.last_balance_id, balance);
        state.balances.push((account.id, stored));

        Ok(stored)
    }

    async fn select_account_balances(
        &self,
        account: &StoredAccount,
    ) -> Result<Balances, LedgerError> {
        let state = self.lock()?;

        state.account(account.id)?;

        Ok(state.balances(account.id))
    }
}
