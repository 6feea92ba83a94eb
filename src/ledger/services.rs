use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::repos::DynAccountRepo;

use super::{
    domain::{
        accounts::{Account, AccountData, AccountId, StoredAccount},
        balances::{Balance, BalanceData, Balances, StoredBalance},
        currency::CurrencyCode,
        filters::AccountFilter,
        reports::{AccountBalance, SortKey},
    },
    errors::LedgerError,
};

/// A service object providing the account and balance operations.
#[derive(Clone)]
pub struct LedgerService {
    account_repo: DynAccountRepo,
}

impl LedgerService {
    pub fn new(account_repo: DynAccountRepo) -> Self {
        Self { account_repo }
    }

    pub async fn available(&self) -> bool {
        self.account_repo.available().await
    }

    pub async fn close(&self) -> Result<(), LedgerError> {
        self.account_repo.close().await
    }

    /// Validate and persist a new account.
    pub async fn create_account(&self, data: AccountData) -> Result<StoredAccount, LedgerError> {
        let account = Account::new(data)?;

        self.account_repo.insert_account(account).await
    }

    pub async fn get_account(&self, id: AccountId) -> Result<StoredAccount, LedgerError> {
        self.account_repo.select_account(id).await
    }

    /// List accounts in ascending ID order.
    ///
    /// # Arguments
    ///
    /// * `filter` - If provided, only accounts matching the filter are
    ///   returned.
    pub async fn list_accounts(
        &self,
        filter: Option<&AccountFilter>,
    ) -> Result<Vec<StoredAccount>, LedgerError> {
        let accounts = self.account_repo.select_accounts().await?;

        Ok(match filter {
            Some(filter) => filter.apply(&accounts).into_iter().cloned().collect(),
            None => accounts,
        })
    }

    /// Replace the details of an existing account.
    ///
    /// The update is rejected as a whole if any balance already recorded for
    /// the account would become invalid.
    pub async fn update_account(
        &self,
        id: AccountId,
        data: AccountData,
    ) -> Result<StoredAccount, LedgerError> {
        let updates = Account::new(data)?;
        let original = self.account_repo.select_account(id).await?;

        self.account_repo.update_account(&original, updates).await
    }

    pub async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        self.account_repo.delete_account(id).await
    }

    /// Record a new balance against an account.
    ///
    /// # Arguments
    ///
    /// * `account_id` - The account to record the balance against.
    /// * `data` - The balance. If it names a currency, that currency must match
    ///   the account's.
    pub async fn insert_balance(
        &self,
        account_id: AccountId,
        data: BalanceData,
    ) -> Result<StoredBalance, LedgerError> {
        let account = self.account_repo.select_account(account_id).await?;

        let balance = Balance::from(&data);
        account.admit_balance(&balance)?;

        if let Some(code) = data.currency.as_deref() {
            account.account.validate_currency(&CurrencyCode::new(code)?)?;
        }

        self.account_repo.insert_balance(&account, balance).await
    }

    /// Get an account along with its balances in chronological order.
    pub async fn account_balances(
        &self,
        account_id: AccountId,
    ) -> Result<(StoredAccount, Balances), LedgerError> {
        let account = self.account_repo.select_account(account_id).await?;
        let balances = self.account_repo.select_account_balances(&account).await?;

        Ok((account, balances))
    }

    /// Find the balance an account held at an instant.
    pub async fn balance_at(
        &self,
        account_id: AccountId,
        at: DateTime<Utc>,
    ) -> Result<(StoredAccount, StoredBalance), LedgerError> {
        let (account, balances) = self.account_balances(account_id).await?;
        let balance = *balances.at(at)?;

        Ok((account, balance))
    }

    /// Report the balance of every account open at an instant.
    ///
    /// Deleted accounts and accounts with no balance recorded at or before the
    /// instant are left out of the report.
    pub async fn balances_at(
        &self,
        at: DateTime<Utc>,
        sort: SortKey,
    ) -> Result<Vec<AccountBalance>, LedgerError> {
        let filter = AccountFilter::Existed(at).and(AccountFilter::OpenAt(at));
        let accounts = self.list_accounts(Some(&filter)).await?;

        let mut report = Vec::with_capacity(accounts.len());
        for account in accounts {
            let balances = self.account_repo.select_account_balances(&account).await?;

            match balances.at(at) {
                Ok(balance) => {
                    let balance = *balance;
                    report.push(AccountBalance { account, balance });
                }
                Err(LedgerError::NoBalances { .. }) => {
                    debug!(account_id = account.id, %at, "Account has no balance to report.");
                }
                Err(error) => return Err(error),
            }
        }

        sort.sort(&mut report);

        info!(%at, %sort, accounts = report.len(), "Generated balance report.");

        Ok(report)
    }
}
