use std::{convert::TryFrom, fmt::Display, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, trace};

use crate::{
    database::PostgresConnection,
    ledger::{
        domain::{
            accounts::{Account, AccountId, StoredAccount},
            balances::{Balance, Balances, StoredBalance},
        },
        errors::LedgerError,
    },
    models,
};

pub type DynAccountRepo = Arc<dyn AccountRepo + Send + Sync>;

/// Persistence for accounts and their balances.
///
/// Implementations are responsible for serializing concurrent writes to the
/// same account. Operations that depend on existing state (updates, deletions
/// and new balances) must run their domain checks against the state they
/// write on top of.
#[async_trait]
pub trait AccountRepo {
    /// Determine if the storage backend can currently serve requests.
    async fn available(&self) -> bool;

    /// Release any resources held by the repository.
    async fn close(&self) -> Result<(), LedgerError>;

    /// Persist a new account.
    ///
    /// # Returns
    ///
    /// The account along with its newly assigned ID.
    async fn insert_account(&self, account: Account) -> Result<StoredAccount, LedgerError>;

    /// Get a single account by its ID, whether or not it has been deleted.
    ///
    /// # Returns
    ///
    /// [`LedgerError::NotFound`] if no account has the provided ID.
    async fn select_account(&self, id: AccountId) -> Result<StoredAccount, LedgerError>;

    /// List every account, including deleted ones, in ascending ID order.
    async fn select_accounts(&self) -> Result<Vec<StoredAccount>, LedgerError>;

    /// Replace an account's details.
    ///
    /// The update is only applied if every balance recorded for the account
    /// remains valid. Otherwise nothing is changed.
    ///
    /// # Arguments
    ///
    /// * `original` - The account being updated.
    /// * `updates` - The proposed details.
    async fn update_account(
        &self,
        original: &StoredAccount,
        updates: Account,
    ) -> Result<StoredAccount, LedgerError>;

    /// Soft delete an account by recording the current time as its deletion
    /// time.
    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError>;

    /// Record a new balance against an account.
    ///
    /// # Returns
    ///
    /// The balance along with its newly assigned ID.
    async fn insert_balance(
        &self,
        account: &StoredAccount,
        balance: Balance,
    ) -> Result<StoredBalance, LedgerError>;

    /// Get every balance recorded against an account in chronological order.
    async fn select_account_balances(
        &self,
        account: &StoredAccount,
    ) -> Result<Balances, LedgerError>;
}

/// Build a mapper from a database error to a ledger error, attaching a
/// description of the failed operation.
///
/// Failures to reach the database are reported as
/// [`LedgerError::StorageUnavailable`]; everything else is a generic storage
/// error.
fn storage_error<C>(context: C) -> impl FnOnce(sqlx::Error) -> LedgerError
where
    C: Display + Send + Sync + 'static,
{
    move |error| {
        let unavailable = matches!(
            error,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        );
        let error = anyhow::Error::from(error).context(context);

        if unavailable {
            LedgerError::StorageUnavailable(error)
        } else {
            LedgerError::Storage(error)
        }
    }
}

impl PostgresConnection {
    /// Fetch and lock an account row for the rest of a transaction.
    ///
    /// # Arguments
    ///
    /// * `tx` - The transaction to lock the row in.
    /// * `id` - The account's ID.
    /// * `lock` - Either `FOR UPDATE` or `FOR SHARE`.
    async fn lock_account(
        tx: &mut Transaction<'_, Postgres>,
        id: AccountId,
        lock: &str,
    ) -> Result<StoredAccount, LedgerError> {
        let query = format!(
            r#"
            SELECT id, name, currency, opened, closed, deleted_at
            FROM account
            WHERE id = $1
            {}
            "#,
            lock
        );

        let model = sqlx::query_as::<_, models::ledger::Account>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error(format!("Failed to lock account {}.", id)))?
            .ok_or(LedgerError::NotFound(id))?;

        Ok(StoredAccount::try_from(model)?)
    }

    async fn fetch_balances(
        tx: &mut Transaction<'_, Postgres>,
        id: AccountId,
    ) -> Result<Balances, LedgerError> {
        let balances = sqlx::query_as::<_, models::ledger::Balance>(
            r#"
            SELECT id, account_id, "date", amount
            FROM balance
            WHERE account_id = $1
            ORDER BY "date", id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(storage_error(format!(
            "Failed to fetch balances for account {}.",
            id
        )))?;

        Ok(balances.into_iter().map(StoredBalance::from).collect())
    }
}

#[async_trait]
impl AccountRepo for PostgresConnection {
    async fn available(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&**self).await {
            Ok(_) => true,
            Err(error) => {
                debug!(?error, "Database is unavailable.");

                false
            }
        }
    }

    async fn close(&self) -> Result<(), LedgerError> {
        PgPool::close(self).await;

        info!("Closed database connection pool.");

        Ok(())
    }

    async fn insert_account(&self, account: Account) -> Result<StoredAccount, LedgerError> {
        let model = sqlx::query_as::<_, models::ledger::Account>(
            r#"
            INSERT INTO account (name, currency, opened, closed, deleted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, currency, opened, closed, deleted_at
            "#,
        )
        .bind(account.name())
        .bind(account.currency().as_str())
        .bind(account.opened())
        .bind(account.closed())
        .bind(account.deleted_at())
        .fetch_one(&**self)
        .await
        .map_err(storage_error("Failed to insert account."))?;

        let stored = StoredAccount::try_from(model)?;

        info!(id = stored.id, name = %stored.account.name(), "Persisted new account.");

        Ok(stored)
    }

    async fn select_account(&self, id: AccountId) -> Result<StoredAccount, LedgerError> {
        trace!(id, "Querying for account by ID.");

        let model = sqlx::query_as::<_, models::ledger::Account>(
            r#"
            SELECT id, name, currency, opened, closed, deleted_at
            FROM account
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&**self)
        .await
        .map_err(storage_error(format!("Failed to select account {}.", id)))?;

        match model {
            Some(model) => Ok(StoredAccount::try_from(model)?),
            None => {
                debug!(id, "Account does not exist.");

                Err(LedgerError::NotFound(id))
            }
        }
    }

    async fn select_accounts(&self) -> Result<Vec<StoredAccount>, LedgerError> {
        let models = sqlx::query_as::<_, models::ledger::Account>(
            r#"
            SELECT id, name, currency, opened, closed, deleted_at
            FROM account
            ORDER BY id
            "#,
        )
        .fetch_all(&**self)
        .await
        .map_err(storage_error("Failed to select accounts."))?;

        Ok(models
            .into_iter()
            .map(StoredAccount::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn update_account(
        &self,
        original: &StoredAccount,
        updates: Account,
    ) -> Result<StoredAccount, LedgerError> {
        let id = original.id;
        let mut tx = self
            .begin()
            .await
            .map_err(storage_error("Failed to begin account update."))?;

        // Validate against the locked row rather than the caller's copy, which
        // may be stale.
        let current = Self::lock_account(&mut tx, id, "FOR UPDATE").await?;
        let balances = Self::fetch_balances(&mut tx, id).await?;
        let updated = current.update(updates, &balances)?;

        sqlx::query(
            r#"
            UPDATE account
            SET
                name = $2,
                currency = $3,
                opened = $4,
                closed = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(updated.account.name())
        .bind(updated.account.currency().as_str())
        .bind(updated.account.opened())
        .bind(updated.account.closed())
        .execute(&mut tx)
        .await
        .map_err(storage_error(format!("Failed to update account {}.", id)))?;

        tx.commit()
            .await
            .map_err(storage_error(format!("Failed to commit update of account {}.", id)))?;

        info!(id, balances = balances.len(), "Updated account.");

        Ok(updated)
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), LedgerError> {
        let mut tx = self
            .begin()
            .await
            .map_err(storage_error("Failed to begin account deletion."))?;

        let mut account = Self::lock_account(&mut tx, id, "FOR UPDATE").await?;
        account.mark_deleted(Utc::now())?;

        sqlx::query(
            r#"
            UPDATE account
            SET deleted_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(account.account.deleted_at())
        .execute(&mut tx)
        .await
        .map_err(storage_error(format!("Failed to delete account {}.", id)))?;

        tx.commit()
            .await
            .map_err(storage_error(format!("Failed to commit deletion of account {}.", id)))?;

        info!(id, "Deleted account.");

        Ok(())
    }

    async fn insert_balance(
        &self,
        account: &StoredAccount,
        balance: Balance,
    ) -> Result<StoredBalance, LedgerError> {
        let id = account.id;
        let mut tx = self
            .begin()
            .await
            .map_err(storage_error("Failed to begin balance insertion."))?;

        // A share lock keeps the account from being updated or deleted until
        // the balance is committed.
        let current = Self::lock_account(&mut tx, id, "FOR SHARE").await?;
        current.admit_balance(&balance)?;

        let model = sqlx::query_as::<_, models::ledger::Balance>(
            r#"
            INSERT INTO balance (account_id, "date", amount)
            VALUES ($1, $2, $3)
            RETURNING id, account_id, "date", amount
            "#,
        )
        .bind(id)
        .bind(balance.date())
        .bind(balance.amount())
        .fetch_one(&mut tx)
        .await
        .map_err(storage_error(format!(
            "Failed to insert balance for account {}.",
            id
        )))?;

        tx.commit().await.map_err(storage_error(format!(
            "Failed to commit balance for account {}.",
            id
        )))?;

        info!(account_id = id, id = model.id, "Persisted new balance.");

        Ok(model.into())
    }

    async fn select_account_balances(
        &self,
        account: &StoredAccount,
    ) -> Result<Balances, LedgerError> {
        trace!(account_id = account.id, "Querying for account balances.");

        let models = sqlx::query_as::<_, models::ledger::Balance>(
            r#"
            SELECT id, account_id, "date", amount
            FROM balance
            WHERE account_id = $1
            ORDER BY "date", id
            "#,
        )
        .bind(account.id)
        .fetch_all(&**self)
        .await
        .map_err(storage_error(format!(
            "Failed to select balances for account {}.",
            account.id
        )))?;

        Ok(models.into_iter().map(StoredBalance::from).collect())
    }
}
