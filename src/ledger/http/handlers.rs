use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::{
    http_err::{ApiError, ApiResponse},
    ledger::{
        domain::{
            accounts::{AccountData, AccountId},
            balances::BalanceData,
            filters::AccountFilter,
            reports::SortKey,
        },
        services::LedgerService,
    },
    server::AppState,
};

use super::{
    endpoints::{format_endpoint, Endpoint},
    reps,
};

type Created<T> = (StatusCode, [(header::HeaderName, String); 1], Json<T>);

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_health))
        .route("/accounts", get(get_accounts).post(create_account))
        .route(
            "/accounts/:account",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route(
            "/accounts/:account/balances",
            get(get_account_balances).post(create_balance),
        )
        .route("/accounts/:account/balance", get(get_account_balance))
        .route("/balances", get(get_balances))
}

fn created<T>(endpoint: Endpoint, rep: T) -> Created<T> {
    (
        StatusCode::CREATED,
        [(header::LOCATION, format_endpoint(endpoint))],
        Json(rep),
    )
}

async fn get_health(
    State(ledger_service): State<LedgerService>,
) -> (StatusCode, Json<reps::Health>) {
    let available = ledger_service.available().await;

    if available {
        (StatusCode::OK, Json(reps::Health { available }))
    } else {
        error!("Health check failed, storage is unavailable.");

        (StatusCode::SERVICE_UNAVAILABLE, Json(reps::Health { available }))
    }
}

#[derive(Deserialize)]
struct GetAccountsParams {
    open_at: Option<DateTime<Utc>>,
    existed_at: Option<DateTime<Utc>>,
    ids: Option<String>,
}

impl GetAccountsParams {
    /// Combine every provided parameter into a single filter.
    fn into_filter(self) -> Result<Option<AccountFilter>, ApiError> {
        let mut filters = Vec::new();

        if let Some(at) = self.existed_at {
            filters.push(AccountFilter::Existed(at));
        }
        if let Some(at) = self.open_at {
            filters.push(AccountFilter::OpenAt(at));
        }
        if let Some(ids) = self.ids {
            filters.push(AccountFilter::Ids(parse_ids(&ids)?));
        }

        Ok(match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(AccountFilter::All(filters)),
        })
    }
}

fn parse_ids(ids: &str) -> Result<Vec<AccountId>, ApiError> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<AccountId>().map_err(|_| {
                ApiError::BadRequestReason(format!("'{}' is not a valid account ID.", id))
            })
        })
        .collect()
}

async fn get_accounts(
    State(ledger_service): State<LedgerService>,
    Query(params): Query<GetAccountsParams>,
) -> ApiResponse<Json<reps::ResourceCollection<reps::Account>>> {
    let filter = params.into_filter()?;

    debug!(?filter, "Listing accounts.");

    let accounts = ledger_service.list_accounts(filter.as_ref()).await?;

    Ok(Json(
        accounts
            .iter()
            .map(reps::Account::from)
            .collect::<Vec<_>>()
            .into(),
    ))
}

async fn create_account(
    State(ledger_service): State<LedgerService>,
    Json(data): Json<AccountData>,
) -> ApiResponse<Created<reps::Account>> {
    let account = ledger_service.create_account(data).await?;

    info!(id = account.id, "Created account.");

    Ok(created(
        Endpoint::Account(account.id),
        reps::Account::from(&account),
    ))
}

async fn get_account(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
) -> ApiResponse<Json<reps::Account>> {
    let account = ledger_service.get_account(account_id).await?;

    Ok(Json((&account).into()))
}

async fn update_account(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
    Json(data): Json<AccountData>,
) -> ApiResponse<Json<reps::Account>> {
    let account = ledger_service.update_account(account_id, data).await?;

    Ok(Json((&account).into()))
}

async fn delete_account(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
) -> ApiResponse<StatusCode> {
    ledger_service.delete_account(account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_account_balances(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
) -> ApiResponse<Json<reps::AccountBalances>> {
    let (account, balances) = ledger_service.account_balances(account_id).await?;

    Ok(Json((&account, &balances).into()))
}

async fn create_balance(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
    Json(data): Json<BalanceData>,
) -> ApiResponse<Created<reps::Balance>> {
    let balance = ledger_service.insert_balance(account_id, data).await?;

    info!(account_id, id = balance.id, "Created balance.");

    // Balances have no route of their own, so point at the account's history.
    Ok(created(
        Endpoint::AccountBalances(account_id),
        reps::Balance::from(&balance),
    ))
}

#[derive(Deserialize)]
struct BalanceAtParams {
    at: Option<DateTime<Utc>>,
}

async fn get_account_balance(
    State(ledger_service): State<LedgerService>,
    Path(account_id): Path<AccountId>,
    Query(params): Query<BalanceAtParams>,
) -> ApiResponse<Json<reps::AccountBalance>> {
    let at = params.at.unwrap_or_else(Utc::now);
    let (account, balance) = ledger_service.balance_at(account_id, at).await?;

    Ok(Json(reps::AccountBalance {
        account: (&account).into(),
        balance: (&balance).into(),
    }))
}

#[derive(Deserialize)]
struct GetBalancesParams {
    at: Option<DateTime<Utc>>,
    sort: Option<String>,
}

async fn get_balances(
    State(ledger_service): State<LedgerService>,
    Query(params): Query<GetBalancesParams>,
) -> ApiResponse<Json<reps::BalanceReport>> {
    let at = params.at.unwrap_or_else(Utc::now);
    let sort = match params.sort.as_deref() {
        None => SortKey::default(),
        Some(raw) => raw
            .parse::<SortKey>()
            .map_err(|error| ApiError::BadRequestReason(error.to_string()))?,
    };

    let report = ledger_service.balances_at(at, sort).await?;

    Ok(Json(reps::BalanceReport {
        at,
        sort,
        items: report.iter().map(reps::AccountBalance::from).collect(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_id_list() {
        assert_eq!(vec![1, 2, 30], parse_ids("1, 2,30,").ok().unwrap());
        assert!(parse_ids("").ok().unwrap().is_empty());
        assert!(parse_ids("1,two").is_err());
    }

    #[test]
    fn filters_are_combined() {
        let at = Utc::now();
        let params = GetAccountsParams {
            open_at: Some(at),
            existed_at: None,
            ids: Some("3".to_owned()),
        };

        assert_eq!(
            Some(AccountFilter::All(vec![
                AccountFilter::OpenAt(at),
                AccountFilter::Ids(vec![3]),
            ])),
            params.into_filter().ok().unwrap()
        );
    }

    #[test]
    fn single_filter_is_not_wrapped() {
        let at = Utc::now();
        let params = GetAccountsParams {
            open_at: None,
            existed_at: Some(at),
            ids: None,
        };

        assert_eq!(
            Some(AccountFilter::Existed(at)),
            params.into_filter().ok().unwrap()
        );
    }
}
