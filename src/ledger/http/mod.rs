pub mod endpoints;
mod handlers;
pub mod reps;

pub use handlers::routes;

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
        Router,
    };
    use serde::de::DeserializeOwned;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::{
        http_err::ErrorRep,
        ledger::{errors::ErrorKind, services::LedgerService},
        repos::MemoryRepo,
        server::{self, AppState},
    };

    use super::{
        endpoints::{format_endpoint, Endpoint},
        reps,
    };

    fn app() -> (Arc<MemoryRepo>, Router) {
        let repo = Arc::new(MemoryRepo::new());
        let state = AppState::new(LedgerService::new(repo.clone()));

        (repo, server::app(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        app.clone().oneshot(request).await.unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

        serde_json::from_slice(&body).unwrap()
    }

    async fn create_current_account(app: &Router) -> reps::Account {
        let response = send(
            app,
            Method::POST,
            &format_endpoint(Endpoint::Accounts),
            Some(json!({
                "name": "Current",
                "currency": "GBP",
                "opened": "2013-10-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, response.status());

        read_json(response).await
    }

    #[tokio::test]
    async fn health() {
        let (repo, app) = app();

        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(StatusCode::OK, response.status());

        repo.set_unavailable(true);

        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status());
        let rep: reps::Health = read_json(response).await;
        assert!(!rep.available);
    }

    #[tokio::test]
    async fn create_and_get_account() {
        let (_, app) = app();

        let response = send(
            &app,
            Method::POST,
            "/accounts",
            Some(json!({
                "name": "Current",
                "currency": "GBP",
                "opened": "2013-10-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, response.status());

        let location = response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_owned();
        let created: reps::Account = read_json(response).await;
        assert_eq!(format_endpoint(Endpoint::Account(created.id)), location);
        assert_eq!("GBP", created.currency);

        let response = send(&app, Method::GET, &location, None).await;
        assert_eq!(StatusCode::OK, response.status());
        let fetched: reps::Account = read_json(response).await;
        assert_eq!(created, fetched);
    }

    #[tokio::test]
    async fn create_invalid_account() {
        let (_, app) = app();

        let response = send(
            &app,
            Method::POST,
            "/accounts",
            Some(json!({
                "name": "Current",
                "currency": "GBPX",
                "opened": "2013-10-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::InvalidCodeLength), error.kind);
    }

    #[tokio::test]
    async fn get_missing_account() {
        let (_, app) = app();

        let response = send(&app, Method::GET, "/accounts/12", None).await;
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::NotFound), error.kind);
    }

    #[tokio::test]
    async fn balances_round_trip() {
        let (_, app) = app();
        let account = create_current_account(&app).await;

        let response = send(
            &app,
            Method::POST,
            &format_endpoint(Endpoint::AccountBalances(account.id)),
            Some(json!({"date": "2016-06-17T00:00:00Z", "amount": 63641})),
        )
        .await;
        assert_eq!(StatusCode::CREATED, response.status());
        assert_eq!(
            format_endpoint(Endpoint::AccountBalances(account.id)),
            response.headers()[header::LOCATION].to_str().unwrap()
        );

        let response = send(
            &app,
            Method::GET,
            &format!(
                "{}?at=2016-06-18T00:00:00Z",
                format_endpoint(Endpoint::AccountBalance(account.id))
            ),
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, response.status());
        let found: reps::AccountBalance = read_json(response).await;
        assert_eq!(63641, found.balance.amount);

        let response = send(
            &app,
            Method::GET,
            &format!(
                "{}?at=2016-06-16T00:00:00Z",
                format_endpoint(Endpoint::AccountBalance(account.id))
            ),
            None,
        )
        .await;
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        let response = send(
            &app,
            Method::GET,
            &format_endpoint(Endpoint::AccountBalances(account.id)),
            None,
        )
        .await;
        let history: reps::AccountBalances = read_json(response).await;
        assert_eq!(account, history.account);
        assert_eq!(1, history.balances.len());
    }

    #[tokio::test]
    async fn balance_out_of_range() {
        let (_, app) = app();
        let account = create_current_account(&app).await;

        let response = send(
            &app,
            Method::POST,
            &format_endpoint(Endpoint::AccountBalances(account.id)),
            Some(json!({"date": "2012-01-01T00:00:00Z", "amount": 1})),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::BalanceOutOfRange), error.kind);
    }

    #[tokio::test]
    async fn update_rejected_by_existing_balance() {
        let (_, app) = app();
        let account = create_current_account(&app).await;

        send(
            &app,
            Method::POST,
            &format_endpoint(Endpoint::AccountBalances(account.id)),
            Some(json!({"date": "2016-06-17T00:00:00Z", "amount": 63641})),
        )
        .await;

        let response = send(
            &app,
            Method::PUT,
            &format_endpoint(Endpoint::Account(account.id)),
            Some(json!({
                "name": "Current",
                "currency": "GBP",
                "opened": "2013-10-01T00:00:00Z",
                "closed": "2016-01-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::UpdateInvalidatesBalance), error.kind);

        let response = send(
            &app,
            Method::PUT,
            &format_endpoint(Endpoint::Account(account.id)),
            Some(json!({
                "name": "Current account",
                "currency": "GBP",
                "opened": "2013-10-01T00:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::OK, response.status());
        let updated: reps::Account = read_json(response).await;
        assert_eq!("Current account", updated.name);
    }

    #[tokio::test]
    async fn delete_account() {
        let (_, app) = app();
        let account = create_current_account(&app).await;
        let uri = format_endpoint(Endpoint::Account(account.id));

        let response = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(StatusCode::NO_CONTENT, response.status());

        let response = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(StatusCode::CONFLICT, response.status());

        let response = send(
            &app,
            Method::POST,
            &format_endpoint(Endpoint::AccountBalances(account.id)),
            Some(json!({"date": "2016-06-17T00:00:00Z", "amount": 63641})),
        )
        .await;
        assert_eq!(StatusCode::CONFLICT, response.status());
        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::AccountDeleted), error.kind);

        let response = send(&app, Method::GET, &uri, None).await;
        let deleted: reps::Account = read_json(response).await;
        assert!(deleted.deleted_at.is_some());
    }

    #[tokio::test]
    async fn list_accounts_with_filters() {
        let (_, app) = app();
        let current = create_current_account(&app).await;
        send(
            &app,
            Method::POST,
            "/accounts",
            Some(json!({
                "name": "Savings",
                "currency": "GBP",
                "opened": "2015-09-14T00:00:00Z",
                "closed": "2016-06-19T00:00:00Z",
            })),
        )
        .await;

        let response = send(&app, Method::GET, "/accounts", None).await;
        let all: reps::ResourceCollection<reps::Account> = read_json(response).await;
        assert_eq!(2, all.items.len());

        let response = send(
            &app,
            Method::GET,
            "/accounts?open_at=2016-06-20T00:00:00Z",
            None,
        )
        .await;
        let open: reps::ResourceCollection<reps::Account> = read_json(response).await;
        assert_eq!(vec![current.clone()], open.items);

        let response = send(&app, Method::GET, &format!("/accounts?ids={}", current.id), None).await;
        let by_id: reps::ResourceCollection<reps::Account> = read_json(response).await;
        assert_eq!(vec![current], by_id.items);

        let response = send(&app, Method::GET, "/accounts?ids=one", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    #[tokio::test]
    async fn balance_report() {
        let (_, app) = app();
        let current = create_current_account(&app).await;

        send(
            &app,
            Method::POST,
            &format_endpoint(Endpoint::AccountBalances(current.id)),
            Some(json!({"date": "2016-06-17T00:00:00Z", "amount": 63641})),
        )
        .await;

        let response = send(
            &app,
            Method::GET,
            "/balances?at=2016-06-30T00:00:00Z&sort=magnitude",
            None,
        )
        .await;
        assert_eq!(StatusCode::OK, response.status());

        let report: reps::BalanceReport = read_json(response).await;
        assert_eq!(1, report.items.len());
        assert_eq!(current, report.items[0].account);

        let response = send(&app, Method::GET, "/balances?sort=size", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    #[tokio::test]
    async fn storage_unavailable() {
        let (repo, app) = app();
        repo.set_unavailable(true);

        let response = send(&app, Method::GET, "/accounts", None).await;
        assert_eq!(StatusCode::SERVICE_UNAVAILABLE, response.status());

        let error: ErrorRep = read_json(response).await;
        assert_eq!(Some(ErrorKind::StorageUnavailable), error.kind);
    }
}
