//! A client for the balance book HTTP API, used by the CLI.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    http_err::ErrorRep,
    ledger::{
        domain::{
            accounts::{AccountData, AccountId},
            balances::BalanceData,
            reports::SortKey,
        },
        errors::ErrorKind,
        http::{
            endpoints::{format_endpoint, Endpoint},
            reps,
        },
    },
};

pub mod table;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A request the server refused.
#[derive(Debug, Error)]
#[error("{message} ({status})")]
pub struct RequestFailed {
    pub status: StatusCode,
    pub message: String,
    pub kind: Option<ErrorKind>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl ApiClient {
    /// Create a client for the server at `server_url`.
    pub fn new(server_url: &str) -> anyhow::Result<Self> {
        Url::parse(server_url).with_context(|| format!("Invalid server URL '{}'.", server_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client.")?;

        Ok(Self {
            client,
            base_url: server_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, format_endpoint(endpoint))
    }

    /// Send a request, turning any non-success response into a
    /// [`RequestFailed`] error.
    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Response> {
        let response = request.send().await.context("Failed to reach server.")?;
        let status = response.status();

        debug!(url = %response.url(), %status, "Received response.");

        if status.is_success() {
            return Ok(response);
        }

        let failure = match response.json::<ErrorRep>().await {
            Ok(rep) => RequestFailed {
                status,
                message: rep.message,
                kind: rep.kind,
            },
            Err(_) => RequestFailed {
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_owned(),
                kind: None,
            },
        };

        Err(failure.into())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .context("Failed to parse server response.")
    }

    pub async fn accounts(
        &self,
        open_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<reps::Account>> {
        let mut request = self.client.get(self.url(Endpoint::Accounts));
        if let Some(at) = open_at {
            request = request.query(&[("open_at", format_timestamp(at))]);
        }

        let collection: reps::ResourceCollection<reps::Account> = self
            .fetch(request)
            .await
            .context("Failed to list accounts.")?;

        Ok(collection.items)
    }

    pub async fn create_account(&self, data: &AccountData) -> anyhow::Result<reps::Account> {
        self.fetch(self.client.post(self.url(Endpoint::Accounts)).json(data))
            .await
            .context("Failed to create account.")
    }

    pub async fn update_account(
        &self,
        id: AccountId,
        data: &AccountData,
    ) -> anyhow::Result<reps::Account> {
        self.fetch(self.client.put(self.url(Endpoint::Account(id))).json(data))
            .await
            .with_context(|| format!("Failed to update account {}.", id))
    }

    pub async fn delete_account(&self, id: AccountId) -> anyhow::Result<()> {
        self.send(self.client.delete(self.url(Endpoint::Account(id))))
            .await
            .with_context(|| format!("Failed to delete account {}.", id))?;

        Ok(())
    }

    pub async fn create_balance(
        &self,
        account_id: AccountId,
        data: &BalanceData,
    ) -> anyhow::Result<reps::Balance> {
        self.fetch(
            self.client
                .post(self.url(Endpoint::AccountBalances(account_id)))
                .json(data),
        )
        .await
        .with_context(|| format!("Failed to record balance for account {}.", account_id))
    }

    pub async fn account_balances(
        &self,
        account_id: AccountId,
    ) -> anyhow::Result<reps::AccountBalances> {
        self.fetch(self.client.get(self.url(Endpoint::AccountBalances(account_id))))
            .await
            .with_context(|| format!("Failed to fetch balances for account {}.", account_id))
    }

    pub async fn report(
        &self,
        at: Option<DateTime<Utc>>,
        sort: SortKey,
    ) -> anyhow::Result<reps::BalanceReport> {
        let mut query = vec![("sort", sort.to_string())];
        if let Some(at) = at {
            query.push(("at", format_timestamp(at)));
        }

        self.fetch(self.client.get(self.url(Endpoint::Balances)).query(&query))
            .await
            .context("Failed to fetch balance report.")
    }
}
