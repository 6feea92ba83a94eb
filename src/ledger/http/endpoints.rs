use crate::ledger::domain::accounts::AccountId;

/// A resource exposed by the HTTP API.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endpoint {
    Health,
    Accounts,
    Account(AccountId),
    AccountBalances(AccountId),
    /// The balance an account held at an instant.
    AccountBalance(AccountId),
    /// The report of every open account's balance.
    Balances,
}

/// Build the path of an endpoint, relative to the API root.
pub fn format_endpoint(endpoint: Endpoint) -> String {
    match endpoint {
        Endpoint::Health => "/health".to_owned(),
        Endpoint::Accounts => "/accounts".to_owned(),
        Endpoint::Account(id) => format!("/accounts/{}", id),
        Endpoint::AccountBalances(id) => format!("/accounts/{}/balances", id),
        Endpoint::AccountBalance(id) => format!("/accounts/{}/balance", id),
        Endpoint::Balances => "/balances".to_owned(),
    }
}
