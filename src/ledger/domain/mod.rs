pub mod accounts;
pub mod balances;
pub mod currency;
pub mod filters;
pub mod reports;
