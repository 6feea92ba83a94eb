pub mod cli;
pub mod client;
mod cors;
pub mod database;
pub mod http_err;
pub mod ledger;
pub mod models;
pub mod repos;
pub mod server;
