pub mod domain;
pub mod errors;
pub mod http;
pub mod services;
