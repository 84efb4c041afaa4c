pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod seeds;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;
