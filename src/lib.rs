pub mod config;
pub mod db;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod test_helpers;
