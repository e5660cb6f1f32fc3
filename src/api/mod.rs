//! Supply API Service
//!
//! Plain-text HTTP endpoints for token version, stats, balances and
//! circulating supply.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, ApiServer};
