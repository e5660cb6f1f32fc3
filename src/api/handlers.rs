//! Request Handlers
//!
//! Each handler makes at most one round of upstream calls and answers in
//! plain text. `/stats` is the exception and passes the node's JSON through.

use super::{errors::ApiError, middleware::RequestId};
use crate::{
    amount::TokenAmount,
    config::TokenConfig,
    supply::SupplyCalculator,
    upstream::{ChainApi, CurrencyStats},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

pub const ACCOUNT_MANDATORY: &str = "Account is mandatory";
pub const UNKNOWN_BALANCE: &str = "Unknown Balance";

/// Shared application state
pub struct AppState {
    pub chain: Arc<dyn ChainApi>,
    pub supply: SupplyCalculator,
    pub token: TokenConfig,
    pub version: String,
}

impl AppState {
    pub fn new(chain: Arc<dyn ChainApi>, token: TokenConfig, version: impl Into<String>) -> Self {
        Self {
            supply: SupplyCalculator::new(chain.clone(), token.clone()),
            chain,
            token,
            version: version.into(),
        }
    }
}

/// GET /version
pub async fn version_handler(State(state): State<Arc<AppState>>) -> String {
    state.version.clone()
}

/// Raw currency stats from the node
/// GET /stats
pub async fn stats_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurrencyStats>, ApiError> {
    let stats = state
        .chain
        .get_currency_stats()
        .await
        .map_err(|e| ApiError::internal_error(request_id.0, e.message))?;

    Ok(Json(stats))
}

/// Fixed-decimal balance of one account
/// GET /balance/{account}
///
/// Also mounted on `/balance` and `/balance/` so a missing account gets a 400
/// instead of falling through to a 404.
pub async fn balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    account: Option<Path<String>>,
) -> Result<String, ApiError> {
    let account = match account {
        Some(Path(account)) if !account.trim().is_empty() => account,
        _ => return Err(ApiError::validation(request_id.0, ACCOUNT_MANDATORY)),
    };

    let balances = state
        .chain
        .get_currency_balance(&account)
        .await
        .map_err(|e| ApiError::internal_error(request_id.0.clone(), e.message))?;

    let wire = balances
        .first()
        .ok_or_else(|| ApiError::internal_error(request_id.0.clone(), UNKNOWN_BALANCE))?;

    let balance = TokenAmount::parse(wire, state.token.decimals)
        .map_err(|e| ApiError::internal_error(request_id.0.clone(), e.to_string()))?;

    Ok(balance.to_string())
}

/// Circulating supply: total minus excluded accounts
/// GET /supply
pub async fn supply_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> Result<String, ApiError> {
    let supply = state
        .supply
        .current_circulating_supply()
        .await
        .map_err(|e| ApiError::internal_error(request_id.0, e.to_string()))?;

    Ok(supply.to_string())
}
