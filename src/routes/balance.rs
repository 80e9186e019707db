//! Balance Endpoints
//!
//! - `GET /api/balance?address=`            SOL 잔고
//! - `GET /api/balance/token?token=&owner=` SPL 토큰 잔고

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{required, ApiQuery};
use crate::error::ApiError;
use crate::types::SolanaAddress;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenBalanceQuery {
    pub token: Option<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: f64,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenBalanceResponse {
    pub token: String,
    pub owner: String,
    pub balance: f64,
}

fn parse_address(value: Option<&str>, missing: &str) -> Result<SolanaAddress, ApiError> {
    let value = required(value).ok_or_else(|| ApiError::BadRequest(missing.to_string()))?;
    SolanaAddress::new(value).map_err(ApiError::ValidationError)
}

fn fetch_failed(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Error fetching balance");
    ApiError::Upstream("Failed to fetch balance".to_string())
}

/// GET /api/balance
pub async fn get_balance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = parse_address(query.address.as_deref(), "Address parameter is required")?;
    let balance = state
        .solana
        .get_balance(address.as_str())
        .await
        .map_err(fetch_failed)?;

    Ok(Json(BalanceResponse {
        address: address.into(),
        balance,
        unit: "SOL",
    }))
}

/// GET /api/balance/token
pub async fn get_token_balance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TokenBalanceQuery>,
) -> Result<Json<TokenBalanceResponse>, ApiError> {
    let token = parse_address(query.token.as_deref(), "Token parameter is required")?;
    let owner = parse_address(query.owner.as_deref(), "Owner parameter is required")?;

    let balance = state
        .solana
        .get_token_balance(token.as_str(), owner.as_str())
        .await
        .map_err(fetch_failed)?;

    Ok(Json(TokenBalanceResponse {
        token: token.into(),
        owner: owner.into(),
        balance,
    }))
}
