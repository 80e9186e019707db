//! DeFi Endpoints (Jupiter)
//!
//! - `GET  /api/defi/quote?inputMint=&outputMint=&amount=&slippageBps=`
//! - `POST /api/defi/swap`   `{quoteResponse, userPublicKey}` → `{swapTransaction}`
//! - `GET  /api/defi/tokens`

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{required, ApiJson, ApiQuery};
use crate::error::ApiError;
use crate::services::JupiterService;
use crate::types::SolanaAddress;
use crate::AppState;

/// 100% = 10000 bps
const MAX_SLIPPAGE_BPS: u16 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub input_mint: Option<String>,
    pub output_mint: Option<String>,
    pub amount: Option<u64>,
    pub slippage_bps: Option<u16>,
}

/// 검증된 견적 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteParams {
    pub input_mint: SolanaAddress,
    pub output_mint: SolanaAddress,
    pub amount: u64,
    pub slippage_bps: u16,
}

impl QuoteQuery {
    pub fn params(&self) -> Result<QuoteParams, ApiError> {
        let mint = |value: Option<&str>, name: &str| -> Result<SolanaAddress, ApiError> {
            let value = required(value).ok_or_else(|| ApiError::BadRequest(format!("{} is required", name)))?;
            SolanaAddress::new(value).map_err(ApiError::ValidationError)
        };
        let input_mint = mint(self.input_mint.as_deref(), "inputMint")?;
        let output_mint = mint(self.output_mint.as_deref(), "outputMint")?;

        let amount = match self.amount {
            Some(amount) if amount > 0 => amount,
            _ => return Err(ApiError::ValidationError("amount must be greater than 0".to_string())),
        };
        let slippage_bps = self.slippage_bps.unwrap_or(JupiterService::DEFAULT_SLIPPAGE_BPS);
        if slippage_bps > MAX_SLIPPAGE_BPS {
            return Err(ApiError::ValidationError(format!(
                "slippageBps must be at most {}",
                MAX_SLIPPAGE_BPS
            )));
        }

        Ok(QuoteParams {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub quote_response: Option<Value>,
    pub user_public_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    pub swap_transaction: String,
}

fn jupiter_failed(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Jupiter request failed");
    ApiError::Upstream("Failed to fetch swap data".to_string())
}

/// GET /api/defi/quote
pub async fn get_quote(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QuoteQuery>,
) -> Result<Json<Value>, ApiError> {
    let params = query.params()?;
    let quote = state
        .jupiter
        .quote(
            params.input_mint.as_str(),
            params.output_mint.as_str(),
            params.amount,
            params.slippage_bps,
        )
        .await
        .map_err(jupiter_failed)?;
    Ok(Json(quote))
}

/// POST /api/defi/swap
///
/// 서명되지 않은 트랜잭션만 반환 (서명/전송은 지갑에서)
pub async fn get_swap_transaction(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SwapRequest>,
) -> Result<Json<SwapResponse>, ApiError> {
    let quote = req
        .quote_response
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::BadRequest("quoteResponse is required".to_string()))?;
    let user = required(req.user_public_key.as_deref())
        .ok_or_else(|| ApiError::BadRequest("userPublicKey is required".to_string()))?;
    let user = SolanaAddress::new(user).map_err(ApiError::ValidationError)?;

    let swap_transaction = state
        .jupiter
        .swap_transaction(&quote, user.as_str())
        .await
        .map_err(jupiter_failed)?;
    Ok(Json(SwapResponse { swap_transaction }))
}

/// GET /api/defi/tokens
pub async fn get_token_list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.jupiter.token_list().await.map_err(jupiter_failed)?))
}
