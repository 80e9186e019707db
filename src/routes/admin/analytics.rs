//! Admin: 대시보드 집계 (stats, tokens, transactions)

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::db::{
    analytics::{aggregate_tokens, token_totals, PlatformStats, TokenSummary, TokenTotals, TransactionFilter},
    Transaction,
};
use crate::error::ApiError;
use crate::routes::ApiQuery;
use crate::types::PageRequest;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TokensResponse {
    pub tokens: Vec<TokenSummary>,
    #[serde(flatten)]
    pub totals: TokenTotals,
}

#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    pub page: Option<u32>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_pages: i64,
    pub total: i64,
}

/// GET /api/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>, ApiError> {
    Ok(Json(state.db.platform_stats().await?))
}

/// GET /api/admin/tokens
pub async fn get_tokens(State(state): State<AppState>) -> Result<Json<TokensResponse>, ApiError> {
    let tokens = aggregate_tokens(state.db.token_holdings().await?);
    let totals = token_totals(&tokens);
    Ok(Json(TokensResponse { tokens, totals }))
}

/// GET /api/admin/transactions?page=&type=&status=
pub async fn list_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let page = PageRequest::new(query.page);
    let filter = TransactionFilter {
        tx_type: query.tx_type,
        status: query.status,
    };
    let (transactions, total) = state.db.list_transactions(&filter, page).await?;

    Ok(Json(TransactionsResponse {
        transactions,
        total_pages: page.total_pages(total),
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokens_response_shape() {
        let tokens = vec![TokenSummary {
            token_address: "So11111111111111111111111111111111111111112".to_string(),
            token_symbol: "SOL".to_string(),
            total_holders: 2,
            total_supply: 3.5,
            total_value_usd: 500.0,
        }];
        let totals = token_totals(&tokens);
        let value = serde_json::to_value(TokensResponse { tokens, totals }).unwrap();

        assert_eq!(value["totalTokens"], json!(1));
        assert_eq!(value["totalHolders"], json!(2));
        assert_eq!(value["activeTokens"], json!(1));
        assert_eq!(value["tokens"][0]["token_symbol"], json!("SOL"));
    }
}
