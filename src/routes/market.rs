//! Market Endpoints
//!
//! `GET /api/market?endpoint=trending|gainers|price&tokenId=`
//! `GET /api/market/token/:id`

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use super::{required, ApiPath, ApiQuery};
use crate::error::ApiError;
use crate::services::MarketService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    pub endpoint: Option<String>,
    #[serde(rename = "tokenId")]
    pub token_id: Option<String>,
}

/// 조회 대상
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketEndpoint {
    Trending,
    Gainers,
    Price(String),
}

impl MarketEndpoint {
    /// endpoint 기본값 trending
    pub fn from_query(query: &MarketQuery) -> Result<Self, ApiError> {
        match query.endpoint.as_deref().unwrap_or("trending") {
            "trending" => Ok(Self::Trending),
            "gainers" => Ok(Self::Gainers),
            "price" => required(query.token_id.as_deref())
                .map(|id| Self::Price(id.to_string()))
                .ok_or_else(|| {
                    ApiError::BadRequest("tokenId parameter is required for price endpoint".to_string())
                }),
            _ => Err(ApiError::BadRequest("Invalid endpoint".to_string())),
        }
    }
}

fn fetch_failed(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "Error fetching market data");
    ApiError::Upstream("Failed to fetch market data".to_string())
}

/// GET /api/market
pub async fn get_market_data(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MarketQuery>,
) -> Result<Json<Value>, ApiError> {
    let data = match MarketEndpoint::from_query(&query)? {
        MarketEndpoint::Trending => state.market.trending().await,
        MarketEndpoint::Gainers => {
            state
                .market
                .top_gainers(MarketService::DEFAULT_GAINERS_LIMIT)
                .await
        }
        MarketEndpoint::Price(token_id) => state.market.price(&token_id).await,
    }
    .map_err(fetch_failed)?;

    Ok(Json(data))
}

/// GET /api/market/token/:id
pub async fn get_token_info(
    State(state): State<AppState>,
    ApiPath(token_id): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let data = state.market.token_info(&token_id).await.map_err(fetch_failed)?;
    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(endpoint: Option<&str>, token_id: Option<&str>) -> MarketQuery {
        MarketQuery {
            endpoint: endpoint.map(str::to_string),
            token_id: token_id.map(str::to_string),
        }
    }

    #[test]
    fn test_endpoint_selection() {
        assert_eq!(MarketEndpoint::from_query(&query(None, None)).unwrap(), MarketEndpoint::Trending);
        assert_eq!(
            MarketEndpoint::from_query(&query(Some("gainers"), None)).unwrap(),
            MarketEndpoint::Gainers
        );
        assert_eq!(
            MarketEndpoint::from_query(&query(Some("price"), Some("solana"))).unwrap(),
            MarketEndpoint::Price("solana".to_string())
        );
    }

    #[test]
    fn test_endpoint_errors() {
        let err = MarketEndpoint::from_query(&query(Some("price"), None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request: tokenId parameter is required for price endpoint"
        );

        let err = MarketEndpoint::from_query(&query(Some("losers"), None)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: Invalid endpoint");
    }
}
