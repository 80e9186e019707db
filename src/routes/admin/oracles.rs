//! Admin: 가격 오라클 + 피드

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    oracles::{FeedUpdate, NewFeed, OracleUpdate},
    OracleFeed, PriceOracle,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, required, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedListQuery {
    pub oracle_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct PriceOverride {
    pub price: f64,
}

/// GET /api/admin/oracles
pub async fn list_oracles(State(state): State<AppState>) -> Result<Json<Vec<PriceOracle>>, ApiError> {
    Ok(Json(state.db.list_oracles().await?))
}

/// PUT /api/admin/oracles/:id
pub async fn update_oracle(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<OracleUpdate>,
) -> Result<Json<PriceOracle>, ApiError> {
    let oracle = state.db.update_oracle(id, &update).await?;
    super::audit(&state, &ctx, "update_oracle", "price_oracle", id, Value::Null).await;
    Ok(Json(oracle))
}

/// GET /api/admin/oracles/feeds?oracle_id=
pub async fn list_feeds(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedListQuery>,
) -> Result<Json<Vec<OracleFeed>>, ApiError> {
    Ok(Json(state.db.list_feeds(query.oracle_id).await?))
}

/// POST /api/admin/oracles/feeds
pub async fn create_feed(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewFeed>,
) -> Result<Json<OracleFeed>, ApiError> {
    if required(Some(input.symbol.as_str())).is_none() || required(Some(input.feed_id.as_str())).is_none() {
        return Err(ApiError::BadRequest("symbol and feed_id are required".to_string()));
    }
    if input.refresh_interval_seconds.is_some_and(|secs| secs <= 0) {
        return Err(ApiError::ValidationError(
            "refresh_interval_seconds must be positive".to_string(),
        ));
    }

    let feed = state.db.create_feed(&input).await?;
    super::audit(&state, &ctx, "create_feed", "oracle_feed", feed.id, json!({ "symbol": feed.symbol })).await;
    Ok(Json(feed))
}

/// PUT /api/admin/oracles/feeds/:id
pub async fn update_feed(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<FeedUpdate>,
) -> Result<Json<OracleFeed>, ApiError> {
    let feed = state.db.update_feed(id, &update).await?;
    super::audit(&state, &ctx, "update_feed", "oracle_feed", id, Value::Null).await;
    Ok(Json(feed))
}

/// DELETE /api/admin/oracles/feeds/:id
pub async fn delete_feed(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = deleted(state.db.delete_feed(id).await?, "Feed")?;
    super::audit(&state, &ctx, "delete_feed", "oracle_feed", id, Value::Null).await;
    Ok(response)
}

/// POST /api/admin/oracles/feeds/:id/price
///
/// 수동 가격 지정 (last_updated 갱신)
pub async fn override_price(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PriceOverride>,
) -> Result<Json<OracleFeed>, ApiError> {
    if !req.price.is_finite() || req.price < 0.0 {
        return Err(ApiError::ValidationError("price must be a non-negative number".to_string()));
    }
    let feed = state.db.override_price(id, req.price).await?;

    super::audit(&state, &ctx, "override_price", "oracle_feed", id, json!({ "price": req.price })).await;
    tracing::info!(feed_id = %id, symbol = %feed.symbol, price = req.price, "Oracle price overridden");
    Ok(Json(feed))
}
