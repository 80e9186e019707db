//! NFT Endpoints
//!
//! - `GET /api/nfts?owner=`                   보유 NFT 목록
//! - `GET /api/nfts/gate?wallet=&collection=` 컬렉션 NFT 보유 여부 (접근 게이트)

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{required, ApiQuery};
use crate::error::ApiError;
use crate::services::OwnedNft;
use crate::types::SolanaAddress;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GateQuery {
    pub wallet: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NftListResponse {
    pub owner: String,
    pub nfts: Vec<OwnedNft>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResponse {
    pub wallet: String,
    pub collection: String,
    pub has_access: bool,
}

fn address_param(value: Option<&str>, name: &str) -> Result<SolanaAddress, ApiError> {
    let value = required(value).ok_or_else(|| ApiError::BadRequest(format!("{} parameter is required", name)))?;
    SolanaAddress::new(value).map_err(ApiError::ValidationError)
}

/// GET /api/nfts
pub async fn get_nfts_by_owner(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OwnerQuery>,
) -> Result<Json<NftListResponse>, ApiError> {
    let owner = address_param(query.owner.as_deref(), "owner")?;
    let nfts = state
        .solana
        .get_nfts_by_owner(owner.as_str())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, owner = %owner, "Error fetching NFTs");
            ApiError::Upstream("Failed to fetch NFTs".to_string())
        })?;

    Ok(Json(NftListResponse {
        owner: owner.into(),
        nfts,
    }))
}

/// GET /api/nfts/gate
///
/// RPC 조회 실패는 접근 거부 (`hasAccess: false`)
pub async fn check_nft_gate(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GateQuery>,
) -> Result<Json<GateResponse>, ApiError> {
    let wallet = address_param(query.wallet.as_deref(), "wallet")?;
    let collection = address_param(query.collection.as_deref(), "collection")?;

    let has_access = state
        .solana
        .owns_collection(wallet.as_str(), collection.as_str())
        .await;

    Ok(Json(GateResponse {
        wallet: wallet.into(),
        collection: collection.into(),
        has_access,
    }))
}
