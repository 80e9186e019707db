//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크
//! - `/api/auth/*` - 로그인/가입/세션 (Auth provider 위임)
//! - `/api/ai/*` - LLM, 이미지 생성
//! - `/api/balance/*` - Solana 잔고
//! - `/api/market/*` - 시장 데이터
//! - `/api/defi/*` - Jupiter 견적/스왑
//! - `/api/nfts/*` - 보유 NFT, NFT 게이트
//! - `/api/admin/*` - 관리자 CRUD (admin gate)

pub mod admin;
pub mod ai;
pub mod auth;
pub mod balance;
pub mod defi;
pub mod health;
pub mod market;
pub mod nft;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;

use crate::error::ApiError;

/// JSON body extractor (거부 시 ApiError envelope 400)
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor (거부 시 ApiError envelope 400)
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor (거부 시 ApiError envelope 400)
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// 단순 성공 응답 `{success, message}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// 삭제 결과 → 404 (대상 없음) 또는 `{success: true}`
pub(crate) fn deleted(rows: u64, resource: &str) -> Result<axum::Json<MessageResponse>, ApiError> {
    if rows == 0 {
        return Err(ApiError::NotFound(resource.to_string()));
    }
    Ok(axum::Json(MessageResponse::ok(format!("{} deleted", resource))))
}

/// 필수 문자열 필드 (없거나 공백이면 None)
pub(crate) fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required(None), None);
        assert_eq!(required(Some("   ")), None);
        assert_eq!(required(Some(" a ")), Some("a"));
    }

    #[test]
    fn test_deleted() {
        assert!(deleted(0, "Agent").is_err());
        let response = deleted(1, "Agent").unwrap();
        assert_eq!(response.0.message, "Agent deleted");
    }
}
