//! AI Endpoints
//!
//! - `POST /api/ai`             프롬프트 → 모델 응답
//! - `POST /api/ai/image`       DALL·E 3 이미지
//! - `POST /api/ai/nft-artwork` NFT 아트워크 프롬프트로 hd 이미지
//! - `POST /api/ai/variations`  원본 이미지 URL → variation 2장

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{required, ApiJson};
use crate::error::ApiError;
use crate::types::{ImageQuality, ImageSize};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: Option<String>,
    pub size: Option<ImageSize>,
    pub quality: Option<ImageQuality>,
}

#[derive(Debug, Deserialize)]
pub struct NftArtworkRequest {
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VariationResponse {
    pub urls: Vec<String>,
}

/// http(s) 원본 이미지 URL
fn image_url(value: Option<&str>) -> Result<&str, ApiError> {
    let url = required(value).ok_or_else(|| ApiError::BadRequest("imageUrl is required".to_string()))?;
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(url)
    } else {
        Err(ApiError::ValidationError("imageUrl must be an http(s) URL".to_string()))
    }
}

/// 키 미설정은 500 (서버 설정 문제)
fn ensure_configured(state: &AppState) -> Result<(), ApiError> {
    if state.openai.is_configured() {
        Ok(())
    } else {
        Err(ApiError::Upstream("OpenAI API key not configured".to_string()))
    }
}

/// POST /api/ai
pub async fn execute_prompt(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PromptRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    let prompt = required(req.prompt.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;
    ensure_configured(&state)?;

    let response = state.openai.complete(prompt).await.map_err(|e| {
        tracing::error!(error = %e, "AI agent execution failed");
        ApiError::Upstream("Failed to execute AI agent".to_string())
    })?;

    Ok(Json(PromptResponse { response }))
}

/// POST /api/ai/image
pub async fn generate_image(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    let prompt = required(req.prompt.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".to_string()))?;
    ensure_configured(&state)?;

    let url = state
        .openai
        .generate_image(
            prompt,
            req.size.unwrap_or(ImageSize::Square),
            req.quality.unwrap_or(ImageQuality::Standard),
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Image generation failed");
            ApiError::Upstream("Failed to generate image".to_string())
        })?;

    Ok(Json(ImageResponse { url }))
}

/// POST /api/ai/nft-artwork
pub async fn generate_nft_artwork(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NftArtworkRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    let description = required(req.description.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Description is required".to_string()))?;
    ensure_configured(&state)?;

    let url = state
        .openai
        .generate_nft_artwork(description)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "NFT artwork generation failed");
            ApiError::Upstream("Failed to generate image".to_string())
        })?;

    Ok(Json(ImageResponse { url }))
}

/// POST /api/ai/variations
pub async fn generate_variations(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VariationRequest>,
) -> Result<Json<VariationResponse>, ApiError> {
    let url = image_url(req.image_url.as_deref())?;
    ensure_configured(&state)?;

    let urls = state.openai.generate_variations(url).await.map_err(|e| {
        tracing::error!(error = %e, "Image variation failed");
        ApiError::Upstream("Failed to generate image variations".to_string())
    })?;

    Ok(Json(VariationResponse { urls }))
}
