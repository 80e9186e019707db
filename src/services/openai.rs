//! OpenAI Service
//!
//! Chat completion (gpt-4, temperature 0) + DALL·E 3 이미지 생성 + DALL·E 2 variation
//!
//! 스트리밍 없음: 응답 전체를 받은 뒤 반환

use anyhow::{anyhow, bail, Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

use crate::types::{ImageQuality, ImageSize};

pub const CHAT_MODEL: &str = "gpt-4";
pub const IMAGE_MODEL: &str = "dall-e-3";
/// variation 은 dall-e-2 만 지원
pub const VARIATION_MODEL: &str = "dall-e-2";
/// variation 원본 이미지 제한 (PNG, 4MB 미만)
pub const MAX_VARIATION_IMAGE_BYTES: usize = 4 * 1024 * 1024;
const VARIATION_COUNT: u8 = 2;

/// NFT 아트워크용 프롬프트
pub fn nft_artwork_prompt(description: &str) -> String {
    format!(
        "Create a unique digital art piece for an NFT with the following description: {}. \
         Style: vibrant, high quality, detailed, suitable for blockchain art collection.",
        description
    )
}

/// 사용자 프롬프트 하나만 전달 (system 메시지 없음)
pub(crate) fn chat_request(prompt: &str) -> Value {
    json!({
        "model": CHAT_MODEL,
        "temperature": 0,
        "messages": [
            { "role": "user", "content": prompt },
        ],
    })
}

pub(crate) fn image_request(prompt: &str, size: ImageSize, quality: ImageQuality) -> Value {
    json!({
        "model": IMAGE_MODEL,
        "prompt": prompt,
        "n": 1,
        "size": size.as_str(),
        "quality": quality.as_str(),
    })
}

/// 이미지 응답의 URL 목록 (url 이 없는 항목은 빈 문자열)
pub(crate) fn image_urls(response: &Value) -> Vec<String> {
    response
        .get("data")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .map(|img| img.get("url").and_then(Value::as_str).unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn variation_form(image: Vec<u8>) -> Result<Form> {
    let part = Part::bytes(image).file_name("image.png").mime_str("image/png")?;
    Ok(Form::new()
        .text("model", VARIATION_MODEL)
        .text("n", VARIATION_COUNT.to_string())
        .text("size", ImageSize::Square.as_str())
        .part("image", part))
}

pub struct OpenAiService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiService {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OpenAI API key not configured"))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key()?)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Invalid OpenAI response")?;
        Ok(response)
    }

    /// 프롬프트 1회 실행 → 모델 응답 텍스트
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self.post("/chat/completions", &chat_request(prompt)).await?;
        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("Completion response has no content")
    }

    /// 이미지 URL (응답에 없으면 빈 문자열)
    pub async fn generate_image(&self, prompt: &str, size: ImageSize, quality: ImageQuality) -> Result<String> {
        let response = self
            .post("/images/generations", &image_request(prompt, size, quality))
            .await?;
        Ok(response
            .pointer("/data/0/url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    pub async fn generate_nft_artwork(&self, description: &str) -> Result<String> {
        self.generate_image(&nft_artwork_prompt(description), ImageSize::Square, ImageQuality::Hd)
            .await
    }

    /// 원본 이미지 URL을 내려받아 1024x1024 variation 2장 생성
    pub async fn generate_variations(&self, image_url: &str) -> Result<Vec<String>> {
        let api_key = self.api_key()?;

        let image = self
            .client
            .get(image_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        if image.len() >= MAX_VARIATION_IMAGE_BYTES {
            bail!("Source image must be smaller than 4MB");
        }

        let response = self
            .client
            .post(format!("{}/images/variations", self.base_url))
            .bearer_auth(api_key)
            .multipart(variation_form(image.to_vec())?)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Invalid OpenAI response")?;
        Ok(image_urls(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request() {
        let body = chat_request("What is my SOL balance?");
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["temperature"], 0);
        assert_eq!(
            body["messages"],
            json!([{ "role": "user", "content": "What is my SOL balance?" }])
        );
    }

    #[test]
    fn test_image_request() {
        let body = image_request("a cat", ImageSize::Portrait, ImageQuality::Standard);
        assert_eq!(body["model"], "dall-e-3");
        assert_eq!(body["n"], 1);
        assert_eq!(body["size"], "1024x1792");
        assert_eq!(body["quality"], "standard");
    }

    #[test]
    fn test_nft_prompt_wraps_description() {
        let prompt = nft_artwork_prompt("a neon fox");
        assert!(prompt.contains("description: a neon fox."));
        assert!(prompt.ends_with("suitable for blockchain art collection."));
    }

    #[test]
    fn test_image_urls() {
        let response = json!({ "data": [{ "url": "https://img/1.png" }, { "b64_json": "..." }] });
        assert_eq!(image_urls(&response), vec!["https://img/1.png".to_string(), String::new()]);
        assert!(image_urls(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_key_fails_without_request() {
        let service = OpenAiService::new(Client::new(), "http://127.0.0.1:9", None);
        assert!(!service.is_configured());
        let err = service.complete("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API key not configured");

        let err = service.generate_variations("http://127.0.0.1:9/a.png").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API key not configured");
    }
}
