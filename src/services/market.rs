//! Market Data Service
//!
//! CoinGecko Pro API 래퍼
//!
//! - API 키가 있으면 `x-cg-pro-api-key` 헤더 추가, 없으면 생략
//! - 응답 JSON은 가공 없이 그대로 전달 (필드 선택만)
//! - 캐시 없음: 요청마다 upstream 호출

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;

/// 시장 데이터 조회 서비스
pub struct MarketService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl MarketService {
    /// 상승률 상위 조회 기본 개수
    pub const DEFAULT_GAINERS_LIMIT: u32 = 10;

    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.with_key(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("x-cg-pro-api-key", key),
            None => request,
        }
    }

    async fn fetch(&self, request: RequestBuilder) -> Result<Value> {
        let value = request
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Invalid market data response")?;
        Ok(value)
    }

    pub(crate) fn price_request(&self, token_id: &str) -> RequestBuilder {
        self.get("/simple/price").query(&[
            ("ids", token_id),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
        ])
    }

    /// 토큰 가격 (USD, 24h 변동률 포함) → 응답의 `{tokenId}` 항목
    pub async fn price(&self, token_id: &str) -> Result<Value> {
        let data = self.fetch(self.price_request(token_id)).await?;
        Ok(data.get(token_id).cloned().unwrap_or(Value::Null))
    }

    /// 트렌딩 토큰 → 응답의 `coins` 배열
    pub async fn trending(&self) -> Result<Value> {
        let data = self.fetch(self.get("/search/trending")).await?;
        Ok(data.get("coins").cloned().unwrap_or(Value::Null))
    }

    pub(crate) fn gainers_request(&self, limit: u32) -> RequestBuilder {
        self.get("/coins/markets").query(&[
            ("vs_currency", "usd".to_string()),
            ("order", "price_change_percentage_24h_desc".to_string()),
            ("per_page", limit.to_string()),
            ("page", "1".to_string()),
        ])
    }

    /// 24h 상승률 상위 토큰
    pub async fn top_gainers(&self, limit: u32) -> Result<Value> {
        self.fetch(self.gainers_request(limit)).await
    }

    /// `/coins/{id}` 요청. id는 경로 세그먼트 하나로 인코딩 (`/`, `?` 포함 불가)
    pub(crate) fn token_info_request(&self, token_id: &str) -> Result<RequestBuilder> {
        let mut url = Url::parse(&format!("{}/coins", self.base_url)).context("Invalid market base URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Market base URL cannot have path segments"))?
            .push(token_id);

        Ok(self.with_key(self.client.get(url)).query(&[
            ("localization", "false"),
            ("tickers", "false"),
            ("community_data", "false"),
            ("developer_data", "false"),
        ]))
    }

    /// 토큰 상세 정보 (tickers/community/developer 데이터 제외)
    pub async fn token_info(&self, token_id: &str) -> Result<Value> {
        self.fetch(self.token_info_request(token_id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_request_shape() {
        let service = MarketService::new(
            Client::new(),
            "https://pro-api.coingecko.com/api/v3/",
            Some("cg-key".to_string()),
        );
        let request = service.price_request("solana").build().unwrap();

        assert_eq!(request.url().path(), "/api/v3/simple/price");
        assert_eq!(
            request.url().query(),
            Some("ids=solana&vs_currencies=usd&include_24hr_change=true")
        );
        assert_eq!(request.headers()["x-cg-pro-api-key"], "cg-key");
    }

    #[test]
    fn test_token_id_stays_in_one_path_segment() {
        let service = MarketService::new(Client::new(), "https://pro-api.coingecko.com/api/v3", None);

        let request = service.token_info_request("solana").unwrap().build().unwrap();
        assert_eq!(request.url().path(), "/api/v3/coins/solana");

        let request = service
            .token_info_request("../simple/price?ids=bitcoin")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/v3/coins/..%2Fsimple%2Fprice%3Fids=bitcoin");
        assert!(!request.url().query().unwrap_or_default().contains("ids="));
    }

    #[test]
    fn test_api_key_header_omitted_without_key() {
        let service = MarketService::new(Client::new(), "https://pro-api.coingecko.com/api/v3", None);
        let request = service
            .gainers_request(MarketService::DEFAULT_GAINERS_LIMIT)
            .build()
            .unwrap();

        assert!(request.headers().get("x-cg-pro-api-key").is_none());
        assert!(request.url().query().unwrap_or_default().contains("per_page=10"));
    }
}
