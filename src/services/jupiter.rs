//! Jupiter Swap Service
//!
//! Jupiter v6 aggregator API 래퍼 (읽기 전용)
//!
//! - `GET  /quote`  최적 경로 견적
//! - `POST /swap`   견적으로 직렬화된 스왑 트랜잭션 생성 (서명/전송은 클라이언트)
//! - `GET  /tokens` 거래 가능한 토큰 목록

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

pub struct JupiterService {
    client: Client,
    base_url: String,
}

impl JupiterService {
    /// 기본 슬리피지 0.5%
    pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, request: RequestBuilder) -> Result<Value> {
        let value = request
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Invalid Jupiter response")?;
        Ok(value)
    }

    pub(crate) fn quote_request(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        slippage_bps: u16,
    ) -> RequestBuilder {
        self.client.get(format!("{}/quote", self.base_url)).query(&[
            ("inputMint", input_mint.to_string()),
            ("outputMint", output_mint.to_string()),
            ("amount", amount.to_string()),
            ("slippageBps", slippage_bps.to_string()),
        ])
    }

    /// 스왑 견적 (응답 그대로)
    pub async fn quote(&self, input_mint: &str, output_mint: &str, amount: u64, slippage_bps: u16) -> Result<Value> {
        self.fetch(self.quote_request(input_mint, output_mint, amount, slippage_bps))
            .await
    }

    pub(crate) fn swap_request(&self, quote: &Value, user_public_key: &str) -> RequestBuilder {
        self.client.post(format!("{}/swap", self.base_url)).json(&json!({
            "quoteResponse": quote,
            "userPublicKey": user_public_key,
            "wrapAndUnwrapSol": true,
        }))
    }

    /// base64 직렬화된 스왑 트랜잭션
    pub async fn swap_transaction(&self, quote: &Value, user_public_key: &str) -> Result<String> {
        let response = self.fetch(self.swap_request(quote, user_public_key)).await?;
        response
            .get("swapTransaction")
            .and_then(Value::as_str)
            .map(str::to_string)
            .context("Swap response has no swapTransaction")
    }

    pub async fn token_list(&self) -> Result<Value> {
        self.fetch(self.client.get(format!("{}/tokens", self.base_url)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JupiterService {
        JupiterService::new(Client::new(), "https://quote-api.jup.ag/v6/")
    }

    #[test]
    fn test_quote_request_params() {
        let request = service()
            .quote_request(
                "So11111111111111111111111111111111111111112",
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                1_000_000,
                JupiterService::DEFAULT_SLIPPAGE_BPS,
            )
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/v6/quote");
        assert_eq!(
            request.url().query(),
            Some(
                "inputMint=So11111111111111111111111111111111111111112\
                 &outputMint=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v\
                 &amount=1000000&slippageBps=50"
            )
        );
    }

    #[test]
    fn test_swap_request_body() {
        let quote = json!({ "inAmount": "1000000", "outAmount": "142000" });
        let request = service()
            .swap_request(&quote, "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin")
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/v6/swap");
        let body: Value = serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(body["quoteResponse"], quote);
        assert_eq!(body["userPublicKey"], "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");
        assert_eq!(body["wrapAndUnwrapSol"], true);
    }
}
