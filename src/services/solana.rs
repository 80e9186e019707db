//! Solana RPC Service
//!
//! Solana JSON-RPC 호출 (HTTP POST 하나당 메서드 하나)
//!
//! # Methods
//! - `getBalance`: SOL 잔고 (lamports → SOL)
//! - `getTokenAccountsByOwner` (jsonParsed): SPL 토큰 잔고, 보유 NFT, NFT 보유 게이트
//! - `getSignatureStatuses`: 크립토 결제 확인
//! - `getHealth`: RPC 엔드포인트 헬스체크

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

/// SPL Token 프로그램
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// 1 SOL = 10^9 lamports
pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL
}

/// JSON-RPC 2.0 요청 본문
pub(crate) fn rpc_request(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

/// 응답에서 `result` 추출 (`error` 가 있으면 실패)
pub(crate) fn rpc_result(response: Value) -> Result<Value> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown RPC error");
        return Err(anyhow!("RPC error: {}", message));
    }
    response
        .get("result")
        .cloned()
        .ok_or_else(|| anyhow!("RPC response missing result"))
}

/// 첫 번째 토큰 계정의 uiAmount (계정이 없거나 null이면 0)
pub(crate) fn first_token_ui_amount(result: &Value) -> f64 {
    result
        .pointer("/value/0/account/data/parsed/info/tokenAmount/uiAmount")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// 보유 NFT (decimals 0, 수량 1 인 토큰 계정)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNft {
    pub mint: String,
    pub token_account: String,
}

fn parsed_accounts(result: &Value) -> impl Iterator<Item = (&Value, &Value)> {
    result
        .get("value")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let info = entry.pointer("/account/data/parsed/info")?;
            Some((entry, info))
        })
}

pub(crate) fn nft_accounts(result: &Value) -> Vec<OwnedNft> {
    parsed_accounts(result)
        .filter(|(_, info)| {
            info.pointer("/tokenAmount/decimals").and_then(Value::as_u64) == Some(0)
                && info.pointer("/tokenAmount/amount").and_then(Value::as_str) == Some("1")
        })
        .filter_map(|(entry, info)| {
            Some(OwnedNft {
                mint: info.get("mint")?.as_str()?.to_string(),
                token_account: entry.get("pubkey")?.as_str()?.to_string(),
            })
        })
        .collect()
}

/// 해당 mint 의 토큰을 1개 이상 보유하는지
pub(crate) fn holds_mint(result: &Value, mint: &str) -> bool {
    parsed_accounts(result).any(|(_, info)| {
        info.get("mint").and_then(Value::as_str) == Some(mint)
            && info
                .pointer("/tokenAmount/uiAmount")
                .and_then(Value::as_f64)
                .map_or(false, |amount| amount > 0.0)
    })
}

/// 서명이 confirmed/finalized 이고 실행 에러가 없으면 true
pub(crate) fn signature_succeeded(result: &Value) -> bool {
    match result.pointer("/value/0") {
        Some(status) if !status.is_null() => {
            let confirmed = matches!(
                status.get("confirmationStatus").and_then(Value::as_str),
                Some("confirmed") | Some("finalized")
            );
            let failed = status.get("err").map_or(false, |e| !e.is_null());
            confirmed && !failed
        }
        _ => false,
    }
}

/// Solana RPC 클라이언트
///
/// 기본 RPC URL은 설정값, 헬스체크는 임의 URL 대상
pub struct SolanaService {
    client: Client,
    rpc_url: String,
}

impl SolanaService {
    pub fn new(client: Client, rpc_url: &str) -> Self {
        Self {
            client,
            rpc_url: rpc_url.to_string(),
        }
    }

    async fn call_at(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(&rpc_request(method, params))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .with_context(|| format!("Invalid {} response", method))?;
        rpc_result(response)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.call_at(&self.rpc_url, method, params).await
    }

    /// SOL 잔고
    pub async fn get_balance(&self, address: &str) -> Result<f64> {
        let result = self
            .call("getBalance", json!([address, { "commitment": "confirmed" }]))
            .await?;
        let lamports = result
            .get("value")
            .and_then(Value::as_u64)
            .context("getBalance returned no value")?;
        Ok(lamports_to_sol(lamports))
    }

    /// SPL 토큰 잔고 (토큰 계정이 없으면 0)
    pub async fn get_token_balance(&self, mint: &str, owner: &str) -> Result<f64> {
        let result = self
            .call(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;
        Ok(first_token_ui_amount(&result))
    }

    async fn token_accounts(&self, owner: &str) -> Result<Value> {
        self.call(
            "getTokenAccountsByOwner",
            json!([owner, { "programId": TOKEN_PROGRAM_ID }, { "encoding": "jsonParsed" }]),
        )
        .await
    }

    /// 지갑이 보유한 NFT 목록
    pub async fn get_nfts_by_owner(&self, owner: &str) -> Result<Vec<OwnedNft>> {
        Ok(nft_accounts(&self.token_accounts(owner).await?))
    }

    /// NFT 보유 게이트. RPC 실패는 미보유로 처리
    pub async fn owns_collection(&self, owner: &str, collection_mint: &str) -> bool {
        match self.token_accounts(owner).await {
            Ok(result) => holds_mint(&result, collection_mint),
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "NFT ownership lookup failed");
                false
            }
        }
    }

    /// 트랜잭션 서명 확인
    pub async fn verify_signature(&self, signature: &str) -> Result<bool> {
        let result = self
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": true }]),
            )
            .await?;
        Ok(signature_succeeded(&result))
    }

    /// 주어진 RPC URL의 `getHealth` 결과가 "ok" 인지
    pub async fn check_health(&self, url: &str) -> bool {
        match self.call_at(url, "getHealth", json!([])).await {
            Ok(result) => result.as_str() == Some("ok"),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "RPC health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(lamports_to_sol(0), 0.0);
        assert_eq!(lamports_to_sol(1_500_000_000), 1.5);
        assert_eq!(lamports_to_sol(1), 0.000000001);
    }

    #[test]
    fn test_rpc_request_body() {
        let body = rpc_request("getHealth", json!([]));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "getHealth");
        assert_eq!(body["params"], json!([]));
    }

    #[test]
    fn test_rpc_result_error() {
        let err = rpc_result(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32602, "message": "Invalid param"}}))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid param"));

        let ok = rpc_result(json!({"jsonrpc": "2.0", "id": 1, "result": "ok"})).unwrap();
        assert_eq!(ok, "ok");
    }

    #[test]
    fn test_token_ui_amount() {
        let result = json!({
            "value": [{
                "account": {"data": {"parsed": {"info": {"tokenAmount": {"uiAmount": 12.5}}}}}
            }]
        });
        assert_eq!(first_token_ui_amount(&result), 12.5);
        assert_eq!(first_token_ui_amount(&json!({"value": []})), 0.0);

        let null_amount = json!({
            "value": [{"account": {"data": {"parsed": {"info": {"tokenAmount": {"uiAmount": null}}}}}}]
        });
        assert_eq!(first_token_ui_amount(&null_amount), 0.0);
    }

    fn token_account(pubkey: &str, mint: &str, amount: &str, decimals: u64, ui_amount: f64) -> Value {
        json!({
            "pubkey": pubkey,
            "account": {"data": {"parsed": {"info": {
                "mint": mint,
                "tokenAmount": {"amount": amount, "decimals": decimals, "uiAmount": ui_amount}
            }}}}
        })
    }

    #[test]
    fn test_nft_accounts_skip_fungible_tokens() {
        let result = json!({
            "value": [
                token_account("Acc1", "NftMint1", "1", 0, 1.0),
                token_account("Acc2", "UsdcMint", "2500000", 6, 2.5),
                token_account("Acc3", "NftMint2", "0", 0, 0.0),
            ]
        });
        assert_eq!(
            nft_accounts(&result),
            vec![OwnedNft {
                mint: "NftMint1".to_string(),
                token_account: "Acc1".to_string(),
            }]
        );
        assert!(nft_accounts(&json!({"value": []})).is_empty());
    }

    #[test]
    fn test_holds_mint() {
        let result = json!({
            "value": [
                token_account("Acc1", "Collection", "0", 0, 0.0),
                token_account("Acc2", "Other", "1", 0, 1.0),
            ]
        });
        assert!(!holds_mint(&result, "Collection"));
        assert!(holds_mint(&result, "Other"));
        assert!(!holds_mint(&json!({}), "Other"));
    }

    #[test]
    fn test_signature_status() {
        let finalized = json!({"value": [{"confirmationStatus": "finalized", "err": null}]});
        assert!(signature_succeeded(&finalized));

        let processed = json!({"value": [{"confirmationStatus": "processed", "err": null}]});
        assert!(!signature_succeeded(&processed));

        let failed = json!({"value": [{"confirmationStatus": "confirmed", "err": {"InstructionError": [0, "Custom"]}}]});
        assert!(!signature_succeeded(&failed));

        assert!(!signature_succeeded(&json!({"value": [null]})));
    }
}
