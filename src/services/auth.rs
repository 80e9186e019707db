//! Auth Provider Service
//!
//! 호스팅 Auth provider(GoTrue 호환 REST) 위임
//!
//! # Endpoints
//!
//! ```text
//! POST /auth/v1/token?grant_type=password   로그인
//! POST /auth/v1/signup                      가입
//! GET  /auth/v1/user                        토큰 → 사용자
//! POST /auth/v1/logout                      세션 폐기
//! ```
//!
//! 모든 요청에 `apikey` 헤더(anon key) 포함

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthSettings;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    /// provider가 요청을 거부 (잘못된 자격 증명, 만료 토큰 등)
    #[error("{0}")]
    Rejected(String),

    #[error("Auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// provider 사용자 (필요한 필드만)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

/// 로그인/가입 결과
///
/// 이메일 확인이 필요한 가입은 session 없이 user만 반환됨
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session: Option<Value>,
    pub user: Value,
}

/// provider 에러 본문에서 메시지 추출
///
/// `error_description` → `msg` → `message` → `error` 순서
pub(crate) fn provider_message(body: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// 토큰 응답 → (session, user)
pub(crate) fn split_session(body: Value) -> AuthSession {
    if body.get("access_token").is_some() {
        let user = body.get("user").cloned().unwrap_or(Value::Null);
        AuthSession {
            session: Some(body),
            user,
        }
    } else {
        AuthSession {
            session: None,
            user: body,
        }
    }
}

pub struct AuthService {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl AuthService {
    pub fn new(client: Client, settings: &AuthSettings) -> Self {
        Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/auth/v1{}", self.base_url, path))
            .header("apikey", &self.anon_key)
    }

    async fn read_json(response: Response, fallback: &str) -> Result<Value, AuthProviderError> {
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        if status.is_success() {
            Ok(body)
        } else {
            Err(AuthProviderError::Rejected(
                provider_message(&body).unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = Self::read_json(response, "Failed to sign in").await?;
        Ok(split_session(body))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
        wallet_address: Option<&str>,
    ) -> Result<AuthSession, AuthProviderError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name, "wallet_address": wallet_address },
            }))
            .send()
            .await?;
        let body = Self::read_json(response, "Failed to sign up").await?;
        Ok(split_session(body))
    }

    /// access token → provider 사용자
    pub async fn get_user(&self, access_token: &str) -> Result<ProviderUser, AuthProviderError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;
        let body = Self::read_json(response, "Invalid session").await?;
        serde_json::from_value(body)
            .map_err(|e| AuthProviderError::Rejected(format!("Unexpected user payload: {}", e)))
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::read_json(response, "Failed to sign out").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_priority() {
        let body = json!({"error": "invalid_grant", "error_description": "Invalid login credentials"});
        assert_eq!(provider_message(&body).as_deref(), Some("Invalid login credentials"));

        let body = json!({"code": 422, "msg": "User already registered"});
        assert_eq!(provider_message(&body).as_deref(), Some("User already registered"));

        assert_eq!(provider_message(&Value::Null), None);
    }

    #[test]
    fn test_split_session() {
        let token = json!({"access_token": "jwt", "token_type": "bearer", "user": {"id": "u1"}});
        let session = split_session(token);
        assert!(session.session.is_some());
        assert_eq!(session.user["id"], "u1");

        let pending = split_session(json!({"id": "u2", "email": "a@b.c"}));
        assert!(pending.session.is_none());
        assert_eq!(pending.user["id"], "u2");
    }

    #[test]
    fn test_request_carries_api_key() {
        let service = AuthService::new(
            Client::new(),
            &AuthSettings {
                url: "https://auth.example/".to_string(),
                anon_key: "anon".to_string(),
            },
        );
        let request = service
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "https://auth.example/auth/v1/token?grant_type=password");
        assert_eq!(request.headers()["apikey"], "anon");
    }
}
