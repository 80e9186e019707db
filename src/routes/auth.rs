//! Auth Endpoints
//!
//! 자격 증명 검증은 모두 호스팅 Auth provider에 위임.
//! 이 서버는 provider 응답을 전달하고 `users` row만 관리.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{required, ApiJson, MessageResponse};
use crate::db::{users::NewUser, User};
use crate::error::ApiError;
use crate::middleware::auth::bearer_token;
use crate::services::{AuthProviderError, AuthSession};
use crate::types::SolanaAddress;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WalletSignInRequest {
    pub wallet_address: Option<String>,
    /// `message` 에 대한 ed25519 서명 (base58)
    pub signature: Option<String>,
    /// 지갑이 서명한 원문. 지갑 주소를 포함해야 함
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Option<Value>,
    pub user: Option<Value>,
}

impl From<AuthSession> for SessionResponse {
    fn from(auth: AuthSession) -> Self {
        Self {
            session: auth.session,
            user: Some(auth.user).filter(|u| !u.is_null()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletSignInResponse {
    pub user: User,
    pub created: bool,
}

/// 지갑 로그인 사용자의 합성 이메일
pub fn wallet_email(wallet_address: &str) -> String {
    format!("{}@wallet.local", wallet_address)
}

fn credentials<'a>(email: Option<&'a str>, password: Option<&'a str>) -> Result<(&'a str, &'a str), ApiError> {
    match (required(email), password.filter(|p| !p.is_empty())) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(ApiError::BadRequest("Email and password are required".to_string())),
    }
}

fn provider_unavailable(e: AuthProviderError) -> ApiError {
    tracing::error!(error = %e, "Auth provider request failed");
    ApiError::ServiceUnavailable("Auth provider".to_string())
}

/// POST /api/auth/login
///
/// 거부 시 401 + provider 메시지
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (email, password) = credentials(req.email.as_deref(), req.password.as_deref())?;

    match state.auth.sign_in(email, password).await {
        Ok(session) => Ok(Json(session.into())),
        Err(AuthProviderError::Rejected(message)) => Err(ApiError::AuthFailed(message)),
        Err(e) => Err(provider_unavailable(e)),
    }
}

/// POST /api/auth/register
///
/// 거부 시 400 + provider 메시지.
/// provider 사용자 id로 `users` row 생성 (이미 있으면 유지)
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (email, password) = credentials(req.email.as_deref(), req.password.as_deref())?;

    let wallet_address = match required(req.wallet_address.as_deref()) {
        Some(addr) => Some(SolanaAddress::new(addr).map_err(ApiError::ValidationError)?),
        None => None,
    };

    let auth = match state
        .auth
        .sign_up(
            email,
            password,
            req.full_name.as_deref(),
            wallet_address.as_ref().map(SolanaAddress::as_str),
        )
        .await
    {
        Ok(auth) => auth,
        Err(AuthProviderError::Rejected(message)) => return Err(ApiError::BadRequest(message)),
        Err(e) => return Err(provider_unavailable(e)),
    };

    let provider_id = auth
        .user
        .get("id")
        .and_then(Value::as_str)
        .and_then(|id| id.parse().ok());

    if let Some(id) = provider_id {
        if state.db.find_user(id).await?.is_none() {
            let new_user = NewUser {
                id: Some(id),
                email: email.to_string(),
                full_name: req.full_name.clone(),
                wallet_address: wallet_address.map(String::from),
            };
            state.db.insert_user(&new_user).await?;
            tracing::info!(user_id = %id, "User registered");
        }
    }

    Ok(Json(auth.into()))
}

/// GET /api/auth/session
///
/// 토큰이 없거나 만료되면 `{session: null, user: null}`
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let empty = SessionResponse {
        session: None,
        user: None,
    };

    let Some(token) = bearer_token(&headers) else {
        return Ok(Json(empty));
    };

    let provider_user = match state.auth.get_user(token).await {
        Ok(user) => user,
        Err(AuthProviderError::Rejected(_)) => return Ok(Json(empty)),
        Err(e) => return Err(provider_unavailable(e)),
    };

    let user = state.db.find_user(provider_user.id).await?;

    Ok(Json(SessionResponse {
        session: Some(json!({
            "access_token": token,
            "user_id": provider_user.id,
            "email": provider_user.email,
        })),
        user: user.and_then(|u| serde_json::to_value(u).ok()),
    }))
}

/// 서명 검증까지 통과한 지갑 주소
pub fn verified_wallet(req: &WalletSignInRequest) -> Result<SolanaAddress, ApiError> {
    let (Some(address), Some(signature), Some(message)) = (
        required(req.wallet_address.as_deref()),
        required(req.signature.as_deref()),
        req.message.as_deref().filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "wallet_address, signature and message are required".to_string(),
        ));
    };
    let address = SolanaAddress::new(address).map_err(ApiError::ValidationError)?;

    if !message.contains(address.as_str()) {
        return Err(ApiError::AuthFailed("Signed message must contain the wallet address".to_string()));
    }
    address.verify_signature(message.as_bytes(), signature).map_err(|reason| {
        tracing::warn!(wallet = %address, reason = %reason, "Wallet signature rejected");
        ApiError::AuthFailed("Invalid wallet signature".to_string())
    })?;

    Ok(address)
}

/// POST /api/auth/wallet
///
/// 서명 검증 후 지갑 주소로 사용자 조회, 없으면 `<wallet>@wallet.local` 로 생성
pub async fn wallet_sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<WalletSignInRequest>,
) -> Result<Json<WalletSignInResponse>, ApiError> {
    let address = verified_wallet(&req)?;

    if let Some(user) = state.db.find_user_by_wallet(address.as_str()).await? {
        return Ok(Json(WalletSignInResponse { user, created: false }));
    }

    let new_user = NewUser {
        id: None,
        email: wallet_email(address.as_str()),
        full_name: None,
        wallet_address: Some(address.to_string()),
    };
    let user = state.db.insert_user(&new_user).await?;
    tracing::info!(user_id = %user.id, wallet = %address, "Wallet user created");

    Ok(Json(WalletSignInResponse { user, created: true }))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;

    match state.auth.sign_out(token).await {
        Ok(()) => Ok(Json(MessageResponse::ok("Signed out"))),
        Err(AuthProviderError::Rejected(message)) => Err(ApiError::AuthFailed(message)),
        Err(e) => Err(provider_unavailable(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_wallet_email() {
        assert_eq!(
            wallet_email("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v@wallet.local"
        );
    }

    #[test]
    fn test_credentials_required() {
        assert!(credentials(Some("a@b.c"), Some("pw")).is_ok());

        for (email, password) in [(None, Some("pw")), (Some("a@b.c"), None), (Some(" "), Some("pw")), (Some("a@b.c"), Some(""))] {
            let err = credentials(email, password).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), "Invalid request: Email and password are required");
        }
    }

    fn signed_request(message: impl Fn(&str) -> String) -> WalletSignInRequest {
        use ed25519_dalek::{Signer, SigningKey};

        let signing_key = SigningKey::from_bytes(&[42u8; 32]);
        let address = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();
        let message = message(&address);
        let signature = bs58::encode(signing_key.sign(message.as_bytes()).to_bytes()).into_string();
        WalletSignInRequest {
            wallet_address: Some(address),
            signature: Some(signature),
            message: Some(message),
        }
    }

    #[test]
    fn test_wallet_signature_accepted() {
        let req = signed_request(|address| format!("Sign in to Agentic\nWallet: {}", address));
        let address = verified_wallet(&req).unwrap();
        assert_eq!(Some(address.as_str()), req.wallet_address.as_deref());
    }

    #[test]
    fn test_wallet_signature_rejected() {
        let mut req = signed_request(|address| format!("Sign in: {}", address));
        req.message = req.message.map(|m| format!("{} (edited)", m));
        let err = verified_wallet(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Authentication failed: Invalid wallet signature");

        // 주소가 없는 메시지는 다른 지갑용 서명 재사용으로 간주
        let req = signed_request(|_| "Sign in".to_string());
        assert_eq!(verified_wallet(&req).unwrap_err().status(), StatusCode::UNAUTHORIZED);

        let req = WalletSignInRequest {
            signature: None,
            ..signed_request(|address| address.to_string())
        };
        assert_eq!(verified_wallet(&req).unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_session_response_drops_null_user() {
        let response: SessionResponse = AuthSession {
            session: None,
            user: Value::Null,
        }
        .into();
        assert!(response.user.is_none());
    }
}
