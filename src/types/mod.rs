//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의
//!
//! DB 컬럼은 TEXT로 저장하고, 요청 경계에서 serde enum으로 허용 값만 통과시킴

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// 문자열 enum 정의 매크로
///
/// serde 이름, `as_str()`, `Display`, `FromStr`, 허용 값 목록(`ALL`)을 한 번에 생성
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// 에러 메시지용 허용 값 목록 ("a, b, c")
            pub fn allowed() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("Invalid value '{}'. Must be one of: {}", other, Self::allowed())),
                }
            }
        }
    };
}

string_enum! {
    /// 사용자 권한
    pub enum UserRole { User => "user", Admin => "admin", SuperAdmin => "super_admin" }
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }
}

string_enum! {
    /// 계정 상태
    pub enum UserStatus { Active => "active", Suspended => "suspended", Banned => "banned" }
}

impl UserStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, UserStatus::Suspended | UserStatus::Banned)
    }
}

string_enum! {
    pub enum Plan { Free => "free", Pro => "pro", Enterprise => "enterprise" }
}

string_enum! {
    pub enum AgentType {
        Builder => "builder",
        Worker => "worker",
        Crawler => "crawler",
        Generator => "generator",
        Sync => "sync",
    }
}

string_enum! {
    pub enum AgentStatus { Active => "active", Paused => "paused", Error => "error" }
}

string_enum! {
    /// 에이전트 메모리 종류
    pub enum MemoryKind { Short => "short", Long => "long", Vector => "vector" }
}

string_enum! {
    pub enum FeeType { Base => "base", Network => "network", Agent => "agent", Priority => "priority" }
}

string_enum! {
    pub enum ConnectorType {
        Phantom => "phantom",
        Solflare => "solflare",
        Backpack => "backpack",
        Ledger => "ledger",
        Coinbase => "coinbase",
        WalletConnect => "walletconnect",
    }
}

string_enum! {
    pub enum OracleType { Pyth => "pyth", Coinbase => "coinbase", Chainlink => "chainlink", Custom => "custom" }
}

string_enum! {
    /// Solana 클러스터
    pub enum Network { MainnetBeta => "mainnet-beta", Devnet => "devnet", Testnet => "testnet" }
}

string_enum! {
    pub enum EndpointType { Http => "http", Websocket => "websocket" }
}

string_enum! {
    pub enum HealthStatus { Healthy => "healthy", Unhealthy => "unhealthy", Unknown => "unknown" }
}

string_enum! {
    pub enum AddonType {
        AiBuilder => "ai_builder",
        NftGenerator => "nft_generator",
        DefiAutomation => "defi_automation",
        MarketScanner => "market_scanner",
        Webhook => "webhook",
        CustomTool => "custom_tool",
    }
}

string_enum! {
    pub enum AuditStatus { Success => "success", Failure => "failure", Error => "error" }
}

string_enum! {
    pub enum SettingType { Text => "string", Number => "number", Boolean => "boolean", Json => "json" }
}

string_enum! {
    pub enum BillingCycle { Monthly => "monthly", Yearly => "yearly" }
}

string_enum! {
    /// 크립토 결제 통화
    pub enum PaymentCurrency { Sol => "SOL", Usdc => "USDC" }
}

string_enum! {
    /// 이미지 생성 크기
    pub enum ImageSize { Square => "1024x1024", Landscape => "1792x1024", Portrait => "1024x1792" }
}

string_enum! {
    pub enum ImageQuality { Standard => "standard", Hd => "hd" }
}

/// Solana 주소 타입 (base58, 32 bytes 공개키)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SolanaAddress(String);

impl SolanaAddress {
    pub fn new(addr: &str) -> Result<Self, String> {
        let addr = addr.trim();
        match bs58::decode(addr).into_vec() {
            Ok(bytes) if bytes.len() == 32 => Ok(Self(addr.to_string())),
            _ => Err("Invalid Solana address format".to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 지갑의 ed25519 서명(base58) 검증. 주소 자체가 공개키
    pub fn verify_signature(&self, message: &[u8], signature: &str) -> Result<(), String> {
        let key_bytes: [u8; 32] = bs58::decode(&self.0)
            .into_vec()
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| "Invalid Solana address format".to_string())?;
        let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| "Invalid wallet public key".to_string())?;

        let sig_bytes: [u8; 64] = bs58::decode(signature.trim())
            .into_vec()
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| "Invalid signature format".to_string())?;

        key.verify(message, &Signature::from_bytes(&sig_bytes))
            .map_err(|_| "Signature does not match wallet".to_string())
    }
}

impl TryFrom<String> for SolanaAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<SolanaAddress> for String {
    fn from(addr: SolanaAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 1-based 페이지네이션 (관리자 목록 화면 공통)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// 관리자 테이블 기본 페이지 크기
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// page 가 없거나 0 이하이면 1페이지
    pub fn new(page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: Self::DEFAULT_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    /// ceil(total / per_page)
    pub fn total_pages(&self, total: i64) -> i64 {
        let per_page = self.per_page as i64;
        (total.max(0) + per_page - 1) / per_page
    }
}

/// `all` 또는 빈 값이면 필터 미적용
pub fn filter_value(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

/// 목록 필터 값 (`all`/빈 값은 None, 그 외는 그대로 비교)
pub fn text_filter(value: Option<&str>) -> Option<String> {
    filter_value(value).map(str::to_string)
}
