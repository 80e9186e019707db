//! Services Module
//!
//! 외부 서비스 어댑터 레이어
//!
//! # Services
//! - `MarketService`: CoinGecko 시장 데이터
//! - `JupiterService`: Jupiter 스왑 견적/트랜잭션
//! - `SolanaService`: Solana JSON-RPC
//! - `OpenAiService`: LLM + 이미지 생성
//! - `AuthService`: 호스팅 Auth provider
//! - `PaymentService`: 카드/크립토 결제
//! - `api_keys`: API key 생성/해시

pub mod api_keys;
mod auth;
mod jupiter;
mod market;
mod openai;
mod payments;
mod solana;

pub use auth::{AuthProviderError, AuthService, AuthSession, ProviderUser};
pub use jupiter::JupiterService;
pub use market::MarketService;
pub use openai::{nft_artwork_prompt, OpenAiService};
pub use payments::{CryptoPaymentRequest, PaymentService};
pub use solana::{lamports_to_sol, OwnedNft, SolanaService};
