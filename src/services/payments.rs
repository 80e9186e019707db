//! Payment Service
//!
//! # Flow
//!
//! 1. 카드 결제: Stripe Checkout Session 생성 → 결제 페이지 URL 반환
//! 2. 크립토 결제: 수신 지갑 + 금액 + 만료 시각(30분) 안내
//! 3. 크립토 확인: 사용자가 제출한 트랜잭션 서명을 RPC로 확인 (`SolanaService`)

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::PaymentSettings;
use crate::db::BillingPlan;
use crate::types::{BillingCycle, PaymentCurrency};

/// 크립토 결제 요청 유효 시간
pub const CRYPTO_PAYMENT_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPaymentRequest {
    pub wallet_address: String,
    pub amount: f64,
    pub currency: PaymentCurrency,
    pub expires_at: DateTime<Utc>,
}

/// 요금제 + 결제 주기 → 청구 금액 (센트)
pub fn plan_amount_cents(plan: &BillingPlan, cycle: BillingCycle) -> i64 {
    let price = match cycle {
        BillingCycle::Monthly => plan.price_monthly,
        BillingCycle::Yearly => plan.price_yearly,
    };
    (price * 100.0).round() as i64
}

pub struct PaymentService {
    client: Client,
    settings: PaymentSettings,
}

impl PaymentService {
    pub fn new(client: Client, settings: PaymentSettings) -> Self {
        Self { client, settings }
    }

    /// 카드 결제 사용 가능 여부 (Stripe 키 설정)
    pub fn checkout_enabled(&self) -> bool {
        self.settings.stripe_secret_key.is_some()
    }

    pub fn crypto_enabled(&self) -> bool {
        self.settings.receiving_wallet.is_some()
    }

    pub(crate) fn checkout_request(
        &self,
        secret_key: &str,
        user_id: Uuid,
        plan: &BillingPlan,
        cycle: BillingCycle,
    ) -> RequestBuilder {
        let form = [
            ("mode", "payment".to_string()),
            ("success_url", self.settings.success_url.clone()),
            ("cancel_url", self.settings.cancel_url.clone()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                plan_amount_cents(plan, cycle).to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("{} ({})", plan.display_name, cycle),
            ),
            ("metadata[plan_id]", plan.id.to_string()),
            ("metadata[billing_cycle]", cycle.to_string()),
        ];

        self.client
            .post(format!(
                "{}/checkout/sessions",
                self.settings.stripe_base_url.trim_end_matches('/')
            ))
            .bearer_auth(secret_key)
            .form(&form)
    }

    /// Checkout Session 생성 → 결제 페이지 URL
    pub async fn create_checkout(&self, user_id: Uuid, plan: &BillingPlan, cycle: BillingCycle) -> Result<String> {
        let secret_key = self
            .settings
            .stripe_secret_key
            .as_deref()
            .ok_or_else(|| anyhow!("Payment processor not configured"))?;

        let session = self
            .checkout_request(secret_key, user_id, plan, cycle)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await
            .context("Invalid checkout session response")?;

        let url = session
            .get("url")
            .and_then(Value::as_str)
            .context("Checkout session has no url")?;

        tracing::info!(user_id = %user_id, plan = %plan.name, cycle = %cycle, "Checkout session created");
        Ok(url.to_string())
    }

    /// 크립토 결제 안내 생성
    pub fn crypto_payment_request(
        &self,
        amount: f64,
        currency: PaymentCurrency,
        now: DateTime<Utc>,
    ) -> Result<CryptoPaymentRequest> {
        let wallet_address = self
            .settings
            .receiving_wallet
            .clone()
            .ok_or_else(|| anyhow!("Receiving wallet not configured"))?;

        Ok(CryptoPaymentRequest {
            wallet_address,
            amount,
            currency,
            expires_at: now + Duration::minutes(CRYPTO_PAYMENT_TTL_MINUTES),
        })
    }
}
