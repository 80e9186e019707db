//! 관리자 대시보드 집계
//!
//! 조회 후 메모리에서 합산 (read-then-render)

use std::collections::HashMap;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

use super::{push_eq, Database, TokenHolding, Transaction};
use crate::types::PageRequest;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    /// 최근 24시간 내 업데이트된 사용자
    pub active_users: i64,
    pub total_transactions: i64,
    /// confirmed 트랜잭션 금액 합
    pub total_volume: f64,
    pub active_agents: i64,
    /// DeFi 포지션 value_usd 합
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenSummary {
    pub token_address: String,
    pub token_symbol: String,
    pub total_holders: i64,
    pub total_supply: f64,
    pub total_value_usd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTotals {
    pub total_tokens: i64,
    pub total_holders: i64,
    pub total_value: f64,
    pub active_tokens: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub tx_type: Option<String>,
    pub status: Option<String>,
}

/// 토큰 주소별 집계 (가치 내림차순)
pub fn aggregate_tokens(holdings: Vec<TokenHolding>) -> Vec<TokenSummary> {
    let mut by_address: HashMap<String, TokenSummary> = HashMap::new();

    for holding in holdings {
        let summary = by_address
            .entry(holding.token_address.clone())
            .or_insert_with(|| TokenSummary {
                token_address: holding.token_address.clone(),
                token_symbol: holding.token_symbol.clone(),
                total_holders: 0,
                total_supply: 0.0,
                total_value_usd: 0.0,
            });
        summary.total_holders += 1;
        summary.total_supply += holding.balance;
        summary.total_value_usd += holding.value_usd;
    }

    let mut tokens: Vec<TokenSummary> = by_address.into_values().collect();
    tokens.sort_by(|a, b| b.total_value_usd.total_cmp(&a.total_value_usd));
    tokens
}

/// active = 보유량이 0보다 큰 토큰
pub fn token_totals(tokens: &[TokenSummary]) -> TokenTotals {
    TokenTotals {
        total_tokens: tokens.len() as i64,
        total_holders: tokens.iter().map(|t| t.total_holders).sum(),
        total_value: tokens.iter().map(|t| t.total_value_usd).sum(),
        active_tokens: tokens.iter().filter(|t| t.total_supply > 0.0).count() as i64,
    }
}

fn push_transaction_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a TransactionFilter) {
    push_eq(qb, "type", crate::types::filter_value(filter.tx_type.as_deref()));
    push_eq(qb, "status", crate::types::filter_value(filter.status.as_deref()));
}

pub(crate) fn list_transactions_query<'a>(
    filter: &'a TransactionFilter,
    page: PageRequest,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM transactions WHERE TRUE");
    push_transaction_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

pub(crate) fn count_transactions_query(filter: &TransactionFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM transactions WHERE TRUE");
    push_transaction_filters(&mut qb, filter);
    qb
}

impl Database {
    pub async fn platform_stats(&self) -> Result<PlatformStats> {
        let (total_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;

        let since = Utc::now() - Duration::hours(24);
        let (active_users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE updated_at >= $1")
            .bind(since)
            .fetch_one(self.pool())
            .await?;

        let (total_transactions,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(self.pool())
            .await?;

        let confirmed: Vec<(f64,)> =
            sqlx::query_as("SELECT amount FROM transactions WHERE status = 'confirmed'")
                .fetch_all(self.pool())
                .await?;

        let (active_agents,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM agent_configurations WHERE is_active = TRUE")
                .fetch_one(self.pool())
                .await?;

        let positions: Vec<(f64,)> = sqlx::query_as("SELECT value_usd FROM defi_positions")
            .fetch_all(self.pool())
            .await?;

        Ok(PlatformStats {
            total_users,
            active_users,
            total_transactions,
            total_volume: confirmed.iter().map(|(amount,)| amount).sum(),
            active_agents,
            total_value: positions.iter().map(|(value,)| value).sum(),
        })
    }

    pub async fn token_holdings(&self) -> Result<Vec<TokenHolding>> {
        let holdings = sqlx::query_as::<_, TokenHolding>(
            "SELECT token_address, token_symbol, balance, value_usd FROM token_portfolios",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(holdings)
    }

    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<Transaction>, i64)> {
        let transactions = list_transactions_query(filter, page)
            .build_query_as::<Transaction>()
            .fetch_all(self.pool())
            .await?;

        let (total,) = count_transactions_query(filter)
            .build_query_as::<(i64,)>()
            .fetch_one(self.pool())
            .await?;

        Ok((transactions, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(address: &str, symbol: &str, balance: f64, value_usd: f64) -> TokenHolding {
        TokenHolding {
            token_address: address.to_string(),
            token_symbol: symbol.to_string(),
            balance,
            value_usd,
        }
    }

    #[test]
    fn test_aggregate_tokens() {
        let tokens = aggregate_tokens(vec![
            holding("So111", "SOL", 2.0, 300.0),
            holding("EPjF", "USDC", 50.0, 50.0),
            holding("So111", "SOL", 1.0, 150.0),
            holding("Dead", "DEAD", 0.0, 0.0),
        ]);

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token_symbol, "SOL");
        assert_eq!(tokens[0].total_holders, 2);
        assert_eq!(tokens[0].total_supply, 3.0);
        assert_eq!(tokens[0].total_value_usd, 450.0);
        assert_eq!(tokens[1].token_symbol, "USDC");

        let totals = token_totals(&tokens);
        assert_eq!(totals.total_tokens, 3);
        assert_eq!(totals.total_holders, 4);
        assert_eq!(totals.total_value, 500.0);
        assert_eq!(totals.active_tokens, 2);
    }

    #[test]
    fn test_empty_holdings() {
        let tokens = aggregate_tokens(Vec::new());
        assert!(tokens.is_empty());
        assert_eq!(
            token_totals(&tokens),
            TokenTotals {
                total_tokens: 0,
                total_holders: 0,
                total_value: 0.0,
                active_tokens: 0
            }
        );
    }

    #[test]
    fn test_transactions_query() {
        let filter = TransactionFilter {
            tx_type: Some("swap".to_string()),
            status: Some("all".to_string()),
        };
        assert_eq!(
            list_transactions_query(&filter, PageRequest::new(Some(1))).sql(),
            "SELECT * FROM transactions WHERE TRUE AND type = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            count_transactions_query(&filter).sql(),
            "SELECT COUNT(*) FROM transactions WHERE TRUE AND type = $1"
        );
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = PlatformStats {
            total_users: 1,
            active_users: 1,
            total_transactions: 0,
            total_volume: 0.0,
            active_agents: 0,
            total_value: 0.0,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert!(json.get("totalUsers").is_some());
        assert!(json.get("activeAgents").is_some());
    }
}
