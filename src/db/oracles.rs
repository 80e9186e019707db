//! 가격 오라클 + 피드

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, Database, OracleFeed, PriceOracle};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleUpdate {
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub config: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFeed {
    pub oracle_id: Uuid,
    pub symbol: String,
    pub feed_id: String,
    pub token_address: Option<String>,
    pub refresh_interval_seconds: Option<i32>,
}

impl NewFeed {
    pub const DEFAULT_REFRESH_SECS: i32 = 60;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedUpdate {
    pub refresh_interval_seconds: Option<i32>,
    pub enabled: Option<bool>,
    pub last_price: Option<f64>,
}

pub(crate) fn list_feeds_query<'a>(oracle_id: Option<Uuid>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM oracle_feeds WHERE TRUE");
    push_eq(&mut qb, "oracle_id", oracle_id);
    qb.push(" ORDER BY symbol");
    qb
}

impl Database {
    pub async fn list_oracles(&self) -> Result<Vec<PriceOracle>> {
        let oracles = sqlx::query_as::<_, PriceOracle>("SELECT * FROM price_oracles ORDER BY priority")
            .fetch_all(self.pool())
            .await?;
        Ok(oracles)
    }

    pub async fn update_oracle(&self, id: Uuid, update: &OracleUpdate) -> Result<PriceOracle> {
        let oracle = sqlx::query_as::<_, PriceOracle>(
            r#"
            UPDATE price_oracles SET
                enabled = COALESCE($2, enabled),
                priority = COALESCE($3, priority),
                config = COALESCE($4, config),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.enabled)
        .bind(update.priority)
        .bind(&update.config)
        .fetch_one(self.pool())
        .await?;
        Ok(oracle)
    }

    pub async fn list_feeds(&self, oracle_id: Option<Uuid>) -> Result<Vec<OracleFeed>> {
        let feeds = list_feeds_query(oracle_id)
            .build_query_as::<OracleFeed>()
            .fetch_all(self.pool())
            .await?;
        Ok(feeds)
    }

    pub async fn create_feed(&self, input: &NewFeed) -> Result<OracleFeed> {
        let feed = sqlx::query_as::<_, OracleFeed>(
            r#"
            INSERT INTO oracle_feeds (oracle_id, symbol, feed_id, token_address, refresh_interval_seconds, enabled)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(input.oracle_id)
        .bind(&input.symbol)
        .bind(&input.feed_id)
        .bind(&input.token_address)
        .bind(input.refresh_interval_seconds.unwrap_or(NewFeed::DEFAULT_REFRESH_SECS))
        .fetch_one(self.pool())
        .await?;
        Ok(feed)
    }

    /// 피드 업데이트
    ///
    /// last_updated 는 가격이 주어진 경우에만 갱신
    pub async fn update_feed(&self, id: Uuid, update: &FeedUpdate) -> Result<OracleFeed> {
        let feed = sqlx::query_as::<_, OracleFeed>(
            r#"
            UPDATE oracle_feeds SET
                refresh_interval_seconds = COALESCE($2, refresh_interval_seconds),
                enabled = COALESCE($3, enabled),
                last_price = COALESCE($4, last_price),
                last_updated = CASE WHEN $4 IS NULL THEN last_updated ELSE NOW() END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.refresh_interval_seconds)
        .bind(update.enabled)
        .bind(update.last_price)
        .fetch_one(self.pool())
        .await?;
        Ok(feed)
    }

    pub async fn delete_feed(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM oracle_feeds WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// 수동 가격 지정
    pub async fn override_price(&self, feed_id: Uuid, price: f64) -> Result<OracleFeed> {
        let update = FeedUpdate {
            last_price: Some(price),
            ..Default::default()
        };
        self.update_feed(feed_id, &update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_feeds_query() {
        assert_eq!(
            list_feeds_query(None).sql(),
            "SELECT * FROM oracle_feeds WHERE TRUE ORDER BY symbol"
        );
        assert_eq!(
            list_feeds_query(Some(Uuid::nil())).sql(),
            "SELECT * FROM oracle_feeds WHERE TRUE AND oracle_id = $1 ORDER BY symbol"
        );
    }

    #[test]
    fn test_new_feed_parses_without_interval() {
        let feed: NewFeed = serde_json::from_str(&format!(
            r#"{{"oracle_id":"{}","symbol":"SOL/USD","feed_id":"0xef0d"}}"#,
            Uuid::nil()
        ))
        .unwrap();
        assert_eq!(feed.refresh_interval_seconds, None);
        assert_eq!(NewFeed::DEFAULT_REFRESH_SECS, 60);
    }
}
