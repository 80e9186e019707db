//! Database Module
//!
//! 호스팅 Postgres에 대한 얇은 래퍼.
//!
//! 모든 연산은 같은 형태:
//! 입력 검증(라우트) → 테이블 하나에 쿼리 하나 → row 반환 또는 하위 에러 전파
//!
//! - 트랜잭션, 재시도, 캐시 없음 (DB가 보장하는 것 이상을 약속하지 않음)
//! - 여러 단계 작업(agent import/export, 환불)은 순차 호출이며 롤백 없음
//! - 부분 업데이트는 `COALESCE($n, column)` 로 한 번의 UPDATE에 처리
//!
//! 테이블 묶음별로 파일을 나누고 모두 `impl Database` 블록으로 확장

mod models;
pub mod addons;
pub mod agents;
pub mod analytics;
pub mod audit;
pub mod billing;
pub mod fees;
pub mod oracles;
pub mod rpc;
pub mod sdk;
pub mod settings;
pub mod users;
pub mod wallets;

pub use models::*;

use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10 (트래픽에 따라 조정)
    /// - min_connections: 1 (idle 시 최소 유지)
    /// - acquire_timeout: 3초 (커넥션 획득 대기)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = Self::pool_options().connect(database_url).await?;
        Ok(Self { pool })
    }

    /// 실제 연결 없이 풀 생성 (첫 쿼리 시점에 연결)
    ///
    /// 라우터 테스트처럼 DB 없이 요청 검증만 확인할 때 사용
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(1))
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    fn pool_options() -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// `AND column = value` 필터 (값이 없으면 생략)
///
/// column은 항상 코드 상수 (사용자 입력 아님)
pub(crate) fn push_eq<'a, T>(qb: &mut QueryBuilder<'a, Postgres>, column: &'static str, value: Option<T>)
where
    T: 'a + sqlx::Encode<'a, Postgres> + sqlx::Type<Postgres> + Send,
{
    if let Some(value) = value {
        qb.push(" AND ").push(column).push(" = ").push_bind(value);
    }
}

/// LIKE 패턴용 이스케이프 (`%`, `_`, `\`)
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_eq_skips_missing_values() {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM users WHERE TRUE");
        push_eq(&mut qb, "status", Some("active"));
        push_eq::<&str>(&mut qb, "role", None);
        push_eq(&mut qb, "plan", Some("pro"));
        assert_eq!(
            qb.sql(),
            "SELECT * FROM users WHERE TRUE AND status = $1 AND plan = $2"
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("alice"), "alice");
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
