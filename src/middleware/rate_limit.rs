//! Rate Limiting Middleware
//!
//! 고정 윈도우(fixed window) 방식의 클라이언트별 요청 제한
//!
//! # Algorithm
//!
//! ```text
//! entry 없음 또는 now > reset_at  →  count = 1, reset_at = now + window, 허용
//! count >= max_requests           →  거부 (429)
//! 그 외                            →  count += 1, 허용
//! ```
//!
//! - 프로세스 메모리에만 보관 (재시작 시 초기화, 인스턴스 간 공유 없음)
//! - 윈도우가 지난 entry는 다음 요청 때 덮어쓰기만 함 (별도 정리 없음)

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitSettings;
use crate::error::ApiError;
use crate::AppState;

/// 제한 대상 경로 prefix
pub const RATE_LIMITED_PREFIX: &str = "/api/";

/// 식별할 수 없는 클라이언트 키
pub const ANONYMOUS_CLIENT: &str = "anonymous";

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// 고정 윈도우 rate limiter
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: settings.window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 요청 1건 기록 → 허용 여부
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    /// 기준 시각을 받아 판정 (테스트에서 시간 제어)
    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        // 잠금 중 panic이 나도 카운터 맵 자체는 유효하므로 그대로 사용
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get_mut(key) {
            Some(entry) if now <= entry.reset_at => {
                if entry.count >= self.max_requests {
                    false
                } else {
                    entry.count += 1;
                    true
                }
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }
}

/// 클라이언트 식별 키
///
/// `x-forwarded-for` 첫 번째 값 → `x-real-ip` → `anonymous`
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

/// `/api/` 하위 요청에 rate limit 적용
///
/// ```ignore
/// Router::new()
///     .nest("/api", api_routes)
///     .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit))
/// ```
pub async fn rate_limit(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    if !request.uri().path().starts_with(RATE_LIMITED_PREFIX) {
        return next.run(request).await;
    }

    let key = client_key(request.headers());
    if state.limiter.check(&key) {
        return next.run(request).await;
    }

    tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
    ApiError::TooManyRequests {
        retry_after_secs: state.limiter.window().as_secs(),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter(max_requests: u32) -> FixedWindowLimiter {
        FixedWindowLimiter::new(&RateLimitSettings {
            max_requests,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn test_allows_up_to_max_then_rejects() {
        let limiter = limiter(3);
        let now = Instant::now();

        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now + Duration::from_secs(60)));
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check_at("k", now));
        assert!(!limiter.check_at("k", now + Duration::from_secs(30)));
        // reset_at 이후 첫 요청은 새 윈도우
        assert!(limiter.check_at("k", now + Duration::from_secs(61)));
        assert!(!limiter.check_at("k", now + Duration::from_secs(62)));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check_at("a", now));
        assert!(!limiter.check_at("a", now));
        assert!(limiter.check_at("b", now));
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "anonymous");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_key(&headers), "10.0.0.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.7");
    }

    #[test]
    fn test_empty_forwarded_for_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_key(&headers), "10.0.0.9");
    }
}
