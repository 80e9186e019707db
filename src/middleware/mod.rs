//! HTTP Middleware
//!
//! - `rate_limit`: `/api/` 고정 윈도우 요청 제한
//! - `security_headers`: 모든 응답 보안 헤더
//! - `auth`: `/api/admin/*` 관리자 게이트

pub mod auth;
pub mod rate_limit;
pub mod security_headers;

pub use auth::{require_admin, AdminContext};
pub use rate_limit::{rate_limit, FixedWindowLimiter};
pub use security_headers::with_security_headers;
