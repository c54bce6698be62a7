//! 매매일지 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (거래, 매매 기법, 심리 테스트)
//! - JWT 인증
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//! - AI 거래 분석 연동
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증
//! - [`repository`]: PostgreSQL 데이터 접근 계층
//! - [`services`]: AI 분석 등 외부 서비스 연동
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{Claims, JwtAuth, JwtAuthError};
pub use error::{ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::*;
pub use services::{AiAnalyzer, OpenAiAnalyzer};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
