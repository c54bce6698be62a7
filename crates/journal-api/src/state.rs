//! 애플리케이션 공유 상태.
//!
//! 모든 API 핸들러가 공유하는 리소스(DB 풀, AI 분석기, 인증 설정)를 관리합니다.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::services::AiAnalyzer;

/// 애플리케이션 공유 상태.
///
/// `Arc<AppState>`로 감싸 라우터에 주입합니다.
/// 선택적 리소스는 `Option`으로 두어 DB 없이도 서버가 기동할 수 있습니다.
pub struct AppState {
    /// PostgreSQL 연결 풀 (선택적)
    pub db_pool: Option<PgPool>,

    /// AI 거래 분석기 (선택적, 미설정 시 분석 엔드포인트는 degraded 응답)
    pub ai_analyzer: Option<Arc<dyn AiAnalyzer>>,

    /// JWT 서명 검증용 시크릿
    pub jwt_secret: String,

    /// 서버 시작 시각
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 기본 상태 생성.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            db_pool: None,
            ai_analyzer: None,
            jwt_secret: jwt_secret.into(),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// DB 풀 연결.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// AI 분석기 연결.
    pub fn with_ai_analyzer(mut self, analyzer: Arc<dyn AiAnalyzer>) -> Self {
        self.ai_analyzer = Some(analyzer);
        self
    }

    /// DB 연결 여부.
    pub fn has_db(&self) -> bool {
        self.db_pool.is_some()
    }

    /// AI 분석기 설정 여부.
    pub fn has_ai_analyzer(&self) -> bool {
        self.ai_analyzer.is_some()
    }

    /// DB 헬스 체크. 간단한 쿼리로 연결 상태를 확인합니다.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => false,
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 상태 생성. DB와 AI 분석기 없이 기동합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    AppState::new("test-secret-key-for-unit-tests")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults() {
        let state = create_test_state();

        assert!(!state.has_db());
        assert!(!state.has_ai_analyzer());
        assert!(!state.version.is_empty());
        assert!(state.uptime_secs() >= 0);
    }

    #[tokio::test]
    async fn test_db_unhealthy_without_pool() {
        let state = create_test_state();
        assert!(!state.is_db_healthy().await);
    }
}
