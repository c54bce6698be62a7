//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/trades` - 거래 기록 관리 (CRUD, 청산, 통계)
//! - `/api/v1/methods` - 매매 기법 관리
//! - `/api/v1/psychology` - 심리 테스트 (문항 조회, 제출, 이력)
//! - `/api/v1/analysis` - AI 거래 분석

pub mod analysis;
pub mod health;
pub mod methods;
pub mod psychology;
pub mod trades;

pub use analysis::{
    analysis_router, ChartAnalysisRequest, ChartAnalysisResponse, MarketAnalysisResponse,
};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use methods::{methods_router, CreateMethodRequest, MethodResponse, UpdateMethodRequest};
pub use psychology::{
    psychology_router, AssessmentResultResponse, QuestionResponse, SubmitAssessmentRequest,
};
pub use trades::{
    trades_router, CloseTradeRequest, CreateTradeRequest, StatisticsResponse, TradeResponse,
    TradesListResponse, UpdateTradeRequest,
};

use axum::http::StatusCode;
use axum::{Json, Router};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::JwtAuth;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/trades", trades_router())
        .nest("/api/v1/methods", methods_router())
        .nest("/api/v1/psychology", psychology_router())
        .nest("/api/v1/analysis", analysis_router())
}

/// DB 풀 참조 획득 헬퍼.
///
/// DB가 연결되지 않은 경우 503을 반환합니다.
pub(crate) fn get_db_pool(
    state: &AppState,
) -> Result<&PgPool, (StatusCode, Json<ApiErrorResponse>)> {
    state.db_pool.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiErrorResponse::simple(
                "DB_NOT_CONNECTED",
                "데이터베이스가 연결되어 있지 않습니다",
            )),
        )
    })
}

/// 인증된 사용자 UUID 획득 헬퍼.
///
/// sub 클레임이 UUID가 아니면 401을 반환합니다.
pub(crate) fn auth_user_id(
    auth: &JwtAuth,
) -> Result<Uuid, (StatusCode, Json<ApiErrorResponse>)> {
    auth.user_id().map_err(|e| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiErrorResponse::simple("INVALID_TOKEN", e.to_string())),
        )
    })
}

/// 요청 본문 유효성 검사 헬퍼.
///
/// 검증 실패 시 필드별 메시지를 모아 400을 반환합니다.
pub(crate) fn validate_request<T: validator::Validate>(
    request: &T,
) -> Result<(), (StatusCode, Json<ApiErrorResponse>)> {
    if let Err(errors) = request.validate() {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::simple("VALIDATION_ERROR", message)),
        ));
    }
    Ok(())
}
