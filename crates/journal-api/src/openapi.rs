//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! # 자동 생성 구조
//!
//! 각 라우트 모듈은 자체 스키마를 정의하고, 중앙 `ApiDoc`에서 집계합니다.
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    AssessmentResultResponse, ChartAnalysisRequest, ChartAnalysisResponse, CloseTradeRequest,
    ComponentHealth, ComponentStatus, CreateMethodRequest, CreateTradeRequest, HealthResponse,
    MarketAnalysisResponse, MethodResponse, QuestionResponse, StatisticsResponse,
    SubmitAssessmentRequest, TradeResponse, TradesListResponse, UpdateMethodRequest,
    UpdateTradeRequest,
};
use crate::services::ChartAnalysis;

/// 매매일지 API 문서.
///
/// 모든 엔드포인트와 스키마를 포함하는 OpenAPI 3.0 스펙입니다.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trading Journal API",
        version = "0.1.0",
        description = r#"
# 매매일지 REST API

거래 기록, 매매 기법, 트레이딩 심리 관리를 위한 REST API입니다.

## 주요 기능

- **거래 기록**: 진입/청산 기록과 손익 자동 계산
- **매매 기법**: 규칙/지표/타임프레임 정의 및 거래 연결
- **거래 통계**: 승률, 손익비 등 성과 지표
- **심리 테스트**: 카테고리별 트레이딩 심리 진단
- **AI 분석**: 거래 습관에 대한 서술형 피드백

## 인증

모든 `/api/v1` 엔드포인트는 JWT Bearer 토큰 인증이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.
"#,
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "trades", description = "거래 기록 - CRUD, 청산, 통계"),
        (name = "methods", description = "매매 기법 - 규칙, 지표, 타임프레임 관리"),
        (name = "psychology", description = "심리 테스트 - 문항, 제출, 이력"),
        (name = "analysis", description = "AI 분석 - 매매 습관 피드백")
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,

            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Trades =====
            CreateTradeRequest,
            UpdateTradeRequest,
            CloseTradeRequest,
            TradeResponse,
            TradesListResponse,
            StatisticsResponse,

            // ===== Methods =====
            CreateMethodRequest,
            UpdateMethodRequest,
            MethodResponse,

            // ===== Psychology =====
            QuestionResponse,
            SubmitAssessmentRequest,
            AssessmentResultResponse,

            // ===== Analysis =====
            MarketAnalysisResponse,
            ChartAnalysisRequest,
            ChartAnalysisResponse,
            ChartAnalysis,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Trades =====
        crate::routes::trades::create_trade,
        crate::routes::trades::list_trades,
        crate::routes::trades::get_trade,
        crate::routes::trades::update_trade,
        crate::routes::trades::close_trade,
        crate::routes::trades::delete_trade,
        crate::routes::trades::get_statistics,

        // ===== Methods =====
        crate::routes::methods::create_method,
        crate::routes::methods::list_methods,
        crate::routes::methods::get_method,
        crate::routes::methods::update_method,
        crate::routes::methods::delete_method,
        crate::routes::methods::get_method_statistics,

        // ===== Psychology =====
        crate::routes::psychology::list_questions,
        crate::routes::psychology::submit_assessment,
        crate::routes::psychology::list_results,
        crate::routes::psychology::latest_result,
        crate::routes::psychology::get_result,

        // ===== Analysis =====
        crate::routes::analysis::analyze_market,
        crate::routes::analysis::analyze_chart,
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Bearer 토큰 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI 라우터 생성.
///
/// 다음 경로에 문서 UI를 마운트합니다:
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        // 기본 정보 확인
        assert!(json.contains("Trading Journal API"));

        // 태그 확인
        assert!(json.contains("health"));
        assert!(json.contains("trades"));
        assert!(json.contains("psychology"));
        assert!(json.contains("analysis"));

        // 경로 확인
        assert!(json.contains("/health"));
        assert!(json.contains("/api/v1/trades"));
        assert!(json.contains("/api/v1/trades/stats"));
        assert!(json.contains("/api/v1/methods/{id}/stats"));
        assert!(json.contains("/api/v1/analysis/market"));
        assert!(json.contains("/api/v1/psychology/submit"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();

        assert!(json.contains("HealthResponse"));
        assert!(json.contains("TradeResponse"));
        assert!(json.contains("StatisticsResponse"));
        assert!(json.contains("AssessmentResultResponse"));
        assert!(json.contains("ApiErrorResponse"));
    }

    #[test]
    fn test_openapi_defines_bearer_auth_scheme() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();

        assert!(json.contains("bearer_auth"));
        assert!(json.contains("bearer"));
    }
}
