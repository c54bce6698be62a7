//! AI 거래 분석 라우트.
//!
//! 거래 통계와 심리 테스트 결과를 종합한 시장 분석과 차트 이미지 분석을
//! 제공합니다. AI 분석은 보조 기능이므로 분석기 미설정이나 외부 API 오류는
//! 요청 실패가 아니라 "unavailable" 상태 응답으로 처리합니다.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use base64::Engine;
use journal_core::{AssessmentResult, JournalError, Trade, TradeStatistics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

use super::{auth_user_id, get_db_pool};
use crate::auth::JwtAuth;
use crate::error::{map_journal_error, ApiErrorResponse, ApiResult};
use crate::metrics::record_ai_analysis;
use crate::repository::{PsychologyRepository, TradeRepository};
use crate::services::{build_prompt, AnalysisContext, ChartAnalysis};
use crate::state::AppState;

/// 분석 생성 상태.
const STATUS_OK: &str = "ok";
/// 분석기 미설정 또는 AI 호출 실패.
const STATUS_UNAVAILABLE: &str = "unavailable";

/// 시장 분석 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarketAnalysisResponse {
    /// "ok" 또는 "unavailable"
    pub status: String,
    /// 생성된 분석 텍스트 (unavailable이면 None)
    pub analysis: Option<String>,
    /// 분석에 사용된 거래 수
    pub trades_analyzed: usize,
    /// 생성 시각 (ISO 8601)
    pub generated_at: String,
}

/// 차트 분석 요청.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartAnalysisRequest {
    /// base64 인코딩된 차트 이미지
    pub image: String,
    /// 이미지 MIME 타입 (예: "image/png")
    pub mime: String,
}

/// 차트 분석 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChartAnalysisResponse {
    /// "ok" 또는 "unavailable"
    pub status: String,
    /// 구조화된 매매 추정 (unavailable이면 None)
    pub analysis: Option<ChartAnalysis>,
    /// 생성 시각 (ISO 8601)
    pub generated_at: String,
}

/// AI 시장 분석 생성.
///
/// POST /api/v1/analysis/market
///
/// 거래 통계, 최근 거래, 최근 심리 테스트 결과를 모아 AI에 전달합니다.
/// 분석기가 설정되지 않았거나 AI 호출이 실패하면 status "unavailable"로
/// 응답합니다.
#[utoipa::path(
    post,
    path = "/api/v1/analysis/market",
    tag = "analysis",
    responses(
        (status = 200, description = "분석 결과 또는 unavailable 상태", body = MarketAnalysisResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze_market(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<MarketAnalysisResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    // 분석 컨텍스트 수집: 전체 통계 + 최근 거래 + 최근 심리 테스트
    let records = TradeRepository::list_for_statistics(pool, user_id, None)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;
    let trades: Vec<Trade> = records
        .into_iter()
        .map(Trade::try_from)
        .collect::<Result<_, _>>()
        .map_err(map_journal_error)?;

    let latest_assessment: Option<AssessmentResult> =
        match PsychologyRepository::latest_result(pool, user_id)
            .await
            .map_err(|e| map_journal_error(JournalError::from(e)))?
        {
            Some(record) => Some(AssessmentResult::try_from(record).map_err(map_journal_error)?),
            None => None,
        };

    let statistics = TradeStatistics::from_trades(&trades);
    let trades_analyzed = trades.len();

    let mut recent_trades = trades;
    recent_trades.reverse();
    recent_trades.truncate(10);

    let context = AnalysisContext {
        statistics,
        recent_trades,
        latest_assessment,
    };

    let analysis = match &state.ai_analyzer {
        Some(analyzer) => match analyzer.complete(&build_prompt(&context)).await {
            Ok(text) => {
                record_ai_analysis("success");
                Some(text)
            }
            Err(e) => {
                record_ai_analysis("error");
                warn!("AI 시장 분석 실패: {e}");
                None
            }
        },
        None => None,
    };

    let status = if analysis.is_some() {
        STATUS_OK
    } else {
        STATUS_UNAVAILABLE
    };

    Ok(Json(MarketAnalysisResponse {
        status: status.to_string(),
        analysis,
        trades_analyzed,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// AI 차트 이미지 분석.
///
/// POST /api/v1/analysis/chart
///
/// base64 이미지를 AI에 전달하여 구조화된 매매 추정을 반환합니다.
/// 이미지 디코딩 실패는 400, AI 측 실패는 status "unavailable"입니다.
#[utoipa::path(
    post,
    path = "/api/v1/analysis/chart",
    tag = "analysis",
    request_body = ChartAnalysisRequest,
    responses(
        (status = 200, description = "분석 결과 또는 unavailable 상태", body = ChartAnalysisResponse),
        (status = 400, description = "잘못된 이미지 데이터", body = ApiErrorResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn analyze_chart(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Json(request): Json<ChartAnalysisRequest>,
) -> ApiResult<Json<ChartAnalysisResponse>> {
    auth_user_id(&auth)?;

    let image = base64::engine::general_purpose::STANDARD
        .decode(request.image.as_bytes())
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse::simple(
                    "INVALID_IMAGE",
                    "이미지가 올바른 base64 형식이 아닙니다",
                )),
            )
        })?;

    if image.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::simple(
                "INVALID_IMAGE",
                "이미지 데이터가 비어 있습니다",
            )),
        ));
    }

    let analysis = match &state.ai_analyzer {
        Some(analyzer) => match analyzer.analyze_chart(&image, &request.mime).await {
            Ok(result) => {
                record_ai_analysis("success");
                Some(result)
            }
            Err(e) => {
                record_ai_analysis("error");
                warn!("AI 차트 분석 실패: {e}");
                None
            }
        },
        None => None,
    };

    let status = if analysis.is_some() {
        STATUS_OK
    } else {
        STATUS_UNAVAILABLE
    };

    Ok(Json(ChartAnalysisResponse {
        status: status.to_string(),
        analysis,
        generated_at: chrono::Utc::now().to_rfc3339(),
    }))
}

/// AI 분석 라우터 생성.
pub fn analysis_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/market", post(analyze_market))
        .route("/chart", post(analyze_chart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, Claims};
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn bearer_token() -> String {
        create_token(
            &Claims::new(Uuid::new_v4(), 60),
            "development-secret-key-change-in-production",
        )
        .unwrap()
    }

    fn test_app() -> Router {
        Router::new()
            .nest("/api/v1/analysis", analysis_router())
            .with_state(Arc::new(create_test_state()))
    }

    // DB가 없는 상태에서는 503(DB_NOT_CONNECTED)을 반환해야 한다
    #[tokio::test]
    async fn test_market_analysis_without_db_returns_503() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/analysis/market")
                    .header("authorization", format!("Bearer {}", bearer_token()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_market_analysis_without_token_returns_401() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/analysis/market")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // 차트 분석은 DB를 사용하지 않으므로 분석기 미설정 시 unavailable 응답
    #[tokio::test]
    async fn test_chart_analysis_without_analyzer_degrades() {
        let body = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode([0xFFu8, 0xD8, 0xFF]),
            "mime": "image/jpeg"
        });

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/analysis/chart")
                    .header("authorization", format!("Bearer {}", bearer_token()))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: ChartAnalysisResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.status, "unavailable");
        assert!(parsed.analysis.is_none());
    }

    #[tokio::test]
    async fn test_chart_analysis_rejects_invalid_base64() {
        let body = serde_json::json!({
            "image": "이것은 base64가 아닙니다!!",
            "mime": "image/png"
        });

        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/analysis/chart")
                    .header("authorization", format!("Bearer {}", bearer_token()))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
