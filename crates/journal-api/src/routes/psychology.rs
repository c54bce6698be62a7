//! 심리 테스트 라우트.
//!
//! 문항 조회, 응답 제출(채점 및 저장), 결과 이력 조회 엔드포인트를 제공합니다.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use journal_core::{
    default_question_set, score_assessment, AssessmentQuestion, JournalError, SubmittedAnswer,
    PASS_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{auth_user_id, get_db_pool};
use crate::auth::JwtAuth;
use crate::error::{map_journal_error, ApiErrorResponse, ApiResult};
use crate::metrics::record_assessment_submitted;
use crate::repository::{
    AssessmentResultInput, AssessmentResultRecord, PsychologyRepository, QuestionRecord,
};
use crate::state::AppState;

// =====================================================
// 요청/응답 타입
// =====================================================

/// 문항 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    pub id: String,
    pub category: String,
    pub text: String,
    /// 선택지 문구 목록 (점수는 노출하지 않음)
    pub options: Vec<String>,
}

impl From<AssessmentQuestion> for QuestionResponse {
    fn from(question: AssessmentQuestion) -> Self {
        Self {
            id: question.id,
            category: question.category.as_str().to_string(),
            text: question.text,
            options: question.options.into_iter().map(|o| o.text).collect(),
        }
    }
}

/// 테스트 제출 요청.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAssessmentRequest {
    /// 문항별 응답 목록
    pub answers: Vec<SubmittedAnswer>,
}

/// 테스트 결과 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssessmentResultResponse {
    pub id: Uuid,
    /// 총점 (0~100)
    pub total_score: i32,
    /// 통과 여부 (총점 60 이상)
    pub passed: bool,
    /// 카테고리별 점수
    pub category_scores: BTreeMap<String, i32>,
    /// 종합 분석
    pub analysis: String,
    /// 추천 행동 목록
    pub recommendations: Vec<String>,
    pub taken_at: String,
}

impl TryFrom<AssessmentResultRecord> for AssessmentResultResponse {
    type Error = JournalError;

    fn try_from(record: AssessmentResultRecord) -> Result<Self, Self::Error> {
        let category_scores: BTreeMap<String, i32> =
            serde_json::from_value(record.category_scores)?;
        let recommendations: Vec<String> = serde_json::from_value(record.recommendations)?;

        Ok(Self {
            id: record.id,
            total_score: record.total_score,
            passed: record.total_score >= PASS_THRESHOLD,
            category_scores,
            analysis: record.analysis,
            recommendations,
            taken_at: record.taken_at.to_rfc3339(),
        })
    }
}

/// 결과 이력 쿼리 파라미터.
#[derive(Debug, Deserialize, Default)]
pub struct ResultsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// =====================================================
// 핸들러
// =====================================================

/// DB 문항을 도메인 문항으로 변환. DB가 비어 있으면 기본 세트를 사용합니다.
fn load_question_set(records: Vec<QuestionRecord>) -> Result<Vec<AssessmentQuestion>, JournalError> {
    if records.is_empty() {
        return Ok(default_question_set());
    }
    records.into_iter().map(AssessmentQuestion::try_from).collect()
}

/// 문항 목록 조회.
///
/// GET /api/v1/psychology/questions
#[utoipa::path(
    get,
    path = "/api/v1/psychology/questions",
    tag = "psychology",
    responses(
        (status = 200, description = "문항 목록", body = [QuestionResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<Vec<QuestionResponse>>> {
    auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let records = PsychologyRepository::list_questions(pool)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;
    let questions = load_question_set(records).map_err(map_journal_error)?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from).collect()))
}

/// 테스트 응답 제출.
///
/// POST /api/v1/psychology/submit
///
/// 응답을 채점하여 결과를 저장하고 반환합니다.
/// 알 수 없는 문항 ID는 건너뛰며, 선택지 범위를 벗어난 응답은 400을 반환합니다.
#[utoipa::path(
    post,
    path = "/api/v1/psychology/submit",
    tag = "psychology",
    request_body = SubmitAssessmentRequest,
    responses(
        (status = 201, description = "채점된 결과", body = AssessmentResultResponse),
        (status = 400, description = "잘못된 응답", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn submit_assessment(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Json(req): Json<SubmitAssessmentRequest>,
) -> ApiResult<(StatusCode, Json<AssessmentResultResponse>)> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let records = PsychologyRepository::list_questions(pool)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;
    let questions = load_question_set(records).map_err(map_journal_error)?;

    let scored = score_assessment(&req.answers, &questions)
        .map_err(|e| map_journal_error(JournalError::Scoring(e)))?;

    let passed = scored.meets_threshold();
    record_assessment_submitted(passed);
    tracing::info!(total_score = scored.total_score, passed, "심리 테스트 제출");

    let input = AssessmentResultInput {
        user_id,
        total_score: scored.total_score,
        category_scores: scored.category_scores,
        analysis: scored.analysis,
        recommendations: scored.recommendations,
    };

    let record = PsychologyRepository::insert_result(pool, input)
        .await
        .map_err(map_journal_error)?;
    let response = AssessmentResultResponse::try_from(record).map_err(map_journal_error)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// 결과 이력 조회 (최신순).
///
/// GET /api/v1/psychology/results
#[utoipa::path(
    get,
    path = "/api/v1/psychology/results",
    tag = "psychology",
    responses(
        (status = 200, description = "결과 이력", body = [AssessmentResultResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_results(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Query(query): Query<ResultsQuery>,
) -> ApiResult<Json<Vec<AssessmentResultResponse>>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let offset = query.offset.unwrap_or(0).max(0);

    let records = PsychologyRepository::list_results(pool, user_id, limit, offset)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    let results: Vec<AssessmentResultResponse> = records
        .into_iter()
        .map(AssessmentResultResponse::try_from)
        .collect::<Result<_, _>>()
        .map_err(map_journal_error)?;

    Ok(Json(results))
}

/// 가장 최근 결과 조회.
///
/// GET /api/v1/psychology/results/latest
#[utoipa::path(
    get,
    path = "/api/v1/psychology/results/latest",
    tag = "psychology",
    responses(
        (status = 200, description = "최근 결과", body = AssessmentResultResponse),
        (status = 404, description = "결과 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn latest_result(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<AssessmentResultResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let record = PsychologyRepository::latest_result(pool, user_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(
                "제출된 심리 테스트 결과가 없습니다".to_string(),
            ))
        })?;

    let response = AssessmentResultResponse::try_from(record).map_err(map_journal_error)?;

    Ok(Json(response))
}

/// 테스트 결과 단건 조회.
///
/// GET /api/v1/psychology/results/{id}
///
/// 다른 사용자의 결과는 404로 처리합니다.
#[utoipa::path(
    get,
    path = "/api/v1/psychology/results/{id}",
    tag = "psychology",
    params(("id" = Uuid, Path, description = "결과 ID")),
    responses(
        (status = 200, description = "테스트 결과", body = AssessmentResultResponse),
        (status = 404, description = "결과 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(result_id): Path<Uuid>,
) -> ApiResult<Json<AssessmentResultResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let record = PsychologyRepository::get_result(pool, user_id, result_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "심리 테스트 결과를 찾을 수 없습니다: {result_id}"
            )))
        })?;

    let response = AssessmentResultResponse::try_from(record).map_err(map_journal_error)?;

    Ok(Json(response))
}

/// 심리 테스트 라우터 생성.
pub fn psychology_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/submit", post(submit_assessment))
        .route("/results", get(list_results))
        .route("/results/latest", get(latest_result))
        .route("/results/{id}", get(get_result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use journal_core::AssessmentCategory;

    #[test]
    fn test_question_to_response_hides_scores() {
        let question = default_question_set().into_iter().next().unwrap();
        let option_count = question.options.len();
        let response = QuestionResponse::from(question);

        assert_eq!(response.options.len(), option_count);
        // 응답에는 선택지 문구만 포함
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("score"));
    }

    #[test]
    fn test_result_record_to_response() {
        let mut scores = BTreeMap::new();
        scores.insert(AssessmentCategory::RiskManagement, 80);

        let record = AssessmentResultRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_score: 72,
            category_scores: serde_json::to_value(&scores).unwrap(),
            analysis: "양호한 수준입니다".to_string(),
            recommendations: serde_json::json!([]),
            taken_at: Utc::now(),
        };

        let response = AssessmentResultResponse::try_from(record).unwrap();
        assert_eq!(response.total_score, 72);
        assert!(response.passed);
        assert_eq!(response.category_scores.get("risk_management"), Some(&80));
    }

    #[test]
    fn test_below_threshold_not_passed() {
        let record = AssessmentResultRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            total_score: 45,
            category_scores: serde_json::json!({}),
            analysis: "주의가 필요합니다".to_string(),
            recommendations: serde_json::json!(["손절 기준을 먼저 정하세요"]),
            taken_at: Utc::now(),
        };

        let response = AssessmentResultResponse::try_from(record).unwrap();
        assert!(!response.passed);
    }

    #[test]
    fn test_empty_question_records_fall_back_to_default_set() {
        let questions = load_question_set(Vec::new()).unwrap();
        assert_eq!(questions.len(), default_question_set().len());
    }

    // 제출 → 채점 → 저장 입력 → DB 레코드 JSON 형태 → 응답 변환까지
    // 점수, 카테고리 점수, 추천 행동이 그대로 보존되어야 한다
    #[test]
    fn test_scored_assessment_survives_record_round_trip() {
        let questions = default_question_set();
        let answers: Vec<SubmittedAnswer> = questions
            .iter()
            .map(|q| SubmittedAnswer {
                question_id: q.id.clone(),
                answer_index: 0,
            })
            .collect();

        let scored = score_assessment(&answers, &questions).unwrap();

        let input = AssessmentResultInput {
            user_id: Uuid::new_v4(),
            total_score: scored.total_score,
            category_scores: scored.category_scores.clone(),
            analysis: scored.analysis.clone(),
            recommendations: scored.recommendations.clone(),
        };

        // insert_result가 JSONB 컬럼에 쓰는 것과 같은 직렬화를 거친 레코드
        let record = AssessmentResultRecord {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            total_score: input.total_score,
            category_scores: serde_json::to_value(&input.category_scores).unwrap(),
            analysis: input.analysis.clone(),
            recommendations: serde_json::to_value(&input.recommendations).unwrap(),
            taken_at: Utc::now(),
        };

        let response = AssessmentResultResponse::try_from(record).unwrap();

        assert_eq!(response.total_score, scored.total_score);
        assert_eq!(response.passed, scored.meets_threshold());
        assert_eq!(response.analysis, scored.analysis);
        assert_eq!(response.recommendations, scored.recommendations);
        assert_eq!(response.category_scores.len(), scored.category_scores.len());
        for (category, score) in &scored.category_scores {
            assert_eq!(response.category_scores.get(category.as_str()), Some(score));
        }
    }
}
