//! 매매 기법 라우트.
//!
//! 매매 기법 CRUD 엔드포인트를 제공합니다.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use journal_core::{JournalError, Trade, TradeStatistics};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::trades::StatisticsResponse;
use super::{auth_user_id, get_db_pool, validate_request};
use crate::auth::JwtAuth;
use crate::error::{map_journal_error, ApiErrorResponse, ApiResult};
use crate::repository::{MethodInput, MethodRecord, MethodRepository, MethodUpdate, TradeRepository};
use crate::state::AppState;

/// 기법 이름 검증 (공백 제외 1자 이상)
fn validate_method_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("name_blank")
            .with_message("기법 이름은 비워둘 수 없습니다".into()));
    }
    Ok(())
}

/// 매매 기법 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMethodRequest {
    /// 기법 이름
    #[validate(
        length(max = 100, message = "기법 이름은 100자를 초과할 수 없습니다"),
        custom(function = "validate_method_name")
    )]
    pub name: String,
    /// 설명
    pub description: Option<String>,
    /// 매매 규칙 목록
    #[serde(default)]
    pub rules: Vec<String>,
    /// 사용 지표 목록
    #[serde(default)]
    pub indicators: Vec<String>,
    /// 적용 타임프레임 목록
    #[serde(default)]
    pub timeframes: Vec<String>,
}

/// 매매 기법 수정 요청. 생략한 필드는 변경하지 않습니다.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMethodRequest {
    #[validate(
        length(max = 100, message = "기법 이름은 100자를 초과할 수 없습니다"),
        custom(function = "validate_method_name")
    )]
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<String>>,
    pub indicators: Option<Vec<String>>,
    pub timeframes: Option<Vec<String>>,
}

/// 매매 기법 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MethodResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<String>,
    pub indicators: Vec<String>,
    pub timeframes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn list_field(value: Option<serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

impl From<MethodRecord> for MethodResponse {
    fn from(record: MethodRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            rules: list_field(record.rules),
            indicators: list_field(record.indicators),
            timeframes: list_field(record.timeframes),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// 매매 기법 생성.
///
/// POST /api/v1/methods
#[utoipa::path(
    post,
    path = "/api/v1/methods",
    tag = "methods",
    request_body = CreateMethodRequest,
    responses(
        (status = 201, description = "기법 생성됨", body = MethodResponse),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_method(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Json(req): Json<CreateMethodRequest>,
) -> ApiResult<(StatusCode, Json<MethodResponse>)> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    validate_request(&req)?;

    let input = MethodInput {
        user_id,
        name: req.name.trim().to_string(),
        description: req.description,
        rules: req.rules,
        indicators: req.indicators,
        timeframes: req.timeframes,
    };

    let record = MethodRepository::create(pool, input)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    tracing::info!(method_id = %record.id, name = %record.name, "매매 기법 생성");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// 매매 기법 목록 조회.
///
/// GET /api/v1/methods
#[utoipa::path(
    get,
    path = "/api/v1/methods",
    tag = "methods",
    responses(
        (status = 200, description = "기법 목록", body = [MethodResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_methods(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<Vec<MethodResponse>>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let records = MethodRepository::list(pool, user_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    Ok(Json(records.into_iter().map(MethodResponse::from).collect()))
}

/// 매매 기법 단건 조회.
///
/// GET /api/v1/methods/{id}
#[utoipa::path(
    get,
    path = "/api/v1/methods/{id}",
    tag = "methods",
    params(("id" = Uuid, Path, description = "기법 ID")),
    responses(
        (status = 200, description = "기법 상세", body = MethodResponse),
        (status = 404, description = "기법 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_method(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(method_id): Path<Uuid>,
) -> ApiResult<Json<MethodResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let record = MethodRepository::get(pool, user_id, method_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "매매 기법을 찾을 수 없습니다: {method_id}"
            )))
        })?;

    Ok(Json(record.into()))
}

/// 매매 기법 수정.
///
/// PUT /api/v1/methods/{id}
#[utoipa::path(
    put,
    path = "/api/v1/methods/{id}",
    tag = "methods",
    params(("id" = Uuid, Path, description = "기법 ID")),
    request_body = UpdateMethodRequest,
    responses(
        (status = 200, description = "수정된 기법", body = MethodResponse),
        (status = 404, description = "기법 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_method(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(method_id): Path<Uuid>,
    Json(req): Json<UpdateMethodRequest>,
) -> ApiResult<Json<MethodResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    validate_request(&req)?;

    let update = MethodUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        description: req.description,
        rules: req.rules,
        indicators: req.indicators,
        timeframes: req.timeframes,
    };

    let record = MethodRepository::update(pool, user_id, method_id, update)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "매매 기법을 찾을 수 없습니다: {method_id}"
            )))
        })?;

    Ok(Json(record.into()))
}

/// 매매 기법 삭제.
///
/// DELETE /api/v1/methods/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/methods/{id}",
    tag = "methods",
    params(("id" = Uuid, Path, description = "기법 ID")),
    responses(
        (status = 204, description = "삭제됨"),
        (status = 404, description = "기법 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_method(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(method_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let deleted = MethodRepository::delete(pool, user_id, method_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    if deleted == 0 {
        return Err(map_journal_error(JournalError::NotFound(format!(
            "매매 기법을 찾을 수 없습니다: {method_id}"
        ))));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// 기법별 거래 통계 조회.
///
/// GET /api/v1/methods/{id}/stats
///
/// 해당 기법으로 기록된 거래만 집계합니다. 기법이 존재하지 않으면
/// 빈 통계 대신 404를 반환합니다.
#[utoipa::path(
    get,
    path = "/api/v1/methods/{id}/stats",
    tag = "methods",
    params(("id" = Uuid, Path, description = "기법 ID")),
    responses(
        (status = 200, description = "기법별 거래 통계", body = StatisticsResponse),
        (status = 404, description = "기법 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_method_statistics(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(method_id): Path<Uuid>,
) -> ApiResult<Json<StatisticsResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    MethodRepository::get(pool, user_id, method_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "매매 기법을 찾을 수 없습니다: {method_id}"
            )))
        })?;

    let records = TradeRepository::list_for_statistics(pool, user_id, Some(method_id))
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    let trades: Vec<Trade> = records
        .into_iter()
        .map(Trade::try_from)
        .collect::<Result<_, _>>()
        .map_err(map_journal_error)?;

    let stats = TradeStatistics::from_trades(&trades);

    Ok(Json(stats.into()))
}

/// 매매 기법 라우터 생성.
pub fn methods_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_methods).post(create_method))
        .route(
            "/{id}",
            get(get_method).put(update_method).delete(delete_method),
        )
        .route("/{id}/stats", get(get_method_statistics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_record_to_response() {
        let record = MethodRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "눌림목 매매".to_string(),
            description: None,
            rules: Some(serde_json::json!(["20일선 지지 확인", "거래량 감소 확인"])),
            indicators: Some(serde_json::json!(["SMA20"])),
            timeframes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = MethodResponse::from(record.clone());
        assert_eq!(response.id, record.id);
        assert_eq!(response.name, "눌림목 매매");
        assert_eq!(response.rules, vec!["20일선 지지 확인", "거래량 감소 확인"]);
        assert_eq!(response.indicators, vec!["SMA20"]);
        assert!(response.timeframes.is_empty());
    }

    #[test]
    fn test_create_request_rejects_blank_name() {
        let req = CreateMethodRequest {
            name: "   ".to_string(),
            description: None,
            rules: Vec::new(),
            indicators: Vec::new(),
            timeframes: Vec::new(),
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_allows_omitted_name() {
        let req = UpdateMethodRequest {
            name: None,
            description: Some("설명만 수정".to_string()),
            rules: None,
            indicators: None,
            timeframes: None,
        };

        assert!(req.validate().is_ok());
    }
}
