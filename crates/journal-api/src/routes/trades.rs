//! 거래 기록 라우트.
//!
//! 거래 CRUD, 청산, 통계 조회 엔드포인트를 제공합니다.
//!
//! # 엔드포인트
//!
//! - `GET /` - 거래 목록 조회 (필터/페이징)
//! - `POST /` - 거래 기록 생성
//! - `GET /stats` - 거래 통계 조회
//! - `GET /{id}` - 거래 단건 조회
//! - `PUT /{id}` - 거래 메모/태그/기법 수정
//! - `DELETE /{id}` - 거래 삭제
//! - `POST /{id}/close` - 거래 청산

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use journal_core::{JournalError, Trade, TradeSide, TradeStatistics};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{auth_user_id, get_db_pool, validate_request};
use crate::auth::JwtAuth;
use crate::error::{map_journal_error, ApiErrorResponse, ApiResult};
use crate::metrics::{record_trade_closed, record_trade_created};
use crate::repository::{TradeFilter, TradeInput, TradeRecord, TradeRepository, TradeUpdate};
use crate::state::AppState;

// =====================================================
// 커스텀 검증 함수
// =====================================================

/// 심볼 검증 (공백 제외 1자 이상)
fn validate_symbol(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("symbol_blank")
            .with_message("종목 심볼은 비워둘 수 없습니다".into()));
    }
    Ok(())
}

/// 포지션 방향 검증 ("long" | "short")
fn validate_trade_side(value: &str) -> Result<(), ValidationError> {
    TradeSide::from_str(value).map_err(|_| {
        ValidationError::new("invalid_side")
            .with_message("포지션 방향은 long 또는 short여야 합니다".into())
    })?;
    Ok(())
}

/// 수량 검증 (0보다 커야 함)
fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("quantity_not_positive")
            .with_message("수량은 0보다 커야 합니다".into()));
    }
    Ok(())
}

/// 가격 검증 (0보다 커야 함)
fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("price_not_positive")
            .with_message("가격은 0보다 커야 합니다".into()));
    }
    Ok(())
}

// =====================================================
// 요청/응답 타입
// =====================================================

/// 거래 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTradeRequest {
    /// 종목 심볼 (예: "AAPL", "005930")
    #[validate(
        length(max = 20, message = "심볼은 20자를 초과할 수 없습니다"),
        custom(function = "validate_symbol")
    )]
    pub symbol: String,
    /// 포지션 방향 ("long" | "short")
    #[validate(custom(function = "validate_trade_side"))]
    pub side: String,
    /// 수량
    #[validate(custom(function = "validate_quantity"))]
    pub quantity: Decimal,
    /// 진입 가격
    #[validate(custom(function = "validate_price"))]
    pub entry_price: Decimal,
    /// 진입 시각 (생략 시 현재 시각)
    pub entry_at: Option<DateTime<Utc>>,
    /// 연결할 매매 기법 ID
    pub method_id: Option<Uuid>,
    /// 메모
    pub notes: Option<String>,
    /// 태그 목록
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 거래 수정 요청. 생략한 필드는 변경하지 않습니다.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTradeRequest {
    /// 메모
    pub notes: Option<String>,
    /// 태그 목록
    pub tags: Option<Vec<String>>,
    /// 매매 기법 ID (null로 지정하면 연결 해제, 생략하면 유지)
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub method_id: Option<Option<Uuid>>,
}

/// 필드 생략(None)과 명시적 null(Some(None))을 구분하는 역직렬화 헬퍼.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// 거래 청산 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CloseTradeRequest {
    /// 청산 가격
    #[validate(custom(function = "validate_price"))]
    pub exit_price: Decimal,
    /// 청산 시각 (생략 시 현재 시각)
    pub exit_at: Option<DateTime<Utc>>,
}

/// 거래 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TradeResponse {
    pub id: Uuid,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub entry_price: String,
    pub entry_at: String,
    pub exit_price: Option<String>,
    pub exit_at: Option<String>,
    pub profit: Option<String>,
    pub status: String,
    pub method_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TradeRecord> for TradeResponse {
    fn from(record: TradeRecord) -> Self {
        let tags: Vec<String> = record
            .tags
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        Self {
            id: record.id,
            symbol: record.symbol,
            side: record.side,
            quantity: record.quantity.to_string(),
            entry_price: record.entry_price.to_string(),
            entry_at: record.entry_at.to_rfc3339(),
            exit_price: record.exit_price.map(|p| p.to_string()),
            exit_at: record.exit_at.map(|t| t.to_rfc3339()),
            profit: record.profit.map(|p| p.to_string()),
            status: record.status,
            method_id: record.method_id,
            notes: record.notes,
            tags,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// 거래 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TradesListResponse {
    pub trades: Vec<TradeResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// 거래 목록 쿼리 파라미터.
#[derive(Debug, Deserialize, Default)]
pub struct TradesQuery {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub status: Option<String>,
    pub method_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 통계 쿼리 파라미터.
#[derive(Debug, Deserialize, Default)]
pub struct StatisticsQuery {
    /// 특정 매매 기법으로 제한
    pub method_id: Option<Uuid>,
}

/// 거래 통계 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatisticsResponse {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: String,
    pub total_profit: String,
    pub avg_profit: String,
    pub gross_profit: String,
    pub gross_loss: String,
    pub profit_factor: String,
    pub avg_win: String,
    pub avg_loss: String,
    pub largest_win: String,
    pub largest_loss: String,
}

impl From<TradeStatistics> for StatisticsResponse {
    fn from(stats: TradeStatistics) -> Self {
        Self {
            total_trades: stats.total_trades,
            closed_trades: stats.closed_trades,
            winning_trades: stats.winning_trades,
            losing_trades: stats.losing_trades,
            win_rate_pct: stats.win_rate_pct.to_string(),
            total_profit: stats.total_profit.to_string(),
            avg_profit: stats.avg_profit.to_string(),
            gross_profit: stats.gross_profit.to_string(),
            gross_loss: stats.gross_loss.to_string(),
            profit_factor: stats.profit_factor.to_string(),
            avg_win: stats.avg_win.to_string(),
            avg_loss: stats.avg_loss.to_string(),
            largest_win: stats.largest_win.to_string(),
            largest_loss: stats.largest_loss.to_string(),
        }
    }
}

// =====================================================
// 핸들러
// =====================================================

/// 거래 기록 생성.
///
/// POST /api/v1/trades
#[utoipa::path(
    post,
    path = "/api/v1/trades",
    tag = "trades",
    request_body = CreateTradeRequest,
    responses(
        (status = 201, description = "거래 생성됨", body = TradeResponse),
        (status = 400, description = "잘못된 입력", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Json(req): Json<CreateTradeRequest>,
) -> ApiResult<(StatusCode, Json<TradeResponse>)> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    validate_request(&req)?;
    let side = TradeSide::from_str(&req.side).map_err(map_journal_error)?;

    let input = TradeInput {
        user_id,
        symbol: req.symbol.trim().to_string(),
        side,
        quantity: req.quantity,
        entry_price: req.entry_price,
        entry_at: req.entry_at.unwrap_or_else(Utc::now),
        method_id: req.method_id,
        notes: req.notes,
        tags: req.tags,
    };

    let record = TradeRepository::create(pool, input)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    record_trade_created(&record.side);
    tracing::info!(trade_id = %record.id, symbol = %record.symbol, "거래 기록 생성");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// 거래 목록 조회.
///
/// GET /api/v1/trades
#[utoipa::path(
    get,
    path = "/api/v1/trades",
    tag = "trades",
    responses(
        (status = 200, description = "거래 목록", body = TradesListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Query(query): Query<TradesQuery>,
) -> ApiResult<Json<TradesListResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let offset = query.offset.unwrap_or(0).max(0);

    let filter = TradeFilter {
        symbol: query.symbol,
        side: query.side,
        status: query.status,
        method_id: query.method_id,
        start_date: query.start_date,
        end_date: query.end_date,
        limit: Some(limit),
        offset: Some(offset),
    };

    let total = TradeRepository::count(pool, user_id, filter.clone())
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;
    let records = TradeRepository::list(pool, user_id, filter)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    Ok(Json(TradesListResponse {
        trades: records.into_iter().map(TradeResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// 거래 단건 조회.
///
/// GET /api/v1/trades/{id}
#[utoipa::path(
    get,
    path = "/api/v1/trades/{id}",
    tag = "trades",
    params(("id" = Uuid, Path, description = "거래 ID")),
    responses(
        (status = 200, description = "거래 상세", body = TradeResponse),
        (status = 404, description = "거래 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(trade_id): Path<Uuid>,
) -> ApiResult<Json<TradeResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let record = TradeRepository::get(pool, user_id, trade_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "거래를 찾을 수 없습니다: {trade_id}"
            )))
        })?;

    Ok(Json(record.into()))
}

/// 거래 수정 (메모/태그/기법).
///
/// PUT /api/v1/trades/{id}
#[utoipa::path(
    put,
    path = "/api/v1/trades/{id}",
    tag = "trades",
    params(("id" = Uuid, Path, description = "거래 ID")),
    request_body = UpdateTradeRequest,
    responses(
        (status = 200, description = "수정된 거래", body = TradeResponse),
        (status = 404, description = "거래 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(trade_id): Path<Uuid>,
    Json(req): Json<UpdateTradeRequest>,
) -> ApiResult<Json<TradeResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let update = TradeUpdate {
        notes: req.notes,
        tags: req.tags,
        method_id: req.method_id,
    };

    let record = TradeRepository::update(pool, user_id, trade_id, update)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?
        .ok_or_else(|| {
            map_journal_error(JournalError::NotFound(format!(
                "거래를 찾을 수 없습니다: {trade_id}"
            )))
        })?;

    Ok(Json(record.into()))
}

/// 거래 청산.
///
/// POST /api/v1/trades/{id}/close
///
/// 이미 청산된 거래에 대해서는 400을 반환합니다.
#[utoipa::path(
    post,
    path = "/api/v1/trades/{id}/close",
    tag = "trades",
    params(("id" = Uuid, Path, description = "거래 ID")),
    request_body = CloseTradeRequest,
    responses(
        (status = 200, description = "청산된 거래", body = TradeResponse),
        (status = 400, description = "이미 청산됨 또는 잘못된 입력", body = ApiErrorResponse),
        (status = 404, description = "거래 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn close_trade(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(trade_id): Path<Uuid>,
    Json(req): Json<CloseTradeRequest>,
) -> ApiResult<Json<TradeResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    validate_request(&req)?;

    let exit_at = req.exit_at.unwrap_or_else(Utc::now);

    let record = TradeRepository::close_trade(pool, user_id, trade_id, req.exit_price, exit_at)
        .await
        .map_err(map_journal_error)?;

    let outcome = match record.profit {
        Some(p) if p > Decimal::ZERO => "win",
        Some(p) if p < Decimal::ZERO => "loss",
        _ => "break_even",
    };
    record_trade_closed(outcome);
    tracing::info!(trade_id = %record.id, outcome, "거래 청산");

    Ok(Json(record.into()))
}

/// 거래 삭제.
///
/// DELETE /api/v1/trades/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/trades/{id}",
    tag = "trades",
    params(("id" = Uuid, Path, description = "거래 ID")),
    responses(
        (status = 204, description = "삭제됨"),
        (status = 404, description = "거래 없음", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(trade_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let deleted = TradeRepository::delete(pool, user_id, trade_id)
        .await
        .map_err(|e| map_journal_error(JournalError::from(e)))?;

    if deleted == 0 {
        return Err(map_journal_error(JournalError::NotFound(format!(
            "거래를 찾을 수 없습니다: {trade_id}"
        ))));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// 거래 통계 조회.
///
/// GET /api/v1/trades/stats
///
/// 승률과 평균 손익은 청산된 거래만을 분모로 계산합니다.
#[utoipa::path(
    get,
    path = "/api/v1/trades/stats",
    tag = "trades",
    responses(
        (status = 200, description = "거래 통계", body = StatisticsResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Json<StatisticsResponse>> {
    let user_id = auth_user_id(&auth)?;
    let pool = get_db_pool(&state)?;

    let records = TradeRepository::list_for_statistics(pool, user_id, query.method_id)
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

/// 거래 라우터 생성.
pub fn trades_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_trades).post(create_trade))
        .route("/stats", get(get_statistics))
        .route(
            "/{id}",
            get(get_trade).put(update_trade).delete(delete_trade),
        )
        .route("/{id}/close", post(close_trade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_record() -> TradeRecord {
        TradeRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            side: "long".to_string(),
            quantity: dec!(10),
            entry_price: dec!(150.5),
            entry_at: Utc::now(),
            exit_price: Some(dec!(160)),
            exit_at: Some(Utc::now()),
            profit: Some(dec!(95)),
            status: "closed".to_string(),
            method_id: None,
            notes: Some("실적 발표 후 진입".to_string()),
            tags: Some(serde_json::json!(["earnings"])),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_to_response() {
        let record = sample_record();
        let response = TradeResponse::from(record.clone());

        assert_eq!(response.id, record.id);
        assert_eq!(response.quantity, "10");
        assert_eq!(response.entry_price, "150.5");
        assert_eq!(response.profit, Some("95".to_string()));
        assert_eq!(response.tags, vec!["earnings"]);
    }

    #[test]
    fn test_validate_create_rejects_blank_symbol() {
        let req = CreateTradeRequest {
            symbol: "  ".to_string(),
            side: "long".to_string(),
            quantity: dec!(1),
            entry_price: dec!(100),
            entry_at: None,
            method_id: None,
            notes: None,
            tags: vec![],
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_create_rejects_bad_side() {
        let req = CreateTradeRequest {
            symbol: "AAPL".to_string(),
            side: "diagonal".to_string(),
            quantity: dec!(1),
            entry_price: dec!(100),
            entry_at: None,
            method_id: None,
            notes: None,
            tags: vec![],
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_create_rejects_zero_quantity() {
        let req = CreateTradeRequest {
            symbol: "AAPL".to_string(),
            side: "short".to_string(),
            quantity: dec!(0),
            entry_price: dec!(100),
            entry_at: None,
            method_id: None,
            notes: None,
            tags: vec![],
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_statistics_response_conversion() {
        let stats = TradeStatistics {
            total_trades: 4,
            closed_trades: 3,
            winning_trades: 2,
            losing_trades: 1,
            win_rate_pct: dec!(66.67),
            total_profit: dec!(75),
            ..Default::default()
        };

        let response = StatisticsResponse::from(stats);
        assert_eq!(response.total_trades, 4);
        assert_eq!(response.win_rate_pct, "66.67");
        assert_eq!(response.total_profit, "75");
    }
}
