//! API 에러 응답 타입.
//!
//! 모든 REST 엔드포인트에서 일관된 JSON 에러 형식을 사용합니다.

use axum::http::StatusCode;
use axum::Json;
use journal_core::JournalError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API 핸들러 공통 결과 타입.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 표준 에러 응답 구조체.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "TRADE_NOT_FOUND", "VALIDATION_ERROR")
    pub code: String,

    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,

    /// 추가 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// 에러 발생 시각 (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ApiErrorResponse {
    /// 새 에러 응답 생성.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// 타임스탬프 없는 간단한 에러 응답.
    pub fn simple(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: None,
        }
    }

    /// 상세 정보를 포함한 에러 응답.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}

/// 도메인 에러를 HTTP 응답으로 변환.
///
/// 클라이언트 에러(4xx)는 원본 메시지를 그대로 노출하고,
/// 서버 에러(5xx)는 내부 상세를 숨기고 로그에만 남깁니다.
pub fn map_journal_error(err: JournalError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code) = match &err {
        JournalError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        JournalError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        JournalError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        JournalError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
        JournalError::Scoring(_) => (StatusCode::BAD_REQUEST, "SCORING_ERROR"),
        JournalError::External(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
        JournalError::Config(_)
        | JournalError::Database(_)
        | JournalError::Serialization(_)
        | JournalError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "내부 서버 에러");
        (
            status,
            Json(ApiErrorResponse::new(code, "내부 서버 에러가 발생했습니다")),
        )
    } else {
        (status, Json(ApiErrorResponse::new(code, err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_serialization() {
        let err = ApiErrorResponse::simple("NOT_FOUND", "거래를 찾을 수 없습니다");
        let json = serde_json::to_string(&err).unwrap();

        assert!(json.contains("NOT_FOUND"));
        assert!(!json.contains("details"));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_with_details() {
        let err = ApiErrorResponse::with_details(
            "VALIDATION_ERROR",
            "잘못된 입력",
            serde_json::json!({"field": "quantity"}),
        );

        assert!(err.details.is_some());
        assert!(err.timestamp.is_some());
    }

    #[test]
    fn test_map_not_found_to_404() {
        let (status, body) = map_journal_error(JournalError::NotFound("trade".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, "NOT_FOUND");
    }

    #[test]
    fn test_map_invalid_state_to_400() {
        let (status, body) =
            map_journal_error(JournalError::InvalidState("이미 청산됨".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_STATE");
    }

    #[test]
    fn test_server_error_hides_internals() {
        let (status, body) =
            map_journal_error(JournalError::Database("connection refused".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("connection refused"));
    }
}
