//! 저널 시스템의 에러 타입.
//!
//! 이 모듈은 저널 시스템 전반에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

/// 핵심 저널 에러.
#[derive(Debug, Error)]
pub enum JournalError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 인증 에러 (사용자 식별 불가)
    #[error("인증 에러: {0}")]
    Unauthorized(String),

    /// 찾을 수 없음 (레코드 부재 또는 소유자 불일치)
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 잘못된 상태 전이 (예: 이미 청산된 거래의 재청산)
    #[error("잘못된 상태: {0}")]
    InvalidState(String),

    /// 심리 진단 채점 에러
    #[error("채점 에러: {0}")]
    Scoring(#[from] crate::domain::scoring::ScoringError),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),

    /// 외부 서비스 에러 (AI 분석 등)
    #[error("외부 서비스 에러: {0}")]
    External(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 저널 작업을 위한 Result 타입.
pub type JournalResult<T> = Result<T, JournalError>;

impl JournalError {
    /// 호출자 입력에 기인한 에러인지 확인합니다 (4xx 계열).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            JournalError::Unauthorized(_)
                | JournalError::NotFound(_)
                | JournalError::InvalidInput(_)
                | JournalError::InvalidState(_)
                | JournalError::Scoring(_)
        )
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for JournalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => JournalError::NotFound("레코드가 존재하지 않습니다".to_string()),
            other => JournalError::Database(other.to_string()),
        }
    }
}
