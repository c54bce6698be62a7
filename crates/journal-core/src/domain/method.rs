//! 매매법.
//!
//! 사용자가 정의한 매매 전략(매매법)과 거래 기록을 연결하는 타입입니다.

use crate::error::{JournalError, JournalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 사용자 정의 매매법.
///
/// 거래 기록은 `method_id` 로 매매법을 참조하며, 매매법별 성과를
/// 집계할 때 기준이 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct TradingMethod {
    /// 매매법 ID
    pub id: Uuid,
    /// 소유자 사용자 ID
    pub user_id: Uuid,
    /// 매매법 이름
    pub name: String,
    /// 설명
    #[serde(skip_serializing_if = "Option::is_none")]
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
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl TradingMethod {
    /// 새 매매법을 생성합니다.
    ///
    /// # Errors
    ///
    /// 이름이 비어 있으면 `InvalidInput`
    pub fn new(user_id: Uuid, name: impl Into<String>) -> JournalResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(JournalError::InvalidInput(
                "매매법 이름은 비울 수 없습니다".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            rules: Vec::new(),
            indicators: Vec::new(),
            timeframes: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// 설명을 설정합니다.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 매매 규칙을 설정합니다.
    pub fn with_rules(mut self, rules: Vec<String>) -> Self {
        self.rules = rules;
        self
    }

    /// 사용 지표를 설정합니다.
    pub fn with_indicators(mut self, indicators: Vec<String>) -> Self {
        self.indicators = indicators;
        self
    }

    /// 타임프레임을 설정합니다.
    pub fn with_timeframes(mut self, timeframes: Vec<String>) -> Self {
        self.timeframes = timeframes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_creation() {
        let method = TradingMethod::new(Uuid::new_v4(), "추세 추종")
            .unwrap()
            .with_description("이동평균 돌파 시 진입")
            .with_rules(vec!["20일 이평선 상향 돌파 시 진입".to_string()])
            .with_indicators(vec!["SMA20".to_string(), "RSI".to_string()]);

        assert_eq!(method.name, "추세 추종");
        assert_eq!(method.rules.len(), 1);
        assert_eq!(method.indicators.len(), 2);
        assert!(method.timeframes.is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = TradingMethod::new(Uuid::new_v4(), "   ").unwrap_err();
        assert!(matches!(err, JournalError::InvalidInput(_)));
    }
}
