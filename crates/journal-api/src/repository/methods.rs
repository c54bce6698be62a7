//! 매매 기법 저장소.
//!
//! trading_methods 테이블의 CRUD를 담당합니다. 규칙/지표/타임프레임
//! 목록은 JSONB 컬럼으로 저장합니다.

use chrono::{DateTime, Utc};
use journal_core::{JournalError, TradingMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 매매 기법 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MethodRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// 매매 규칙 목록 (JSONB)
    pub rules: Option<Value>,
    /// 사용 지표 목록 (JSONB)
    pub indicators: Option<Value>,
    /// 적용 타임프레임 목록 (JSONB)
    pub timeframes: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn string_list(value: Option<Value>) -> Result<Vec<String>, JournalError> {
    match value {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(Vec::new()),
    }
}

impl TryFrom<MethodRecord> for TradingMethod {
    type Error = JournalError;

    fn try_from(record: MethodRecord) -> Result<Self, Self::Error> {
        Ok(TradingMethod {
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            description: record.description,
            rules: string_list(record.rules)?,
            indicators: string_list(record.indicators)?,
            timeframes: string_list(record.timeframes)?,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// 매매 기법 생성 입력.
#[derive(Debug, Clone)]
pub struct MethodInput {
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub rules: Vec<String>,
    pub indicators: Vec<String>,
    pub timeframes: Vec<String>,
}

/// 매매 기법 수정 입력. None인 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct MethodUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub rules: Option<Vec<String>>,
    pub indicators: Option<Vec<String>>,
    pub timeframes: Option<Vec<String>>,
}

/// 매매 기법 저장소.
pub struct MethodRepository;

impl MethodRepository {
    /// 매매 기법 추가.
    pub async fn create(pool: &PgPool, input: MethodInput) -> Result<MethodRecord, sqlx::Error> {
        let rules = serde_json::to_value(&input.rules).unwrap_or_default();
        let indicators = serde_json::to_value(&input.indicators).unwrap_or_default();
        let timeframes = serde_json::to_value(&input.timeframes).unwrap_or_default();

        let record = sqlx::query_as::<_, MethodRecord>(
            r#"
            INSERT INTO trading_methods (user_id, name, description, rules, indicators, timeframes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(rules)
        .bind(indicators)
        .bind(timeframes)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// 매매 기법 목록 조회 (이름순).
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<MethodRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, MethodRecord>(
            "SELECT * FROM trading_methods WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// 매매 기법 단건 조회.
    pub async fn get(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<Option<MethodRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, MethodRecord>(
            "SELECT * FROM trading_methods WHERE id = $1 AND user_id = $2",
        )
        .bind(method_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 매매 기법 수정.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Uuid,
        update: MethodUpdate,
    ) -> Result<Option<MethodRecord>, sqlx::Error> {
        let rules: Option<Value> =
            update.rules.map(|v| serde_json::to_value(v).unwrap_or_default());
        let indicators: Option<Value> =
            update.indicators.map(|v| serde_json::to_value(v).unwrap_or_default());
        let timeframes: Option<Value> =
            update.timeframes.map(|v| serde_json::to_value(v).unwrap_or_default());

        let record = sqlx::query_as::<_, MethodRecord>(
            r#"
            UPDATE trading_methods
            SET name = COALESCE($3, name),
                description = COALESCE($4, description),
                rules = COALESCE($5, rules),
                indicators = COALESCE($6, indicators),
                timeframes = COALESCE($7, timeframes),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(method_id)
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(rules)
        .bind(indicators)
        .bind(timeframes)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 매매 기법 삭제. 연결된 거래의 method_id는 NULL로 남습니다.
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trading_methods WHERE id = $1 AND user_id = $2")
            .bind(method_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MethodRecord {
        MethodRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "돌파 매매".to_string(),
            description: Some("전고점 돌파 시 진입".to_string()),
            rules: Some(serde_json::json!(["거래량 동반 돌파", "손절 -3%"])),
            indicators: Some(serde_json::json!(["SMA20", "거래량"])),
            timeframes: Some(serde_json::json!(["1d"])),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_to_domain_method() {
        let record = sample_record();

        let method = TradingMethod::try_from(record.clone()).unwrap();
        assert_eq!(method.id, record.id);
        assert_eq!(method.name, "돌파 매매");
        assert_eq!(method.rules, vec!["거래량 동반 돌파", "손절 -3%"]);
        assert_eq!(method.indicators, vec!["SMA20", "거래량"]);
        assert_eq!(method.timeframes, vec!["1d"]);
    }

    #[test]
    fn test_null_lists_become_empty() {
        let record = MethodRecord {
            rules: None,
            indicators: None,
            timeframes: None,
            ..sample_record()
        };

        let method = TradingMethod::try_from(record).unwrap();
        assert!(method.rules.is_empty());
        assert!(method.indicators.is_empty());
        assert!(method.timeframes.is_empty());
    }

    #[test]
    fn test_malformed_list_rejected() {
        let record = MethodRecord {
            rules: Some(serde_json::json!({"not": "a list"})),
            ..sample_record()
        };

        assert!(TradingMethod::try_from(record).is_err());
    }
}
