//! 거래 저장소.
//!
//! trades 테이블의 CRUD 및 청산 처리를 담당합니다.
//!
//! # 청산 동시성
//!
//! [`close_trade`](TradeRepository::close_trade)는 `status = 'open'` 조건부 UPDATE로
//! 청산을 처리하여 동일 거래에 대한 동시 청산 요청 중 하나만 성공하도록 보장합니다.

use chrono::{DateTime, Utc};
use journal_core::{JournalError, Trade, TradeSide, TradeStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

/// 거래 레코드.
///
/// side/status는 텍스트 컬럼을 그대로 담고, 도메인 변환 시 enum으로 파싱합니다.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TradeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_at: DateTime<Utc>,
    pub exit_price: Option<Decimal>,
    pub exit_at: Option<DateTime<Utc>>,
    pub profit: Option<Decimal>,
    pub status: String,
    pub method_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TradeRecord> for Trade {
    type Error = JournalError;

    fn try_from(record: TradeRecord) -> Result<Self, Self::Error> {
        let tags: Vec<String> = match record.tags {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        Ok(Trade {
            id: record.id,
            user_id: record.user_id,
            symbol: record.symbol,
            side: TradeSide::from_str(&record.side)?,
            quantity: record.quantity,
            entry_price: record.entry_price,
            entry_at: record.entry_at,
            exit_price: record.exit_price,
            exit_at: record.exit_at,
            profit: record.profit,
            status: TradeStatus::from_str(&record.status)?,
            method_id: record.method_id,
            notes: record.notes,
            tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// 거래 생성 입력.
#[derive(Debug, Clone)]
pub struct TradeInput {
    pub user_id: Uuid,
    pub symbol: String,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_at: DateTime<Utc>,
    pub method_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

/// 거래 수정 입력. None인 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct TradeUpdate {
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub method_id: Option<Option<Uuid>>,
}

/// 거래 조회 필터.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub status: Option<String>,
    pub method_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// 거래 저장소.
pub struct TradeRepository;

impl TradeRepository {
    /// 거래 기록 추가. 상태는 항상 open으로 생성됩니다.
    pub async fn create(pool: &PgPool, input: TradeInput) -> Result<TradeRecord, sqlx::Error> {
        let tags_json = serde_json::to_value(&input.tags).unwrap_or_default();

        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            INSERT INTO trades (
                user_id, symbol, side, quantity, entry_price, entry_at,
                status, method_id, notes, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'open', $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(&input.symbol)
        .bind(input.side.as_str())
        .bind(input.quantity)
        .bind(input.entry_price)
        .bind(input.entry_at)
        .bind(input.method_id)
        .bind(&input.notes)
        .bind(tags_json)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// 거래 목록 조회 (필터 적용, 최신순).
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        filter: TradeFilter,
    ) -> Result<Vec<TradeRecord>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(100);
        let offset = filter.offset.unwrap_or(0);

        let records = sqlx::query_as::<_, TradeRecord>(
            r#"
            SELECT *
            FROM trades
            WHERE user_id = $1
                AND ($2::text IS NULL OR symbol = $2)
                AND ($3::text IS NULL OR side = $3)
                AND ($4::text IS NULL OR status = $4)
                AND ($5::uuid IS NULL OR method_id = $5)
                AND ($6::timestamptz IS NULL OR entry_at >= $6)
                AND ($7::timestamptz IS NULL OR entry_at <= $7)
            ORDER BY entry_at DESC
            LIMIT $8 OFFSET $9
            "#,
        )
        .bind(user_id)
        .bind(&filter.symbol)
        .bind(&filter.side)
        .bind(&filter.status)
        .bind(filter.method_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// 거래 개수 조회.
    pub async fn count(
        pool: &PgPool,
        user_id: Uuid,
        filter: TradeFilter,
    ) -> Result<i64, sqlx::Error> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM trades
            WHERE user_id = $1
                AND ($2::text IS NULL OR symbol = $2)
                AND ($3::text IS NULL OR side = $3)
                AND ($4::text IS NULL OR status = $4)
                AND ($5::uuid IS NULL OR method_id = $5)
                AND ($6::timestamptz IS NULL OR entry_at >= $6)
                AND ($7::timestamptz IS NULL OR entry_at <= $7)
            "#,
        )
        .bind(user_id)
        .bind(&filter.symbol)
        .bind(&filter.side)
        .bind(&filter.status)
        .bind(filter.method_id)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_one(pool)
        .await?;

        Ok(result.0)
    }

    /// 거래 단건 조회. 소유자 검증을 위해 user_id도 조건에 포함합니다.
    pub async fn get(
        pool: &PgPool,
        user_id: Uuid,
        trade_id: Uuid,
    ) -> Result<Option<TradeRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, TradeRecord>(
            "SELECT * FROM trades WHERE id = $1 AND user_id = $2",
        )
        .bind(trade_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 거래 메모/태그/기법 수정.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        trade_id: Uuid,
        update: TradeUpdate,
    ) -> Result<Option<TradeRecord>, sqlx::Error> {
        let tags_json: Option<Value> =
            update.tags.map(|t| serde_json::to_value(t).unwrap_or_default());
        // method_id: 외부 Option은 변경 여부, 내부 Option은 연결 해제(NULL)
        let (set_method, method_id) = match update.method_id {
            Some(m) => (true, m),
            None => (false, None),
        };

        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            UPDATE trades
            SET notes = COALESCE($3, notes),
                tags = COALESCE($4, tags),
                method_id = CASE WHEN $5 THEN $6 ELSE method_id END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(trade_id)
        .bind(user_id)
        .bind(&update.notes)
        .bind(tags_json)
        .bind(set_method)
        .bind(method_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 거래 청산.
    ///
    /// `status = 'open'` 조건부 UPDATE로 동시 청산 요청 중 하나만 성공합니다.
    /// 손익은 방향에 따라 DB에서 계산하여 조회-수정 사이의 경합을 제거합니다.
    ///
    /// # 반환값
    ///
    /// - `Ok(record)`: 청산 성공
    /// - `Err(InvalidState)`: 거래는 존재하나 이미 청산됨
    /// - `Err(NotFound)`: 거래가 없거나 소유자가 아님
    pub async fn close_trade(
        pool: &PgPool,
        user_id: Uuid,
        trade_id: Uuid,
        exit_price: Decimal,
        exit_at: DateTime<Utc>,
    ) -> Result<TradeRecord, JournalError> {
        let record = sqlx::query_as::<_, TradeRecord>(
            r#"
            UPDATE trades
            SET exit_price = $3,
                exit_at = $4,
                profit = CASE
                    WHEN side = 'long' THEN ($3 - entry_price) * quantity
                    ELSE (entry_price - $3) * quantity
                END,
                status = 'closed',
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(trade_id)
        .bind(user_id)
        .bind(exit_price)
        .bind(exit_at)
        .fetch_optional(pool)
        .await?;

        match record {
            Some(record) => Ok(record),
            // 조건부 UPDATE 실패: 존재 여부를 확인하여 에러를 구분
            None => match Self::get(pool, user_id, trade_id).await? {
                Some(_) => Err(JournalError::InvalidState(format!(
                    "이미 청산된 거래입니다: {trade_id}"
                ))),
                None => Err(JournalError::NotFound(format!(
                    "거래를 찾을 수 없습니다: {trade_id}"
                ))),
            },
        }
    }

    /// 거래 삭제.
    ///
    /// # 반환값
    ///
    /// 삭제된 행 수 (0이면 없거나 소유자가 아님)
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        trade_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND user_id = $2")
            .bind(trade_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// 통계 계산용 전체 거래 조회 (기법 필터 선택적).
    pub async fn list_for_statistics(
        pool: &PgPool,
        user_id: Uuid,
        method_id: Option<Uuid>,
    ) -> Result<Vec<TradeRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, TradeRecord>(
            r#"
            SELECT *
            FROM trades
            WHERE user_id = $1
                AND ($2::uuid IS NULL OR method_id = $2)
            ORDER BY entry_at ASC
            "#,
        )
        .bind(user_id)
        .bind(method_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_record() -> TradeRecord {
        TradeRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            side: "long".to_string(),
            quantity: dec!(10),
            entry_price: dec!(150),
            entry_at: Utc::now(),
            exit_price: None,
            exit_at: None,
            profit: None,
            status: "open".to_string(),
            method_id: None,
            notes: None,
            tags: Some(serde_json::json!(["breakout", "swing"])),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_to_domain_trade() {
        let record = sample_record();
        let trade = Trade::try_from(record.clone()).unwrap();

        assert_eq!(trade.side, TradeSide::Long);
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.tags, vec!["breakout", "swing"]);
        assert_eq!(trade.id, record.id);
    }

    #[test]
    fn test_record_with_invalid_side_rejected() {
        let mut record = sample_record();
        record.side = "sideways".to_string();

        assert!(Trade::try_from(record).is_err());
    }

    #[test]
    fn test_record_without_tags_converts_to_empty() {
        let mut record = sample_record();
        record.tags = None;

        let trade = Trade::try_from(record).unwrap();
        assert!(trade.tags.is_empty());
    }
}
