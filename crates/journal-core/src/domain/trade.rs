//! 거래 기록.
//!
//! 이 모듈은 저널의 거래 기록 관련 타입을 정의합니다:
//! - `Trade` - 개별 거래 기록 (진입 → 청산 라이프사이클)
//! - `TradeSide` - 포지션 방향
//! - `TradeStatus` - 거래 상태

use crate::domain::calculations::realized_pnl;
use crate::error::{JournalError, JournalResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// 롱 (상승 베팅)
    Long,
    /// 숏 (하락 베팅)
    Short,
}

impl TradeSide {
    /// 문자열 표현을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TradeSide {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(TradeSide::Long),
            "short" => Ok(TradeSide::Short),
            other => Err(JournalError::InvalidInput(format!(
                "알 수 없는 포지션 방향: {}",
                other
            ))),
        }
    }
}

/// 거래 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    /// 포지션 보유 중
    Open,
    /// 청산 완료
    Closed,
}

impl TradeStatus {
    /// 문자열 표현을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TradeStatus {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "closed" => Ok(TradeStatus::Closed),
            other => Err(JournalError::InvalidInput(format!(
                "알 수 없는 거래 상태: {}",
                other
            ))),
        }
    }
}

/// 저널에 기록되는 개별 거래.
///
/// 진입 시 `Open` 상태로 생성되고, 청산 시 `Closed` 상태로 전이되며
/// 실현 손익이 확정됩니다. `Closed` 에서 `Open` 으로 되돌아갈 수 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Trade {
    /// 거래 ID
    pub id: Uuid,
    /// 소유자 사용자 ID
    pub user_id: Uuid,
    /// 거래 심볼 (예: "BTC/USDT", "AAPL")
    pub symbol: String,
    /// 포지션 방향
    pub side: TradeSide,
    /// 거래 수량
    pub quantity: Decimal,
    /// 진입 가격
    pub entry_price: Decimal,
    /// 진입 시각
    pub entry_at: DateTime<Utc>,
    /// 청산 가격 (청산 전이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Decimal>,
    /// 청산 시각 (청산 전이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_at: Option<DateTime<Utc>>,
    /// 실현 손익 (청산 전이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
    /// 거래 상태
    pub status: TradeStatus,
    /// 사용한 매매법 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_id: Option<Uuid>,
    /// 거래 메모
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// 태그 목록
    #[serde(default)]
    pub tags: Vec<String>,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// 새 거래를 `Open` 상태로 생성합니다.
    pub fn new(
        user_id: Uuid,
        symbol: impl Into<String>,
        side: TradeSide,
        quantity: Decimal,
        entry_price: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol: symbol.into(),
            side,
            quantity,
            entry_price,
            entry_at: now,
            exit_price: None,
            exit_at: None,
            profit: None,
            status: TradeStatus::Open,
            method_id: None,
            notes: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 매매법을 연결합니다.
    pub fn with_method(mut self, method_id: Uuid) -> Self {
        self.method_id = Some(method_id);
        self
    }

    /// 메모를 설정합니다.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// 진입 시각을 설정합니다.
    pub fn with_entry_at(mut self, entry_at: DateTime<Utc>) -> Self {
        self.entry_at = entry_at;
        self
    }

    /// 태그를 설정합니다.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// 포지션 보유 중인지 확인합니다.
    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// 거래의 명목 가치를 반환합니다 (진입가 × 수량).
    pub fn notional_value(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    /// 거래를 청산하고 실현 손익을 확정합니다.
    ///
    /// # Errors
    ///
    /// - 이미 청산된 거래면 `InvalidState`
    /// - 청산 가격이 0 이하면 `InvalidInput`
    pub fn close(&mut self, exit_price: Decimal, exit_at: DateTime<Utc>) -> JournalResult<()> {
        if self.status != TradeStatus::Open {
            return Err(JournalError::InvalidState(format!(
                "이미 청산된 거래입니다: {}",
                self.id
            )));
        }
        if exit_price <= Decimal::ZERO {
            return Err(JournalError::InvalidInput(
                "청산 가격은 0보다 커야 합니다".to_string(),
            ));
        }

        let profit = realized_pnl(self.entry_price, exit_price, self.quantity, self.side);

        self.exit_price = Some(exit_price);
        self.exit_at = Some(exit_at);
        self.profit = Some(profit);
        self.status = TradeStatus::Closed;
        self.updated_at = Utc::now();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn open_trade(side: TradeSide) -> Trade {
        Trade::new(Uuid::new_v4(), "BTC/USDT", side, dec!(2), dec!(100))
    }

    #[test]
    fn test_trade_creation() {
        let trade = open_trade(TradeSide::Long).with_notes("breakout entry");

        assert_eq!(trade.status, TradeStatus::Open);
        assert!(trade.is_open());
        assert!(trade.exit_price.is_none());
        assert!(trade.profit.is_none());
        assert_eq!(trade.notional_value(), dec!(200));
    }

    #[test]
    fn test_close_long_profit() {
        let mut trade = open_trade(TradeSide::Long);
        trade.close(dec!(110), Utc::now()).unwrap();

        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.profit, Some(dec!(20))); // (110-100) * 2
        assert_eq!(trade.exit_price, Some(dec!(110)));
    }

    #[test]
    fn test_close_short_sign_flipped() {
        let mut trade = open_trade(TradeSide::Short);
        trade.close(dec!(110), Utc::now()).unwrap();

        // 숏 포지션에서 가격 상승은 손실
        assert_eq!(trade.profit, Some(dec!(-20))); // (100-110) * 2
    }

    #[test]
    fn test_close_twice_rejected() {
        let mut trade = open_trade(TradeSide::Long);
        trade.close(dec!(110), Utc::now()).unwrap();

        let err = trade.close(dec!(120), Utc::now()).unwrap_err();
        assert!(matches!(err, JournalError::InvalidState(_)));
        // 첫 청산 결과는 그대로 유지
        assert_eq!(trade.exit_price, Some(dec!(110)));
    }

    #[test]
    fn test_close_non_positive_exit_price() {
        let mut trade = open_trade(TradeSide::Long);

        let err = trade.close(dec!(0), Utc::now()).unwrap_err();
        assert!(matches!(err, JournalError::InvalidInput(_)));
        assert!(trade.is_open());
    }

    #[test]
    fn test_side_round_trip() {
        assert_eq!("long".parse::<TradeSide>().unwrap(), TradeSide::Long);
        assert_eq!("SHORT".parse::<TradeSide>().unwrap(), TradeSide::Short);
        assert!("sideways".parse::<TradeSide>().is_err());
        assert_eq!(TradeSide::Long.to_string(), "long");
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("open".parse::<TradeStatus>().unwrap(), TradeStatus::Open);
        assert_eq!("closed".parse::<TradeStatus>().unwrap(), TradeStatus::Closed);
        assert!("pending".parse::<TradeStatus>().is_err());
    }
}
