//! 거래 통계 계산 공통 로직.
//!
//! 전체 저널과 매매법별 조회에서 공유하는 성과 지표를 제공합니다.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::trade::Trade;

/// 거래 통계 집계.
///
/// 승률, Profit Factor, 평균 손익 등 거래 성과를 요약합니다.
/// `total_trades` 는 미청산 거래를 포함한 전체 건수이며, 손익 기반
/// 지표(승률, 총손익 등)는 청산된 거래만으로 계산합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct TradeStatistics {
    /// 총 거래 횟수 (미청산 포함)
    pub total_trades: usize,
    /// 청산된 거래 횟수
    pub closed_trades: usize,
    /// 수익 거래 횟수
    pub winning_trades: usize,
    /// 손실 거래 횟수
    pub losing_trades: usize,
    /// 승률 (백분율, 소수점 둘째 자리 반올림, 예: 66.67)
    pub win_rate_pct: Decimal,
    /// 총손익 (청산된 거래의 손익 합)
    pub total_profit: Decimal,
    /// 거래당 평균 손익 (청산된 거래 기준)
    pub avg_profit: Decimal,
    /// 총 수익 (수익 거래만)
    pub gross_profit: Decimal,
    /// 총 손실 (손실 거래만, 양수)
    pub gross_loss: Decimal,
    /// Profit Factor (총수익 / 총손실)
    pub profit_factor: Decimal,
    /// 평균 수익 (수익 거래만)
    pub avg_win: Decimal,
    /// 평균 손실 (손실 거래만, 양수)
    pub avg_loss: Decimal,
    /// 최대 수익 거래
    pub largest_win: Decimal,
    /// 최대 손실 거래 (음수)
    pub largest_loss: Decimal,
}

impl Default for TradeStatistics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            closed_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            avg_profit: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
        }
    }
}

impl TradeStatistics {
    /// 빈 통계 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 거래 목록으로부터 통계 계산.
    ///
    /// # Type Parameters
    ///
    /// * `T` - TradeOutcome trait을 구현한 타입
    pub fn from_trades<T: TradeOutcome>(trades: &[T]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let mut stats = Self::new();
        stats.total_trades = trades.len();

        let mut winning_pnls = Vec::new();
        let mut losing_pnls = Vec::new();

        for trade in trades {
            // 손익이 없으면 스킵 (미청산 거래)
            let Some(pnl) = trade.profit() else {
                continue;
            };

            stats.closed_trades += 1;
            stats.total_profit += pnl;

            // 수익/손실 분류 (손익 0은 무승부로 어느 쪽에도 포함하지 않음)
            if pnl > Decimal::ZERO {
                stats.winning_trades += 1;
                stats.gross_profit += pnl;
                winning_pnls.push(pnl);

                if pnl > stats.largest_win {
                    stats.largest_win = pnl;
                }
            } else if pnl < Decimal::ZERO {
                stats.losing_trades += 1;
                stats.gross_loss += pnl.abs();
                losing_pnls.push(pnl.abs());

                if pnl < stats.largest_loss {
                    stats.largest_loss = pnl;
                }
            }
        }

        // 승률 계산 (청산된 거래 기준)
        if stats.closed_trades > 0 {
            stats.win_rate_pct = ((Decimal::from(stats.winning_trades)
                / Decimal::from(stats.closed_trades))
                * dec!(100))
            .round_dp(2);

            stats.avg_profit = stats.total_profit / Decimal::from(stats.closed_trades);
        }

        // Profit Factor 계산
        if stats.gross_loss > Decimal::ZERO {
            stats.profit_factor = stats.gross_profit / stats.gross_loss;
        } else if stats.gross_profit > Decimal::ZERO {
            // 손실 없이 수익만 있으면 무한대 (실무에서는 큰 값으로 표현)
            stats.profit_factor = dec!(999999);
        }

        // 평균 수익/손실 계산
        if !winning_pnls.is_empty() {
            let sum: Decimal = winning_pnls.iter().sum();
            stats.avg_win = sum / Decimal::from(winning_pnls.len());
        }

        if !losing_pnls.is_empty() {
            let sum: Decimal = losing_pnls.iter().sum();
            stats.avg_loss = sum / Decimal::from(losing_pnls.len());
        }

        stats
    }

    /// 손익비 (평균수익 / 평균손실).
    pub fn profit_loss_ratio(&self) -> Decimal {
        if self.avg_loss > Decimal::ZERO {
            self.avg_win / self.avg_loss
        } else if self.avg_win > Decimal::ZERO {
            dec!(999999) // 손실 없으면 무한대
        } else {
            Decimal::ZERO
        }
    }

    /// 미청산 거래 횟수.
    pub fn open_trades(&self) -> usize {
        self.total_trades - self.closed_trades
    }
}

/// 거래 결과를 제공하는 trait.
///
/// 도메인 `Trade` 와 저장소 레코드 등 다양한 타입에서 통계 계산에
/// 필요한 정보를 추출하기 위한 인터페이스입니다.
pub trait TradeOutcome {
    /// 실현 손익.
    ///
    /// # Returns
    ///
    /// - `Some(pnl)`: 청산된 거래의 손익
    /// - `None`: 미청산 거래
    fn profit(&self) -> Option<Decimal>;

    /// 진입 시각.
    fn entry_time(&self) -> DateTime<Utc>;

    /// 청산 시각.
    fn exit_time(&self) -> Option<DateTime<Utc>>;

    /// 보유 기간.
    fn holding_duration(&self) -> Option<Duration> {
        self.exit_time()
            .map(|exit| exit.signed_duration_since(self.entry_time()))
    }
}

impl TradeOutcome for Trade {
    fn profit(&self) -> Option<Decimal> {
        self.profit
    }

    fn entry_time(&self) -> DateTime<Utc> {
        self.entry_at
    }

    fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_at
    }
}
