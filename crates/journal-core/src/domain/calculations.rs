//! 매매 손익 계산 공통 로직.
//!
//! 거래 청산과 통계 집계에서 공유하는 P&L 계산 함수를 제공합니다.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::trade::TradeSide;

/// 실현 손익 계산.
///
/// 진입가와 청산가의 차이로 손익을 계산합니다.
///
/// # Arguments
///
/// * `entry_price` - 진입 가격
/// * `exit_price` - 청산 가격
/// * `quantity` - 거래 수량
/// * `side` - 포지션 방향
///
/// # Returns
///
/// 실현 손익
pub fn realized_pnl(
    entry_price: Decimal,
    exit_price: Decimal,
    quantity: Decimal,
    side: TradeSide,
) -> Decimal {
    match side {
        TradeSide::Long => {
            // 롱 포지션: (청산가 - 진입가) × 수량
            (exit_price - entry_price) * quantity
        }
        TradeSide::Short => {
            // 숏 포지션: (진입가 - 청산가) × 수량
            (entry_price - exit_price) * quantity
        }
    }
}

/// 수익률 계산 (백분율).
///
/// # Arguments
///
/// * `pnl` - 손익
/// * `cost_basis` - 비용 기준 (진입 시 투입 자본)
///
/// # Returns
///
/// 수익률 (백분율, 예: 10.5 = 10.5%)
pub fn return_pct(pnl: Decimal, cost_basis: Decimal) -> Decimal {
    if cost_basis > Decimal::ZERO {
        (pnl / cost_basis) * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// 명목 가치 계산 (포지션 크기).
pub fn notional_value(price: Decimal, quantity: Decimal) -> Decimal {
    price * quantity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realized_pnl_long() {
        let pnl = realized_pnl(dec!(100), dec!(110), dec!(10), TradeSide::Long);
        assert_eq!(pnl, dec!(100));
    }

    #[test]
    fn test_realized_pnl_short() {
        let pnl = realized_pnl(dec!(110), dec!(100), dec!(10), TradeSide::Short);
        assert_eq!(pnl, dec!(100));
    }

    #[test]
    fn test_realized_pnl_short_loss() {
        let pnl = realized_pnl(dec!(100), dec!(110), dec!(10), TradeSide::Short);
        assert_eq!(pnl, dec!(-100));
    }

    #[test]
    fn test_return_pct() {
        let ret = return_pct(dec!(50), dec!(1000));
        assert_eq!(ret, dec!(5)); // 5%
    }

    #[test]
    fn test_return_pct_zero_cost() {
        assert_eq!(return_pct(dec!(50), dec!(0)), Decimal::ZERO);
    }

    #[test]
    fn test_notional_value() {
        assert_eq!(notional_value(dec!(100), dec!(10)), dec!(1000));
    }
}
