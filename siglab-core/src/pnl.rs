//! Net P&L arithmetic shared by both resolvers.
//!
//! `gross_pct = price_change_pct × leverage`; fees are charged on the
//! leveraged notional at entry and exit, so in equity terms
//! `net_pct = gross_pct − leverage × (entry_rate + exit_rate)`.

use crate::domain::{Direction, ExitReason};
use crate::fees::FeeSchedule;

/// Breakdown of a resolved position's profit and loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnlBreakdown {
    pub gross_pnl: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    pub net_pnl: f64,
}

impl PnlBreakdown {
    pub fn total_fees(&self) -> f64 {
        self.entry_fee + self.exit_fee
    }
}

/// Signed price move as a fraction of entry, from the position's viewpoint.
pub fn price_change_pct(entry: f64, exit: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Buy => (exit - entry) / entry,
        Direction::Sell => (entry - exit) / entry,
    }
}

/// Compute gross, fees, and net for one round trip.
pub fn compute(
    entry_price: f64,
    exit_price: f64,
    direction: Direction,
    equity: f64,
    leverage: u32,
    reason: ExitReason,
    fees: &FeeSchedule,
) -> PnlBreakdown {
    let notional = equity * leverage as f64;
    let gross_pnl = notional * price_change_pct(entry_price, exit_price, direction);
    let entry_fee = fees.entry_fee(notional);
    let exit_fee = fees.exit_fee(reason, notional);
    PnlBreakdown {
        gross_pnl,
        entry_fee,
        exit_fee,
        net_pnl: gross_pnl - entry_fee - exit_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gross_pct_matches_leverage() {
        // entry=100, exit=102, 10x BUY, zero fees ⇒ gross = 20% of equity
        let pnl = compute(
            100.0,
            102.0,
            Direction::Buy,
            1000.0,
            10,
            ExitReason::Tp,
            &FeeSchedule::zero(),
        );
        assert!((pnl.gross_pnl - 200.0).abs() < 1e-9);
        assert_eq!(pnl.net_pnl, pnl.gross_pnl);
    }

    #[test]
    fn fees_deducted_from_gross() {
        let fees = FeeSchedule::bingx();
        let pnl = compute(100.0, 102.0, Direction::Buy, 1000.0, 10, ExitReason::Tp, &fees);
        // notional 10_000: entry 5.0, TP exit 2.0
        assert!((pnl.entry_fee - 5.0).abs() < 1e-9);
        assert!((pnl.exit_fee - 2.0).abs() < 1e-9);
        assert!((pnl.net_pnl - (200.0 - 7.0)).abs() < 1e-9);
        assert!((pnl.total_fees() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn sell_direction_inverts_move() {
        let pnl = compute(
            100.0,
            98.0,
            Direction::Sell,
            1000.0,
            5,
            ExitReason::Tp,
            &FeeSchedule::zero(),
        );
        // 2% favorable move at 5x on 5_000 notional
        assert!((pnl.gross_pnl - 100.0).abs() < 1e-9);
    }

    #[test]
    fn losing_sell_is_negative() {
        let pnl = compute(
            100.0,
            101.0,
            Direction::Sell,
            1000.0,
            10,
            ExitReason::Sl,
            &FeeSchedule::zero(),
        );
        assert!((pnl.gross_pnl - (-100.0)).abs() < 1e-9);
    }
}
