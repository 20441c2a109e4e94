//! Position — an admitted signal with its exit already resolved.
//!
//! The engine is non-interactive: the exit outcome is computed analytically
//! at admission time from the signal's recorded price extremes. A Position
//! only waits for the signal-time cursor to reach its `close_time` before it
//! settles into the trade list. It is never mutated after construction.

use super::signal::Direction;
use super::trade::{ExitReason, TradeRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,

    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    /// Equity committed to this position (counts against the balance until
    /// settlement).
    pub equity: f64,
    pub notional: f64,

    /// When the advancing signal-time cursor settles this position.
    pub close_time: NaiveDateTime,

    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub gross_pnl: f64,
    pub fees: f64,
    pub net_pnl: f64,
}

impl Position {
    /// Fold this position into a trade record at settlement.
    pub fn into_trade(self, balance_after: f64) -> TradeRecord {
        TradeRecord {
            symbol: self.symbol,
            direction: self.direction,
            entry_time: self.entry_time,
            entry_price: self.entry_price,
            exit_time: self.close_time,
            exit_price: self.exit_price,
            exit_reason: self.exit_reason,
            equity: self.equity,
            notional: self.notional,
            gross_pnl: self.gross_pnl,
            fees: self.fees,
            net_pnl: self.net_pnl,
            balance_after,
        }
    }
}
