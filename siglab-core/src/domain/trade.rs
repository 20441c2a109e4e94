//! TradeRecord — a settled round-trip trade.

use super::signal::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Why a position closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Take-profit: favorable excursion reached the target (maker fill).
    Tp,
    /// Stop-loss: adverse excursion breached the stop (taker fill).
    Sl,
    /// Time-to-live: window elapsed, closed at final observed price (taker fill).
    Ttl,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Tp => write!(f, "TP"),
            ExitReason::Sl => write!(f, "SL"),
            ExitReason::Ttl => write!(f, "TTL"),
        }
    }
}

/// A complete round-trip trade: admission → settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: Direction,

    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    /// Equity committed at entry.
    pub equity: f64,
    /// Leveraged position value (equity × leverage).
    pub notional: f64,

    pub gross_pnl: f64,
    pub fees: f64,
    pub net_pnl: f64,

    /// Account balance after this trade settled.
    pub balance_after: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Net return as a fraction of committed equity.
    pub fn return_pct(&self) -> f64 {
        if self.equity <= 0.0 {
            return 0.0;
        }
        self.net_pnl / self.equity
    }
}
