//! Trade report — aggregate statistics for one backtest run.
//!
//! Every aggregate is a pure function over the trade list; `TradeReport`
//! just bundles them with the run outcome. No dependency on the ledger.

use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, TradeRecord};
use crate::ledger::SkipCounts;

/// Exit-reason distribution over a trade list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitDistribution {
    pub tp: usize,
    pub sl: usize,
    pub ttl: usize,
}

impl ExitDistribution {
    pub fn count(trades: &[TradeRecord]) -> Self {
        let mut dist = Self::default();
        for trade in trades {
            match trade.exit_reason {
                ExitReason::Tp => dist.tp += 1,
                ExitReason::Sl => dist.sl += 1,
                ExitReason::Ttl => dist.ttl += 1,
            }
        }
        dist
    }

    pub fn tp_pct(&self) -> f64 {
        percent_of(self.tp, self.tp + self.sl + self.ttl)
    }

    pub fn sl_pct(&self) -> f64 {
        percent_of(self.sl, self.tp + self.sl + self.ttl)
    }

    pub fn ttl_pct(&self) -> f64 {
        percent_of(self.ttl, self.tp + self.sl + self.ttl)
    }
}

fn percent_of(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Complete result of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub roi_pct: f64,

    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,

    pub total_net_pnl: f64,
    pub avg_net_pnl: f64,
    pub total_fees: f64,

    pub exits: ExitDistribution,
    /// Peak-to-trough of the balance curve, as a negative fraction.
    pub max_drawdown: f64,
    /// Gross winning pnl / |gross losing pnl|, capped at 100.
    pub profit_factor: f64,
    /// mean(pnl) / stdev(pnl) · √n; 0 when undefined.
    pub sharpe_like: f64,

    pub liquidated: bool,
    pub skips: SkipCounts,

    pub trades: Vec<TradeRecord>,
}

impl TradeReport {
    /// Build the report from a finished ledger's output.
    pub fn build(
        initial_balance: f64,
        final_balance: f64,
        trades: Vec<TradeRecord>,
        skips: SkipCounts,
        liquidated: bool,
    ) -> Self {
        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let losses = trades.len() - wins;
        let total_net_pnl: f64 = trades.iter().map(|t| t.net_pnl).sum();
        let total_fees: f64 = trades.iter().map(|t| t.fees).sum();
        let avg_net_pnl = if trades.is_empty() {
            0.0
        } else {
            total_net_pnl / trades.len() as f64
        };
        Self {
            initial_balance,
            final_balance,
            roi_pct: percent_change(initial_balance, final_balance),
            trade_count: trades.len(),
            wins,
            losses,
            win_rate: win_rate(&trades),
            total_net_pnl,
            avg_net_pnl,
            total_fees,
            exits: ExitDistribution::count(&trades),
            max_drawdown: max_drawdown(initial_balance, &trades),
            profit_factor: profit_factor(&trades),
            sharpe_like: sharpe_like(&trades),
            liquidated,
            skips,
            trades,
        }
    }
}

// ─── Individual aggregate functions ─────────────────────────────────

/// (final − initial) / initial as a percentage.
pub fn percent_change(initial: f64, final_value: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    (final_value - initial) / initial * 100.0
}

/// Fraction of trades with positive net pnl.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profits / gross losses, capped at 100 for the all-winner case.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| t.net_pnl.abs())
        .sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Maximum drawdown of the balance-after curve (initial balance prepended),
/// as a negative fraction.
pub fn max_drawdown(initial_balance: f64, trades: &[TradeRecord]) -> f64 {
    let mut peak = initial_balance;
    let mut max_dd = 0.0_f64;
    for trade in trades {
        let balance = trade.balance_after;
        if balance > peak {
            peak = balance;
        }
        if peak > 0.0 {
            let dd = (balance - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// mean(pnl) / stdev(pnl) · √n over per-trade net pnl.
pub fn sharpe_like(trades: &[TradeRecord]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let pnls: Vec<f64> = trades.iter().map(|t| t.net_pnl).collect();
    let mean = pnls.iter().sum::<f64>() / pnls.len() as f64;
    let variance =
        pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (pnls.len() - 1) as f64;
    let std = variance.sqrt();
    if std < 1e-15 {
        return 0.0;
    }
    mean / std * (pnls.len() as f64).sqrt()
}
