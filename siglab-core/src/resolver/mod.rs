//! Exit resolution — maps a signal + configuration to an exit outcome.
//!
//! Two implementations sit behind the `ExitResolver` trait:
//! - [`PathReplayResolver`] — deterministic, from recorded price extremes.
//! - [`MonteCarloResolver`] — seeded sampling from historical reach rates.
//!
//! A configuration selects exactly one; the modes are never blended.

pub mod monte_carlo;
pub mod path_replay;

pub use monte_carlo::MonteCarloResolver;
pub use path_replay::PathReplayResolver;

use crate::config::StrategyConfig;
use crate::domain::{Direction, ExitReason, Signal};

/// Resolved exit of a position: where, why, and after how long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitOutcome {
    pub exit_price: f64,
    pub reason: ExitReason,
    pub duration_minutes: i64,
}

/// Maps a signal to an exit outcome under a strategy configuration.
///
/// Returns `None` when the selected target policy yields no valid target
/// price — the caller must skip the signal, never substitute a default.
pub trait ExitResolver {
    fn resolve(&mut self, signal: &Signal, config: &StrategyConfig) -> Option<ExitOutcome>;
}

/// Stop-loss price for a position.
///
/// `stop_loss_pct` is a fraction of position equity; divided by leverage it
/// becomes the price distance: a 10% equity stop at 50x sits 0.2% from entry.
pub fn stop_loss_price(entry: f64, direction: Direction, stop_loss_pct: f64, leverage: u32) -> f64 {
    let distance = (stop_loss_pct / leverage as f64) / 100.0;
    match direction {
        Direction::Buy => entry * (1.0 - distance),
        Direction::Sell => entry * (1.0 + distance),
    }
}
