//! Deterministic exit resolution from recorded price extremes.

use super::{stop_loss_price, ExitOutcome, ExitResolver};
use crate::config::StrategyConfig;
use crate::domain::{Direction, ExitReason, Signal};

/// Minutes assumed until a stop-loss fill.
pub const SL_EXIT_MINUTES: i64 = 2;
/// Minutes assumed until a take-profit fill.
pub const TP_EXIT_MINUTES: i64 = 5;
/// TTL fallback when the log records a zero observation window.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Replays the signal's recorded window extremes against the stop and target.
///
/// The log stores only the highest and lowest price within the window, not
/// their time ordering, so when both the stop and the target were breached
/// the resolver assumes the stop was hit first. This is a deliberate
/// pessimistic modeling assumption, not a bug; a less conservative tie-break
/// would need intrabar data the log does not have.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathReplayResolver;

impl PathReplayResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ExitResolver for PathReplayResolver {
    fn resolve(&mut self, signal: &Signal, config: &StrategyConfig) -> Option<ExitOutcome> {
        let tp_price = config.target_policy.target_price(signal)?;
        let sl_price = stop_loss_price(
            signal.entry_price,
            signal.direction,
            config.stop_loss_pct,
            config.leverage,
        );

        let sl_breached = match signal.direction {
            Direction::Buy => signal.lowest_reached <= sl_price,
            Direction::Sell => signal.highest_reached >= sl_price,
        };
        if sl_breached {
            return Some(ExitOutcome {
                exit_price: sl_price,
                reason: ExitReason::Sl,
                duration_minutes: SL_EXIT_MINUTES,
            });
        }

        let tp_breached = match signal.direction {
            Direction::Buy => signal.highest_reached >= tp_price,
            Direction::Sell => signal.lowest_reached <= tp_price,
        };
        if tp_breached {
            return Some(ExitOutcome {
                exit_price: tp_price,
                reason: ExitReason::Tp,
                duration_minutes: TP_EXIT_MINUTES,
            });
        }

        let duration = if signal.duration_minutes > 0 {
            signal.duration_minutes
        } else {
            DEFAULT_TTL_MINUTES
        };
        Some(ExitOutcome {
            exit_price: signal.final_price,
            reason: ExitReason::Ttl,
            duration_minutes: duration,
        })
    }
}
