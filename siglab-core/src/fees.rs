//! Fee model — exit-type-aware maker/taker fees.
//!
//! The maker rate applies only to TP exits (assumed resting limit fill);
//! the taker rate applies to entry and to SL/TTL exits (assumed market
//! fill). All four rates are explicit fields so the model is reusable
//! across venues — nothing is hard-coded in the engine arithmetic.

use crate::domain::ExitReason;
use serde::{Deserialize, Serialize};

/// Venue fee schedule. Rates are fractions of notional (0.0005 = 0.05%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub entry_taker: f64,
    pub tp_maker: f64,
    pub sl_taker: f64,
    pub ttl_taker: f64,
}

impl FeeSchedule {
    /// BingX perpetual futures maker/taker schedule.
    pub fn bingx() -> Self {
        Self {
            entry_taker: 0.0005,
            tp_maker: 0.0002,
            sl_taker: 0.0005,
            ttl_taker: 0.0005,
        }
    }

    /// Frictionless schedule for tests and gross-pnl analysis.
    pub fn zero() -> Self {
        Self {
            entry_taker: 0.0,
            tp_maker: 0.0,
            sl_taker: 0.0,
            ttl_taker: 0.0,
        }
    }

    /// Entry fee on a leveraged notional (always taker).
    pub fn entry_fee(&self, notional: f64) -> f64 {
        notional * self.entry_taker
    }

    /// Exit fee on a leveraged notional, keyed by exit type.
    pub fn exit_fee(&self, reason: ExitReason, notional: f64) -> f64 {
        notional * self.exit_rate(reason)
    }

    /// Exit rate for an exit type.
    pub fn exit_rate(&self, reason: ExitReason) -> f64 {
        match reason {
            ExitReason::Tp => self.tp_maker,
            ExitReason::Sl => self.sl_taker,
            ExitReason::Ttl => self.ttl_taker,
        }
    }

    /// Combined entry + exit rate for a round trip ending with `reason`.
    pub fn round_trip_rate(&self, reason: ExitReason) -> f64 {
        self.entry_taker + self.exit_rate(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bingx_rates() {
        let fees = FeeSchedule::bingx();
        assert_eq!(fees.entry_fee(10_000.0), 5.0);
        assert_eq!(fees.exit_fee(ExitReason::Tp, 10_000.0), 2.0);
        assert_eq!(fees.exit_fee(ExitReason::Sl, 10_000.0), 5.0);
        assert_eq!(fees.exit_fee(ExitReason::Ttl, 10_000.0), 5.0);
    }

    #[test]
    fn tp_exit_strictly_cheaper_when_maker_below_taker() {
        let fees = FeeSchedule::bingx();
        assert!(fees.tp_maker < fees.sl_taker);
        let notional = 25_000.0;
        assert!(fees.exit_fee(ExitReason::Tp, notional) < fees.exit_fee(ExitReason::Sl, notional));
        assert!(fees.exit_fee(ExitReason::Tp, notional) < fees.exit_fee(ExitReason::Ttl, notional));
    }

    #[test]
    fn round_trip_rate_by_reason() {
        let fees = FeeSchedule::bingx();
        assert!((fees.round_trip_rate(ExitReason::Tp) - 0.0007).abs() < 1e-12);
        assert!((fees.round_trip_rate(ExitReason::Sl) - 0.0010).abs() < 1e-12);
    }

    #[test]
    fn zero_schedule_charges_nothing() {
        let fees = FeeSchedule::zero();
        assert_eq!(fees.entry_fee(10_000.0), 0.0);
        assert_eq!(fees.exit_fee(ExitReason::Sl, 10_000.0), 0.0);
    }
}
