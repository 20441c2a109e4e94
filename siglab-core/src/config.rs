//! Serializable strategy configuration.
//!
//! Every rate and threshold the engine uses is an explicit field here;
//! nothing is defaulted silently inside the engine arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Direction, Signal};
use crate::fees::FeeSchedule;

/// Unique identifier for a configuration (content-addressable hash).
pub type RunId = String;

/// Which edge of the target zone becomes the take-profit price.
///
/// The near-edge mapping is direction-dependent and deliberately asymmetric:
/// for BUY the near edge is `target_min`, for SELL it is `target_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Always `target_min`, whichever direction.
    TargetMin,
    /// Always `target_max`, whichever direction.
    TargetMax,
    /// Midpoint of the zone.
    Mid,
    /// Near edge of the zone: BUY → `target_min`, SELL → `target_max`.
    Hybrid,
}

impl TargetPolicy {
    /// Resolve the take-profit price for a signal, or `None` when the
    /// selected target is not a valid positive price.
    ///
    /// The direction table is encoded explicitly; do not infer it from
    /// symmetry.
    pub fn target_price(&self, signal: &Signal) -> Option<f64> {
        let price = match (self, signal.direction) {
            (TargetPolicy::TargetMin, _) => signal.target_min,
            (TargetPolicy::TargetMax, _) => signal.target_max,
            (TargetPolicy::Mid, _) => {
                if signal.target_min <= 0.0 || signal.target_max <= 0.0 {
                    return None;
                }
                (signal.target_min + signal.target_max) / 2.0
            }
            (TargetPolicy::Hybrid, Direction::Buy) => signal.target_min,
            (TargetPolicy::Hybrid, Direction::Sell) => signal.target_max,
        };
        (price > 0.0).then_some(price)
    }
}

/// How much equity each admitted signal commits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSizing {
    /// Fixed dollar amount per slot (capped at the uncommitted balance).
    FixedAmount { amount: f64 },
    /// Percent of the current balance per slot (100 = all-in).
    PercentOfBalance { percent: f64 },
}

/// Restrict which signal directions are traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionFilter {
    All,
    BuyOnly,
    SellOnly,
}

impl DirectionFilter {
    pub fn admits(&self, direction: Direction) -> bool {
        match self {
            DirectionFilter::All => true,
            DirectionFilter::BuyOnly => direction == Direction::Buy,
            DirectionFilter::SellOnly => direction == Direction::Sell,
        }
    }
}

/// Historical probability that the price path reaches each target level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneProbs {
    pub target_min: f64,
    pub target_mid: f64,
    pub target_max: f64,
}

impl ZoneProbs {
    /// Reach rates measured on the November 2025 effectiveness log.
    pub fn historical() -> Self {
        Self {
            target_min: 0.683,
            target_mid: 0.524,
            target_max: 0.389,
        }
    }
}

/// How exits are resolved: deterministic path replay or seeded sampling.
///
/// The two modes are never blended — a configuration selects exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolverMode {
    /// Deterministic resolution from the signal's recorded price extremes.
    PathReplay,
    /// Draw WIN/LOSS outcomes from the historical win-rate distribution,
    /// repeated `runs` times and averaged. Always seeded.
    MonteCarlo {
        seed: u64,
        runs: u32,
        zone_probs: ZoneProbs,
        /// Probability the stop is hit when the target is not reached.
        sl_hit_prob: f64,
        /// Average price move (percent) of a TTL expiry, typically negative.
        avg_ttl_loss_pct: f64,
    },
}

impl ResolverMode {
    pub fn is_stochastic(&self) -> bool {
        matches!(self, ResolverMode::MonteCarlo { .. })
    }
}

/// Immutable, user-supplied strategy configuration for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Leverage multiplier (> 0).
    pub leverage: u32,
    /// Stop loss as a percent of position equity (0 < x ≤ 100), not of price.
    pub stop_loss_pct: f64,
    pub target_policy: TargetPolicy,
    pub sizing: PositionSizing,
    /// Maximum simultaneously open positions (≥ 1). Logical capital slots,
    /// not execution threads.
    pub concurrency_limit: usize,
    pub direction_filter: DirectionFilter,
    /// Smallest equity commitment worth opening; smaller sizings skip.
    pub min_ticket: f64,
    /// Starting account balance.
    pub initial_balance: f64,
    /// Balance at or below which the account counts as liquidated.
    pub liquidation_epsilon: f64,
    pub fees: FeeSchedule,
    pub resolver: ResolverMode,
}

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("leverage must be > 0")]
    ZeroLeverage,
    #[error("stop_loss_pct must be in (0, 100], got {0}")]
    StopLossOutOfRange(f64),
    #[error("concurrency_limit must be ≥ 1")]
    ZeroConcurrency,
    #[error("initial_balance must be > 0, got {0}")]
    NonPositiveBalance(f64),
    #[error("sizing percent must be in (0, 100], got {0}")]
    SizingPercentOutOfRange(f64),
    #[error("sizing amount must be > 0, got {0}")]
    NonPositiveSizingAmount(f64),
    #[error("monte carlo runs must be ≥ 1")]
    ZeroMonteCarloRuns,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leverage == 0 {
            return Err(ConfigError::ZeroLeverage);
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct <= 100.0) {
            return Err(ConfigError::StopLossOutOfRange(self.stop_loss_pct));
        }
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if !(self.initial_balance > 0.0) {
            return Err(ConfigError::NonPositiveBalance(self.initial_balance));
        }
        match self.sizing {
            PositionSizing::FixedAmount { amount } => {
                if !(amount > 0.0) {
                    return Err(ConfigError::NonPositiveSizingAmount(amount));
                }
            }
            PositionSizing::PercentOfBalance { percent } => {
                if !(percent > 0.0 && percent <= 100.0) {
                    return Err(ConfigError::SizingPercentOutOfRange(percent));
                }
            }
        }
        if let ResolverMode::MonteCarlo { runs, .. } = self.resolver {
            if runs == 0 {
                return Err(ConfigError::ZeroMonteCarloRuns);
            }
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two identical configs share a RunId, which the leaderboard uses for
    /// dedup and the Monte Carlo resolver for seed derivation.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("StrategyConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_signal(direction: Direction, target_min: f64, target_max: f64) -> Signal {
        Signal {
            symbol: "BTC-USDT".into(),
            direction,
            timestamp: NaiveDate::from_ymd_opt(2025, 11, 17)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            entry_price: 100.0,
            target_min,
            target_max,
            highest_reached: 103.0,
            lowest_reached: 97.0,
            final_price: 100.0,
            duration_minutes: 30,
            confidence: None,
            result: None,
        }
    }

    fn base_config() -> StrategyConfig {
        StrategyConfig {
            leverage: 10,
            stop_loss_pct: 10.0,
            target_policy: TargetPolicy::Hybrid,
            sizing: PositionSizing::PercentOfBalance { percent: 100.0 },
            concurrency_limit: 1,
            direction_filter: DirectionFilter::All,
            min_ticket: 10.0,
            initial_balance: 1000.0,
            liquidation_epsilon: 1.0,
            fees: FeeSchedule::bingx(),
            resolver: ResolverMode::PathReplay,
        }
    }

    // ── Target table, per direction ──

    #[test]
    fn hybrid_buy_takes_near_edge_target_min() {
        let s = make_signal(Direction::Buy, 101.0, 103.0);
        assert_eq!(TargetPolicy::Hybrid.target_price(&s), Some(101.0));
    }

    #[test]
    fn hybrid_sell_takes_near_edge_target_max() {
        let s = make_signal(Direction::Sell, 97.0, 99.0);
        assert_eq!(TargetPolicy::Hybrid.target_price(&s), Some(99.0));
    }

    #[test]
    fn mid_policy_averages_the_zone() {
        let s = make_signal(Direction::Buy, 101.0, 103.0);
        assert_eq!(TargetPolicy::Mid.target_price(&s), Some(102.0));
    }

    #[test]
    fn zero_target_yields_none() {
        let s = make_signal(Direction::Buy, 0.0, 103.0);
        assert_eq!(TargetPolicy::Hybrid.target_price(&s), None);
        assert_eq!(TargetPolicy::TargetMin.target_price(&s), None);
        assert_eq!(TargetPolicy::Mid.target_price(&s), None);
        assert_eq!(TargetPolicy::TargetMax.target_price(&s), Some(103.0));
    }

    // ── Validation ──

    #[test]
    fn valid_config_passes() {
        assert_eq!(base_config().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_leverage() {
        let mut c = base_config();
        c.leverage = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroLeverage));
    }

    #[test]
    fn rejects_out_of_range_stop_loss() {
        let mut c = base_config();
        c.stop_loss_pct = 0.0;
        assert!(c.validate().is_err());
        c.stop_loss_pct = 150.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut c = base_config();
        c.concurrency_limit = 0;
        assert_eq!(c.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn rejects_zero_mc_runs() {
        let mut c = base_config();
        c.resolver = ResolverMode::MonteCarlo {
            seed: 42,
            runs: 0,
            zone_probs: ZoneProbs::historical(),
            sl_hit_prob: 0.10,
            avg_ttl_loss_pct: -0.15,
        };
        assert_eq!(c.validate(), Err(ConfigError::ZeroMonteCarloRuns));
    }

    // ── RunId ──

    #[test]
    fn run_id_deterministic() {
        let c = base_config();
        assert_eq!(c.run_id(), c.run_id());
        assert!(!c.run_id().is_empty());
    }

    #[test]
    fn run_id_changes_with_params() {
        let c1 = base_config();
        let mut c2 = base_config();
        c2.leverage = 20;
        assert_ne!(c1.run_id(), c2.run_id());
    }

    #[test]
    fn config_serialization_roundtrip() {
        let c = base_config();
        let json = serde_json::to_string_pretty(&c).unwrap();
        let deser: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, deser);
    }

    #[test]
    fn direction_filter_admits() {
        assert!(DirectionFilter::All.admits(Direction::Buy));
        assert!(DirectionFilter::BuyOnly.admits(Direction::Buy));
        assert!(!DirectionFilter::BuyOnly.admits(Direction::Sell));
        assert!(DirectionFilter::SellOnly.admits(Direction::Sell));
        assert!(!DirectionFilter::SellOnly.admits(Direction::Buy));
    }
}
