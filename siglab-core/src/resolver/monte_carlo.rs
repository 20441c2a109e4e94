//! Stochastic exit resolution from historical reach-rate statistics.
//!
//! Instead of replaying the recorded price path, this resolver draws the
//! outcome: TP with the historical probability that the chosen target level
//! is reached, otherwise SL with a fixed hit probability, otherwise TTL at
//! the average expiry move. One backtest run with this resolver is one
//! sample; callers repeat `runs` times and average.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::path_replay::{DEFAULT_TTL_MINUTES, SL_EXIT_MINUTES, TP_EXIT_MINUTES};
use super::{stop_loss_price, ExitOutcome, ExitResolver};
use crate::config::{StrategyConfig, TargetPolicy, ZoneProbs};
use crate::domain::{Direction, ExitReason, Signal};

/// Seeded sampler over (TP, SL, TTL) outcomes.
#[derive(Debug, Clone)]
pub struct MonteCarloResolver {
    rng: StdRng,
    zone_probs: ZoneProbs,
    sl_hit_prob: f64,
    avg_ttl_loss_pct: f64,
}

impl MonteCarloResolver {
    pub fn new(seed: u64, zone_probs: ZoneProbs, sl_hit_prob: f64, avg_ttl_loss_pct: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            zone_probs,
            sl_hit_prob,
            avg_ttl_loss_pct,
        }
    }

    /// Derive the sub-seed for one repetition of one configuration.
    ///
    /// Hash-based derivation (master seed ‖ run_id ‖ repetition index) keeps
    /// results identical regardless of the order in which a parallel sweep
    /// schedules the repetitions.
    pub fn sub_seed(master_seed: u64, run_id: &str, repetition: u32) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&master_seed.to_le_bytes());
        hasher.update(run_id.as_bytes());
        hasher.update(&repetition.to_le_bytes());
        let hash = hasher.finalize();
        u64::from_le_bytes(hash.as_bytes()[..8].try_into().unwrap())
    }

    /// Historical reach probability of the target level the policy selects.
    fn reach_prob(&self, policy: TargetPolicy, direction: Direction) -> f64 {
        match (policy, direction) {
            (TargetPolicy::TargetMin, _) => self.zone_probs.target_min,
            (TargetPolicy::TargetMax, _) => self.zone_probs.target_max,
            (TargetPolicy::Mid, _) => self.zone_probs.target_mid,
            (TargetPolicy::Hybrid, Direction::Buy) => self.zone_probs.target_min,
            (TargetPolicy::Hybrid, Direction::Sell) => self.zone_probs.target_max,
        }
    }
}

impl ExitResolver for MonteCarloResolver {
    fn resolve(&mut self, signal: &Signal, config: &StrategyConfig) -> Option<ExitOutcome> {
        let tp_price = config.target_policy.target_price(signal)?;
        let reach_prob = self.reach_prob(config.target_policy, signal.direction);

        if self.rng.gen::<f64>() < reach_prob {
            return Some(ExitOutcome {
                exit_price: tp_price,
                reason: ExitReason::Tp,
                duration_minutes: TP_EXIT_MINUTES,
            });
        }

        if self.rng.gen::<f64>() < self.sl_hit_prob {
            let sl_price = stop_loss_price(
                signal.entry_price,
                signal.direction,
                config.stop_loss_pct,
                config.leverage,
            );
            return Some(ExitOutcome {
                exit_price: sl_price,
                reason: ExitReason::Sl,
                duration_minutes: SL_EXIT_MINUTES,
            });
        }

        // TTL expiry at the average expiry move (signed from the position's
        // viewpoint, so a negative value is a loss for either direction).
        let move_frac = self.avg_ttl_loss_pct / 100.0;
        let exit_price = match signal.direction {
            Direction::Buy => signal.entry_price * (1.0 + move_frac),
            Direction::Sell => signal.entry_price * (1.0 - move_frac),
        };
        let duration = if signal.duration_minutes > 0 {
            signal.duration_minutes
        } else {
            DEFAULT_TTL_MINUTES
        };
        Some(ExitOutcome {
            exit_price,
            reason: ExitReason::Ttl,
            duration_minutes: duration,
        })
    }
}
