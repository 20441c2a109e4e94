//! Single-configuration backtest driver.
//!
//! Replays a sorted signal stream through the ledger with the configured
//! resolver. Path replay runs once; Monte Carlo runs `runs` seeded
//! repetitions and aggregates them into an [`McSummary`] alongside a
//! representative report (repetition 0).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::config::{ConfigError, ResolverMode, StrategyConfig};
use siglab_core::domain::Signal;
use siglab_core::ledger::{Ledger, LedgerError};
use siglab_core::report::TradeReport;
use siglab_core::resolver::{ExitResolver, MonteCarloResolver, PathReplayResolver};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("replay failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error("configuration is not stochastic")]
    NotStochastic,
}

/// Aggregate over the repetitions of one Monte Carlo evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McSummary {
    pub runs: u32,
    pub mean_final_balance: f64,
    /// Sample standard deviation of the final balances; 0 for a single run.
    pub std_final_balance: f64,
    pub min_final_balance: f64,
    pub max_final_balance: f64,
    pub mean_win_rate: f64,
    pub mean_trade_count: f64,
    /// Fraction of repetitions that ended liquidated.
    pub liquidation_rate: f64,
}

impl McSummary {
    fn from_reports(reports: &[TradeReport]) -> Self {
        let n = reports.len() as f64;
        let balances: Vec<f64> = reports.iter().map(|r| r.final_balance).collect();
        let mean = balances.iter().sum::<f64>() / n;
        let std = if reports.len() < 2 {
            0.0
        } else {
            let variance =
                balances.iter().map(|b| (b - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        };
        Self {
            runs: reports.len() as u32,
            mean_final_balance: mean,
            std_final_balance: std,
            min_final_balance: balances.iter().copied().fold(f64::INFINITY, f64::min),
            max_final_balance: balances.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_win_rate: reports.iter().map(|r| r.win_rate).sum::<f64>() / n,
            mean_trade_count: reports.iter().map(|r| r.trade_count as f64).sum::<f64>() / n,
            liquidation_rate: reports.iter().filter(|r| r.liquidated).count() as f64 / n,
        }
    }
}

/// Result of evaluating one configuration, either mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub report: TradeReport,
    /// Present only for Monte Carlo configurations.
    pub mc: Option<McSummary>,
}

/// Run one configuration over a signal log and return its report.
///
/// For a Monte Carlo configuration this is repetition 0 — deterministic for
/// a given seed, but not the average; use [`evaluate`] for the aggregate.
pub fn run_single(config: &StrategyConfig, signals: &[Signal]) -> Result<TradeReport, RunError> {
    config.validate()?;
    let sorted = sort_signals(signals);
    match &config.resolver {
        ResolverMode::PathReplay => {
            let mut resolver = PathReplayResolver::new();
            Ok(replay(config, &sorted, &mut resolver)?)
        }
        ResolverMode::MonteCarlo { .. } => {
            let mut resolver = mc_resolver(config, 0)?;
            Ok(replay(config, &sorted, &mut resolver)?)
        }
    }
}

/// Run all repetitions of a Monte Carlo configuration and aggregate.
pub fn run_monte_carlo(
    config: &StrategyConfig,
    signals: &[Signal],
) -> Result<(McSummary, TradeReport), RunError> {
    config.validate()?;
    let ResolverMode::MonteCarlo { runs, .. } = &config.resolver else {
        return Err(RunError::NotStochastic);
    };
    let runs = *runs;
    let sorted = sort_signals(signals);
    let mut reports = Vec::with_capacity(runs as usize);
    for repetition in 0..runs {
        let mut resolver = mc_resolver(config, repetition)?;
        reports.push(replay(config, &sorted, &mut resolver)?);
    }
    let summary = McSummary::from_reports(&reports);
    let representative = reports.swap_remove(0);
    Ok((summary, representative))
}

/// Evaluate a configuration the way the sweep does: one deterministic
/// report for path replay, repetitions plus aggregate for Monte Carlo.
pub fn evaluate(config: &StrategyConfig, signals: &[Signal]) -> Result<RunOutput, RunError> {
    if config.resolver.is_stochastic() {
        let (summary, report) = run_monte_carlo(config, signals)?;
        Ok(RunOutput {
            report,
            mc: Some(summary),
        })
    } else {
        Ok(RunOutput {
            report: run_single(config, signals)?,
            mc: None,
        })
    }
}

fn sort_signals(signals: &[Signal]) -> Vec<Signal> {
    let mut sorted = signals.to_vec();
    // Stable: equal timestamps keep log order.
    sorted.sort_by_key(|s| s.timestamp);
    sorted
}

fn mc_resolver(config: &StrategyConfig, repetition: u32) -> Result<MonteCarloResolver, RunError> {
    let ResolverMode::MonteCarlo {
        seed,
        zone_probs,
        sl_hit_prob,
        avg_ttl_loss_pct,
        ..
    } = &config.resolver
    else {
        return Err(RunError::NotStochastic);
    };
    let sub_seed = MonteCarloResolver::sub_seed(*seed, &config.run_id(), repetition);
    Ok(MonteCarloResolver::new(
        sub_seed,
        *zone_probs,
        *sl_hit_prob,
        *avg_ttl_loss_pct,
    ))
}

fn replay(
    config: &StrategyConfig,
    sorted: &[Signal],
    resolver: &mut dyn ExitResolver,
) -> Result<TradeReport, LedgerError> {
    let mut ledger = Ledger::new(config.clone());
    for signal in sorted {
        if ledger.is_liquidated() {
            break;
        }
        ledger.process(signal, resolver)?;
    }
    ledger.finish();
    let final_balance = ledger.balance();
    let skips = ledger.skips();
    let liquidated = ledger.is_liquidated();
    Ok(TradeReport::build(
        config.initial_balance,
        final_balance,
        ledger.into_trades(),
        skips,
        liquidated,
    ))
}
