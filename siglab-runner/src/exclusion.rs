//! Symbol/direction exclusion search.
//!
//! Some pairs lose money consistently under an otherwise good
//! configuration. The greedy search removes the worst-attributed
//! (symbol, direction) pair, re-runs, and keeps the cut only if total net
//! pnl actually improved — attribution is not additive once removals
//! change position sizing and slot availability, so every candidate is
//! verified by a full replay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use siglab_core::config::StrategyConfig;
use siglab_core::domain::{Direction, Signal};
use siglab_core::report::TradeReport;

use crate::runner::{self, RunError};

/// A tradeable pair: one symbol in one direction.
pub type PairKey = (String, Direction);

/// Per-pair pnl attribution over one report's trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub symbol: String,
    pub direction: Direction,
    pub trades: usize,
    pub net_pnl: f64,
}

/// Group a report's trades by (symbol, direction), worst pnl first.
pub fn pair_attribution(report: &TradeReport) -> Vec<PairStats> {
    let mut grouped: HashMap<PairKey, (usize, f64)> = HashMap::new();
    for trade in &report.trades {
        let slot = grouped
            .entry((trade.symbol.clone(), trade.direction))
            .or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += trade.net_pnl;
    }
    let mut stats: Vec<PairStats> = grouped
        .into_iter()
        .map(|((symbol, direction), (trades, net_pnl))| PairStats {
            symbol,
            direction,
            trades,
            net_pnl,
        })
        .collect();
    stats.sort_by(|a, b| {
        a.net_pnl
            .partial_cmp(&b.net_pnl)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (&a.symbol, a.direction as u8).cmp(&(&b.symbol, b.direction as u8)))
    });
    stats
}

/// Drop every signal matching an excluded pair.
pub fn filter_signals(signals: &[Signal], excluded: &[PairKey]) -> Vec<Signal> {
    signals
        .iter()
        .filter(|s| {
            !excluded
                .iter()
                .any(|(symbol, direction)| s.symbol == *symbol && s.direction == *direction)
        })
        .cloned()
        .collect()
}

/// Result of a greedy exclusion search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionResult {
    /// Accepted exclusions, in the order they were cut.
    pub excluded: Vec<PairKey>,
    /// Report with nothing excluded.
    pub baseline: TradeReport,
    /// Report under the accepted exclusion set (equals baseline when no
    /// cut improved anything).
    pub improved: TradeReport,
}

impl ExclusionResult {
    pub fn pnl_gain(&self) -> f64 {
        self.improved.total_net_pnl - self.baseline.total_net_pnl
    }
}

/// Greedily exclude loss-attributed pairs, at most `max_exclusions` of
/// them, keeping only cuts a verification replay confirms.
pub fn greedy_exclusion_search(
    config: &StrategyConfig,
    signals: &[Signal],
    max_exclusions: usize,
) -> Result<ExclusionResult, RunError> {
    let baseline = runner::run_single(config, signals)?;
    let mut excluded: Vec<PairKey> = Vec::new();
    let mut current = baseline.clone();

    while excluded.len() < max_exclusions {
        let candidate = pair_attribution(&current)
            .into_iter()
            .find(|p| p.net_pnl < 0.0 && !is_excluded(&excluded, p));
        let Some(worst) = candidate else { break };

        let mut trial = excluded.clone();
        trial.push((worst.symbol, worst.direction));
        let trial_report = runner::run_single(config, &filter_signals(signals, &trial))?;
        if trial_report.total_net_pnl > current.total_net_pnl {
            excluded = trial;
            current = trial_report;
        } else {
            break;
        }
    }

    Ok(ExclusionResult {
        excluded,
        baseline,
        improved: current,
    })
}

/// Score every pair by the final balance a replay achieves without it.
/// Exhaustive single-cut counterpart to the greedy search.
pub fn score_single_exclusions(
    config: &StrategyConfig,
    signals: &[Signal],
) -> Result<Vec<(PairKey, f64)>, RunError> {
    let baseline = runner::run_single(config, signals)?;
    let mut scores = Vec::new();
    for stats in pair_attribution(&baseline) {
        let pair = (stats.symbol, stats.direction);
        let report = runner::run_single(config, &filter_signals(signals, &[pair.clone()]))?;
        scores.push((pair, report.final_balance));
    }
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scores)
}

fn is_excluded(excluded: &[PairKey], stats: &PairStats) -> bool {
    excluded
        .iter()
        .any(|(symbol, direction)| *symbol == stats.symbol && *direction == stats.direction)
}
