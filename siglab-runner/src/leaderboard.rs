//! Sweep leaderboard — ranked configurations with failure entries kept.
//!
//! Ranking key is final balance (mean final balance for Monte Carlo
//! entries), with win rate as the tie-break. Failed evaluations and
//! non-finite scores sort to the bottom rather than disappearing, so a
//! sweep that half-exploded is still inspectable.

use serde::{Deserialize, Serialize};

use siglab_core::config::{RunId, StrategyConfig};
use siglab_core::report::TradeReport;

use crate::runner::McSummary;

/// What happened to one configuration during the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfigOutcome {
    Completed(TradeReport),
    Failed { error: String },
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub run_id: RunId,
    pub config: StrategyConfig,
    pub outcome: ConfigOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc: Option<McSummary>,
}

impl SweepEntry {
    /// Primary ranking score. Failed or non-finite results rank below
    /// every real balance.
    pub fn final_balance(&self) -> f64 {
        let balance = match (&self.outcome, &self.mc) {
            (ConfigOutcome::Failed { .. }, _) => return f64::NEG_INFINITY,
            (ConfigOutcome::Completed(_), Some(mc)) => mc.mean_final_balance,
            (ConfigOutcome::Completed(report), None) => report.final_balance,
        };
        if balance.is_finite() {
            balance
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Tie-break score.
    pub fn win_rate(&self) -> f64 {
        match (&self.outcome, &self.mc) {
            (ConfigOutcome::Failed { .. }, _) => 0.0,
            (ConfigOutcome::Completed(_), Some(mc)) => mc.mean_win_rate,
            (ConfigOutcome::Completed(report), None) => report.win_rate,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, ConfigOutcome::Completed(_))
    }
}

/// Ranked, deduplicated sweep results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<SweepEntry>,
}

impl Leaderboard {
    /// Build from raw entries: drop duplicate run ids (identical
    /// configurations produce identical results, so the first copy wins),
    /// then rank.
    pub fn from_entries(entries: Vec<SweepEntry>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<SweepEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.run_id.clone()))
            .collect();
        unique.sort_by(|a, b| {
            (b.final_balance(), b.win_rate())
                .partial_cmp(&(a.final_balance(), a.win_rate()))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self { entries: unique }
    }

    pub fn entries(&self) -> &[SweepEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self, n: usize) -> &[SweepEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// The best completed configuration, if any completed at all.
    pub fn best(&self) -> Option<&SweepEntry> {
        self.entries.iter().find(|e| e.is_completed())
    }
}
