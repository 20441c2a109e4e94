//! Resolver validation against recorded ground truth.
//!
//! Signal logs carry the tracker's own WIN/LOSS verdicts. Replaying the
//! same log and comparing the deterministic resolver's exit against those
//! verdicts measures how faithful the simulation is: TP counts as a
//! predicted win, SL and TTL as a predicted loss. Cancelled and unlabeled
//! signals are excluded from the rate.

use serde::{Deserialize, Serialize};

use siglab_core::config::{ConfigError, StrategyConfig};
use siglab_core::domain::{ExitReason, RecordedResult, Signal};
use siglab_core::resolver::{ExitResolver, PathReplayResolver};

/// Confusion counts from one validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Signals with a usable label that the resolver resolved.
    pub checked: usize,
    pub agree: usize,
    pub disagree: usize,
    pub skipped_cancelled: usize,
    pub skipped_unlabeled: usize,
    /// Labeled signals the resolver could not resolve (no valid target).
    pub skipped_unresolved: usize,
}

impl ValidationReport {
    /// Fraction of checked signals where simulation and tracker agree.
    pub fn agreement_rate(&self) -> f64 {
        if self.checked == 0 {
            return 0.0;
        }
        self.agree as f64 / self.checked as f64
    }
}

/// Compare deterministic path replay against the log's recorded results.
///
/// Always uses path replay regardless of the config's resolver mode — a
/// sampled outcome cannot be meaningfully compared to a single recorded
/// verdict.
pub fn validate_resolver(
    config: &StrategyConfig,
    signals: &[Signal],
) -> Result<ValidationReport, ConfigError> {
    config.validate()?;
    let mut resolver = PathReplayResolver::new();
    let mut report = ValidationReport::default();

    for signal in signals {
        let recorded = match signal.result {
            None => {
                report.skipped_unlabeled += 1;
                continue;
            }
            Some(RecordedResult::Cancelled) => {
                report.skipped_cancelled += 1;
                continue;
            }
            Some(result) => result,
        };
        let Some(outcome) = resolver.resolve(signal, config) else {
            report.skipped_unresolved += 1;
            continue;
        };
        let predicted_win = outcome.reason == ExitReason::Tp;
        let recorded_win = recorded == RecordedResult::Win;
        report.checked += 1;
        if predicted_win == recorded_win {
            report.agree += 1;
        } else {
            report.disagree += 1;
        }
    }
    Ok(report)
}
