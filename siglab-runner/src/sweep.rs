//! Parallel configuration sweep.
//!
//! Evaluates every configuration in a [`ConfigSpace`] over one shared,
//! pre-sorted signal log. Configurations are independent, so the grid is
//! fanned out across the rayon pool. One failing configuration becomes a
//! `Failed` leaderboard entry without disturbing its neighbors.
//!
//! Cancellation is cooperative at configuration granularity: the flag and
//! deadline are checked before each evaluation (and between Monte Carlo
//! repetitions via the per-config driver), so an in-flight replay finishes
//! before the sweep winds down.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use siglab_core::config::StrategyConfig;
use siglab_core::domain::Signal;

use crate::leaderboard::{ConfigOutcome, Leaderboard, SweepEntry};
use crate::runner;
use crate::space::{ConfigSpace, SpaceError};

/// Knobs for one sweep invocation.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Wall-clock budget; configurations not started by the deadline are
    /// dropped and the result is marked timed out.
    pub timeout: Option<Duration>,
    /// External kill switch, shared with whoever drives the sweep.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Outcome of one sweep: the leaderboard plus how the run ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub leaderboard: Leaderboard,
    /// Configurations actually evaluated (completed or failed).
    pub evaluated: usize,
    /// Size of the full grid.
    pub total: usize,
    pub timed_out: bool,
    pub cancelled: bool,
    pub elapsed: Duration,
}

pub fn run_sweep(
    space: &ConfigSpace,
    signals: &[Signal],
    options: &SweepOptions,
) -> Result<SweepResult, SpaceError> {
    run_sweep_with_progress(space, signals, options, |_, _| {})
}

/// Sweep with a progress callback `(evaluated_so_far, total)`, invoked
/// from worker threads after each configuration.
pub fn run_sweep_with_progress<F>(
    space: &ConfigSpace,
    signals: &[Signal],
    options: &SweepOptions,
    progress: F,
) -> Result<SweepResult, SpaceError>
where
    F: Fn(usize, usize) + Send + Sync,
{
    space.validate()?;
    let total = space.len();
    let started = Instant::now();
    let deadline = options.timeout.map(|t| started + t);

    let timed_out = AtomicBool::new(false);
    let cancelled = AtomicBool::new(false);
    let evaluated = AtomicUsize::new(0);

    let entries: Vec<SweepEntry> = (0..total)
        .into_par_iter()
        .filter_map(|index| {
            if let Some(flag) = &options.cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled.store(true, Ordering::Relaxed);
                    return None;
                }
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    timed_out.store(true, Ordering::Relaxed);
                    return None;
                }
            }

            let config = space.get(index)?;
            let entry = evaluate_entry(config, signals);
            let done = evaluated.fetch_add(1, Ordering::Relaxed) + 1;
            progress(done, total);
            Some(entry)
        })
        .collect();

    Ok(SweepResult {
        evaluated: entries.len(),
        total,
        leaderboard: Leaderboard::from_entries(entries),
        timed_out: timed_out.into_inner(),
        cancelled: cancelled.into_inner(),
        elapsed: started.elapsed(),
    })
}

/// Evaluate one configuration in isolation; errors become data.
fn evaluate_entry(config: StrategyConfig, signals: &[Signal]) -> SweepEntry {
    let run_id = config.run_id();
    match runner::evaluate(&config, signals) {
        Ok(output) => SweepEntry {
            run_id,
            config,
            outcome: ConfigOutcome::Completed(output.report),
            mc: output.mc,
        },
        Err(err) => SweepEntry {
            run_id,
            config,
            outcome: ConfigOutcome::Failed {
                error: err.to_string(),
            },
            mc: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
    use siglab_core::config::{
        DirectionFilter, PositionSizing, ResolverMode, TargetPolicy,
    };
    use siglab_core::domain::Direction;
    use siglab_core::fees::FeeSchedule;

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 17)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + ChronoDuration::minutes(minute)
    }

    fn tp_signal(minute: i64) -> Signal {
        Signal {
            symbol: "BTC-USDT".into(),
            direction: Direction::Buy,
            timestamp: ts(minute),
            entry_price: 100.0,
            target_min: 101.0,
            target_max: 103.0,
            highest_reached: 102.0,
            lowest_reached: 99.5,
            final_price: 101.2,
            duration_minutes: 30,
            confidence: None,
            result: None,
        }
    }

    fn make_space(leverages: Vec<u32>) -> ConfigSpace {
        ConfigSpace {
            leverages,
            stop_loss_pcts: vec![10.0],
            target_policies: vec![TargetPolicy::Hybrid],
            sizings: vec![PositionSizing::PercentOfBalance { percent: 100.0 }],
            concurrency_limits: vec![1],
            direction_filters: vec![DirectionFilter::All],
            template: StrategyConfig {
                leverage: 10,
                stop_loss_pct: 10.0,
                target_policy: TargetPolicy::Hybrid,
                sizing: PositionSizing::PercentOfBalance { percent: 100.0 },
                concurrency_limit: 1,
                direction_filter: DirectionFilter::All,
                min_ticket: 10.0,
                initial_balance: 1000.0,
                liquidation_epsilon: 1.0,
                fees: FeeSchedule::zero(),
                resolver: ResolverMode::PathReplay,
            },
        }
    }

    #[test]
    fn sweep_covers_the_grid_and_ranks() {
        let signals: Vec<Signal> = (0..5).map(|i| tp_signal(i * 10)).collect();
        let result = run_sweep(&make_space(vec![5, 10, 20]), &signals, &SweepOptions::default())
            .unwrap();
        assert_eq!(result.evaluated, 3);
        assert_eq!(result.total, 3);
        assert!(!result.timed_out);
        assert!(!result.cancelled);
        // All-TP log: more leverage, more balance.
        assert_eq!(result.leaderboard.best().unwrap().config.leverage, 20);
    }

    #[test]
    fn invalid_config_fails_in_isolation() {
        let signals = vec![tp_signal(0)];
        // Leverage 0 fails validation; 10 still completes.
        let result =
            run_sweep(&make_space(vec![0, 10]), &signals, &SweepOptions::default()).unwrap();
        assert_eq!(result.evaluated, 2);
        let completed = result
            .leaderboard
            .entries()
            .iter()
            .filter(|e| e.is_completed())
            .count();
        assert_eq!(completed, 1);
        assert_eq!(result.leaderboard.best().unwrap().config.leverage, 10);
    }

    #[test]
    fn pre_set_cancel_flag_stops_the_sweep() {
        let signals = vec![tp_signal(0)];
        let cancel = Arc::new(AtomicBool::new(true));
        let options = SweepOptions {
            timeout: None,
            cancel: Some(cancel),
        };
        let result = run_sweep(&make_space(vec![5, 10, 20]), &signals, &options).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.evaluated, 0);
        assert!(result.leaderboard.is_empty());
    }

    #[test]
    fn zero_timeout_marks_timed_out() {
        let signals = vec![tp_signal(0)];
        let options = SweepOptions {
            timeout: Some(Duration::ZERO),
            cancel: None,
        };
        let result = run_sweep(&make_space(vec![5, 10, 20]), &signals, &options).unwrap();
        assert!(result.timed_out);
        assert_eq!(result.evaluated, 0);
    }

    #[test]
    fn empty_axis_surfaces_before_any_work() {
        let mut space = make_space(vec![10]);
        space.target_policies.clear();
        let err = run_sweep(&space, &[tp_signal(0)], &SweepOptions::default()).unwrap_err();
        assert_eq!(err, SpaceError::EmptyAxis("target_policies"));
    }

    #[test]
    fn progress_reports_every_evaluation() {
        let signals = vec![tp_signal(0)];
        let seen = AtomicUsize::new(0);
        let result = run_sweep_with_progress(
            &make_space(vec![5, 10]),
            &signals,
            &SweepOptions::default(),
            |_done, total| {
                assert_eq!(total, 2);
                seen.fetch_add(1, Ordering::Relaxed);
            },
        )
        .unwrap();
        assert_eq!(result.evaluated, 2);
        assert_eq!(seen.into_inner(), 2);
    }

    #[test]
    fn parallel_and_repeat_runs_agree() {
        let signals: Vec<Signal> = (0..8).map(|i| tp_signal(i * 10)).collect();
        let space = make_space(vec![5, 10, 20, 50]);
        let a = run_sweep(&space, &signals, &SweepOptions::default()).unwrap();
        let b = run_sweep(&space, &signals, &SweepOptions::default()).unwrap();
        assert_eq!(a.leaderboard, b.leaderboard);
    }
}
