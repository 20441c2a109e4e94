//! Siglab Core — offline trade-simulation engine for signal logs.
//!
//! The heart of the backtester:
//! - Domain types (signals, positions, trades)
//! - Exit-type-aware fee model
//! - Exit resolvers: deterministic path replay and seeded Monte Carlo
//! - Position ledger enforcing capital and concurrency constraints
//! - Trade report with aggregate statistics
//!
//! No I/O lives here; signal ingestion, sweeps, and export belong to
//! `siglab-runner`.

pub mod config;
pub mod domain;
pub mod fees;
pub mod ledger;
pub mod pnl;
pub mod report;
pub mod resolver;

pub use config::{
    ConfigError, DirectionFilter, PositionSizing, ResolverMode, RunId, StrategyConfig,
    TargetPolicy, ZoneProbs,
};
pub use domain::{Direction, ExitReason, InvalidSignal, Position, RecordedResult, Signal, TradeRecord};
pub use fees::FeeSchedule;
pub use ledger::{Ledger, LedgerError, SkipCounts};
pub use report::{ExitDistribution, TradeReport};
pub use resolver::{ExitOutcome, ExitResolver, MonteCarloResolver, PathReplayResolver};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: core types cross thread boundaries in the sweep
    /// driver, so they must be Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Signal>();
        require_sync::<Signal>();
        require_send::<TradeRecord>();
        require_sync::<TradeRecord>();
        require_send::<Position>();
        require_sync::<Position>();
        require_send::<StrategyConfig>();
        require_sync::<StrategyConfig>();
        require_send::<FeeSchedule>();
        require_sync::<FeeSchedule>();
        require_send::<Ledger>();
        require_sync::<Ledger>();
        require_send::<TradeReport>();
        require_sync::<TradeReport>();
        require_send::<PathReplayResolver>();
        require_sync::<PathReplayResolver>();
        require_send::<MonteCarloResolver>();
        require_sync::<MonteCarloResolver>();
    }
}
