//! Position ledger — capital and concurrency discipline over a signal stream.
//!
//! One generalized model covers both admission policies: sequential all-in
//! is `concurrency_limit = 1` with 100% percent-of-balance sizing;
//! bounded-parallel is `concurrency_limit = N` with fixed or percent sizing
//! per slot. "Concurrent positions" is a
//! logical capital-allocation constraint — the replay itself is
//! single-threaded and strictly time-ordered.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{PositionSizing, StrategyConfig};
use crate::domain::{Position, Signal, TradeRecord};
use crate::pnl;
use crate::resolver::ExitResolver;

/// Itemized skip accounting. Skips are normal outcomes, never errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// No free concurrency slot.
    pub capacity: usize,
    /// Not enough uncommitted balance for the sized position.
    pub capital: usize,
    /// Sized position fell below the minimum ticket.
    pub min_ticket: usize,
    /// Selected target policy produced no valid target price.
    pub no_target: usize,
    /// Structurally invalid signal record.
    pub invalid: usize,
    /// Filtered out by the direction filter.
    pub direction: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.capacity
            + self.capital
            + self.min_ticket
            + self.no_target
            + self.invalid
            + self.direction
    }
}

/// Precondition failures. Unsorted input silently corrupts capacity
/// accounting, so the ledger refuses it outright.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("signal stream is out of order: {current} arrived after {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Stateful scheduler: admits signals, holds open positions until the
/// signal-time cursor passes their close time, settles them into the
/// trade list, and halts on liquidation.
#[derive(Debug)]
pub struct Ledger {
    config: StrategyConfig,
    balance: f64,
    open: Vec<Position>,
    closed: Vec<TradeRecord>,
    skips: SkipCounts,
    liquidated: bool,
    cursor: Option<NaiveDateTime>,
}

impl Ledger {
    pub fn new(config: StrategyConfig) -> Self {
        let balance = config.initial_balance;
        Self {
            config,
            balance,
            open: Vec::new(),
            closed: Vec::new(),
            skips: SkipCounts::default(),
            liquidated: false,
            cursor: None,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Equity currently locked in open positions.
    pub fn committed_equity(&self) -> f64 {
        self.open.iter().map(|p| p.equity).sum()
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.closed
    }

    pub fn skips(&self) -> SkipCounts {
        self.skips
    }

    pub fn is_liquidated(&self) -> bool {
        self.liquidated
    }

    /// Process one incoming signal at its timestamp.
    ///
    /// Settles due positions first, then decides admission. Skips never
    /// raise; the only error is an out-of-order stream.
    pub fn process(
        &mut self,
        signal: &Signal,
        resolver: &mut dyn ExitResolver,
    ) -> Result<(), LedgerError> {
        if let Some(previous) = self.cursor {
            if signal.timestamp < previous {
                return Err(LedgerError::OutOfOrder {
                    previous,
                    current: signal.timestamp,
                });
            }
        }
        self.cursor = Some(signal.timestamp);

        self.settle_due(signal.timestamp);
        if self.liquidated {
            return Ok(());
        }

        if !self.config.direction_filter.admits(signal.direction) {
            self.skips.direction += 1;
            return Ok(());
        }
        if signal.validate().is_err() {
            self.skips.invalid += 1;
            return Ok(());
        }
        if self.open.len() >= self.config.concurrency_limit {
            self.skips.capacity += 1;
            return Ok(());
        }

        let equity = match self.config.sizing {
            PositionSizing::FixedAmount { amount } => amount,
            PositionSizing::PercentOfBalance { percent } => self.balance * percent / 100.0,
        };
        let available = self.balance - self.committed_equity();
        if equity > available {
            self.skips.capital += 1;
            return Ok(());
        }
        if equity < self.config.min_ticket {
            self.skips.min_ticket += 1;
            return Ok(());
        }

        let Some(outcome) = resolver.resolve(signal, &self.config) else {
            self.skips.no_target += 1;
            return Ok(());
        };

        let breakdown = pnl::compute(
            signal.entry_price,
            outcome.exit_price,
            signal.direction,
            equity,
            self.config.leverage,
            outcome.reason,
            &self.config.fees,
        );

        self.open.push(Position {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_time: signal.timestamp,
            entry_price: signal.entry_price,
            equity,
            notional: equity * self.config.leverage as f64,
            close_time: signal.timestamp + Duration::minutes(outcome.duration_minutes),
            exit_price: outcome.exit_price,
            exit_reason: outcome.reason,
            gross_pnl: breakdown.gross_pnl,
            fees: breakdown.total_fees(),
            net_pnl: breakdown.net_pnl,
        });
        Ok(())
    }

    /// Settle everything still open, in close-time order.
    pub fn finish(&mut self) {
        if self.liquidated {
            return;
        }
        self.open
            .sort_by_key(|p| p.close_time);
        while !self.open.is_empty() {
            let position = self.open.remove(0);
            self.settle(position);
            if self.liquidated {
                return;
            }
        }
    }

    /// Consume the ledger, yielding the closed trades.
    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.closed
    }

    /// Close every open position whose close time the cursor has passed.
    fn settle_due(&mut self, now: NaiveDateTime) {
        loop {
            let due = self
                .open
                .iter()
                .enumerate()
                .filter(|(_, p)| p.close_time <= now)
                .min_by_key(|(_, p)| p.close_time)
                .map(|(i, _)| i);
            let Some(idx) = due else { return };
            let position = self.open.remove(idx);
            self.settle(position);
            if self.liquidated {
                return;
            }
        }
    }

    fn settle(&mut self, position: Position) {
        self.balance += position.net_pnl;
        let balance_after = self.balance;
        self.closed.push(position.into_trade(balance_after));
        if self.balance <= self.config.liquidation_epsilon {
            self.liquidated = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DirectionFilter, ResolverMode, TargetPolicy};
    use crate::domain::{Direction, ExitReason};
    use crate::fees::FeeSchedule;
    use crate::resolver::PathReplayResolver;
    use chrono::NaiveDate;

    fn ts(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 17)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn make_config() -> StrategyConfig {
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
            fees: FeeSchedule::zero(),
            resolver: ResolverMode::PathReplay,
        }
    }

    fn tp_signal(minute: u32) -> Signal {
        // hybrid BUY target 101, highest 102 ⇒ TP
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

    fn sl_signal(minute: u32) -> Signal {
        Signal {
            highest_reached: 100.5,
            lowest_reached: 98.8,
            final_price: 99.1,
            ..tp_signal(minute)
        }
    }

    #[test]
    fn admits_and_settles_one_position() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.trades().len(), 0);
        // Balance only moves at settlement.
        assert_eq!(ledger.balance(), 1000.0);

        ledger.finish();
        assert_eq!(ledger.open_count(), 0);
        assert_eq!(ledger.trades().len(), 1);
        // +1% price move at 10x all-in, zero fees ⇒ +10%
        assert!((ledger.balance() - 1100.0).abs() < 1e-9);
        assert_eq!(ledger.trades()[0].exit_reason, ExitReason::Tp);
    }

    #[test]
    fn concurrency_limit_skips_overflow() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        // TP closes after 5 minutes; at minute 2 the slot is still busy.
        ledger.process(&tp_signal(2), &mut resolver).unwrap();
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.skips().capacity, 1);

        // By minute 6 the first position settled, freeing the slot.
        ledger.process(&tp_signal(6), &mut resolver).unwrap();
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.trades().len(), 1);
    }

    #[test]
    fn out_of_order_stream_rejected() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(10), &mut resolver).unwrap();
        let err = ledger.process(&tp_signal(5), &mut resolver).unwrap_err();
        assert!(matches!(err, LedgerError::OutOfOrder { .. }));
    }

    #[test]
    fn invalid_signal_skipped_not_fatal() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        let mut bad = tp_signal(0);
        bad.entry_price = -1.0;
        ledger.process(&bad, &mut resolver).unwrap();
        assert_eq!(ledger.skips().invalid, 1);
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn missing_target_counts_as_no_target() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        let mut no_target = tp_signal(0);
        no_target.target_min = 0.0;
        ledger.process(&no_target, &mut resolver).unwrap();
        assert_eq!(ledger.skips().no_target, 1);
    }

    #[test]
    fn direction_filter_skips() {
        let mut config = make_config();
        config.direction_filter = DirectionFilter::SellOnly;
        let mut ledger = Ledger::new(config);
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        assert_eq!(ledger.skips().direction, 1);
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn fixed_sizing_respects_uncommitted_balance() {
        let mut config = make_config();
        config.concurrency_limit = 3;
        config.sizing = PositionSizing::FixedAmount { amount: 600.0 };
        let mut ledger = Ledger::new(config);
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        assert_eq!(ledger.open_count(), 1);
        assert!((ledger.committed_equity() - 600.0).abs() < 1e-9);

        // Second slot would need 600 but only 400 is uncommitted.
        ledger.process(&tp_signal(1), &mut resolver).unwrap();
        assert_eq!(ledger.open_count(), 1);
        assert_eq!(ledger.skips().capital, 1);
    }

    #[test]
    fn min_ticket_floor_skips_dust() {
        let mut config = make_config();
        config.sizing = PositionSizing::FixedAmount { amount: 5.0 };
        let mut ledger = Ledger::new(config);
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        assert_eq!(ledger.skips().min_ticket, 1);
    }

    #[test]
    fn liquidation_halts_the_run() {
        let mut config = make_config();
        config.stop_loss_pct = 100.0; // 100% equity stop: one SL wipes the account
        let mut ledger = Ledger::new(config);
        let mut resolver = PathReplayResolver::new();

        // SL at 10% price distance needs lowest ≤ 90
        let mut wipe = sl_signal(0);
        wipe.lowest_reached = 89.0;
        ledger.process(&wipe, &mut resolver).unwrap();
        ledger.finish();
        assert!(ledger.is_liquidated());
        assert_eq!(ledger.trades().len(), 1);

        // Further processing is inert after liquidation.
        let mut ledger2 = Ledger::new({
            let mut c = make_config();
            c.stop_loss_pct = 100.0;
            c
        });
        let mut wipe2 = sl_signal(0);
        wipe2.lowest_reached = 89.0;
        ledger2.process(&wipe2, &mut resolver).unwrap();
        ledger2.process(&tp_signal(30), &mut resolver).unwrap();
        assert!(ledger2.is_liquidated());
        assert_eq!(ledger2.open_count(), 0);
    }

    #[test]
    fn percent_sizing_compounds_across_settlements() {
        let mut ledger = Ledger::new(make_config());
        let mut resolver = PathReplayResolver::new();

        ledger.process(&tp_signal(0), &mut resolver).unwrap();
        // First trade settles before the second admission (TP after 5 min).
        ledger.process(&tp_signal(10), &mut resolver).unwrap();
        ledger.finish();

        let trades = ledger.trades();
        assert_eq!(trades.len(), 2);
        assert!((trades[0].equity - 1000.0).abs() < 1e-9);
        // Second position sized from the compounded balance.
        assert!((trades[1].equity - 1100.0).abs() < 1e-9);
        assert!((ledger.balance() - 1210.0).abs() < 1e-9);
    }
}
