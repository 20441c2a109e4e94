//! Sweep parameter space.
//!
//! A [`ConfigSpace`] is the Cartesian product of per-parameter axes over a
//! shared template. Configurations are never materialized up front: each
//! one is decoded from its flat index on demand (mixed-radix, last axis
//! fastest), so a sweep can be sharded, resumed from an index, or iterated
//! lazily without holding the whole grid in memory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use siglab_core::config::{DirectionFilter, PositionSizing, StrategyConfig, TargetPolicy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpaceError {
    #[error("sweep axis `{0}` is empty")]
    EmptyAxis(&'static str),
}

/// Axes of the sweep, applied over `template` in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpace {
    pub leverages: Vec<u32>,
    pub stop_loss_pcts: Vec<f64>,
    pub target_policies: Vec<TargetPolicy>,
    pub sizings: Vec<PositionSizing>,
    pub concurrency_limits: Vec<usize>,
    pub direction_filters: Vec<DirectionFilter>,
    /// Fixed parameters every generated configuration shares: balance,
    /// fees, ticket floor, resolver mode.
    pub template: StrategyConfig,
}

impl ConfigSpace {
    pub fn validate(&self) -> Result<(), SpaceError> {
        if self.leverages.is_empty() {
            return Err(SpaceError::EmptyAxis("leverages"));
        }
        if self.stop_loss_pcts.is_empty() {
            return Err(SpaceError::EmptyAxis("stop_loss_pcts"));
        }
        if self.target_policies.is_empty() {
            return Err(SpaceError::EmptyAxis("target_policies"));
        }
        if self.sizings.is_empty() {
            return Err(SpaceError::EmptyAxis("sizings"));
        }
        if self.concurrency_limits.is_empty() {
            return Err(SpaceError::EmptyAxis("concurrency_limits"));
        }
        if self.direction_filters.is_empty() {
            return Err(SpaceError::EmptyAxis("direction_filters"));
        }
        Ok(())
    }

    /// Total number of configurations in the grid.
    pub fn len(&self) -> usize {
        self.leverages.len()
            * self.stop_loss_pcts.len()
            * self.target_policies.len()
            * self.sizings.len()
            * self.concurrency_limits.len()
            * self.direction_filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode the configuration at a flat index, or `None` out of range.
    ///
    /// Index order is fixed: the last declared axis varies fastest. The
    /// mapping is part of the artifact contract — resumed or sharded sweeps
    /// rely on it staying put.
    pub fn get(&self, index: usize) -> Option<StrategyConfig> {
        if index >= self.len() {
            return None;
        }
        let mut rest = index;

        let direction_filter = self.direction_filters[rest % self.direction_filters.len()];
        rest /= self.direction_filters.len();
        let concurrency_limit = self.concurrency_limits[rest % self.concurrency_limits.len()];
        rest /= self.concurrency_limits.len();
        let sizing = self.sizings[rest % self.sizings.len()];
        rest /= self.sizings.len();
        let target_policy = self.target_policies[rest % self.target_policies.len()];
        rest /= self.target_policies.len();
        let stop_loss_pct = self.stop_loss_pcts[rest % self.stop_loss_pcts.len()];
        rest /= self.stop_loss_pcts.len();
        let leverage = self.leverages[rest];

        Some(StrategyConfig {
            leverage,
            stop_loss_pct,
            target_policy,
            sizing,
            concurrency_limit,
            direction_filter,
            ..self.template.clone()
        })
    }

    pub fn iter(&self) -> ConfigSpaceIter<'_> {
        self.iter_from(0)
    }

    /// Iterate starting at a flat index; used to resume interrupted sweeps.
    pub fn iter_from(&self, start: usize) -> ConfigSpaceIter<'_> {
        ConfigSpaceIter {
            space: self,
            next: start,
            len: self.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigSpaceIter<'a> {
    space: &'a ConfigSpace,
    next: usize,
    len: usize,
}

impl Iterator for ConfigSpaceIter<'_> {
    type Item = StrategyConfig;

    fn next(&mut self) -> Option<StrategyConfig> {
        let config = self.space.get(self.next)?;
        self.next += 1;
        Some(config)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ConfigSpaceIter<'_> {}
