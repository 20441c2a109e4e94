//! Signal — one immutable, externally produced record from the signal log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Ground-truth outcome recorded by the tracker, when present.
///
/// Used only to validate the resolver against real outcomes; the simulation
/// itself never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordedResult {
    Win,
    Loss,
    Cancelled,
}

/// One signal as recorded by the effectiveness log.
///
/// `highest_reached` / `lowest_reached` / `final_price` describe the price
/// path over the signal's observation window. Target bounds of 0 mean
/// "no valid target" for that edge of the zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub target_min: f64,
    pub target_max: f64,
    pub highest_reached: f64,
    pub lowest_reached: f64,
    pub final_price: f64,
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RecordedResult>,
}

/// Structural problems that make a signal untradeable.
///
/// These are skip conditions, never run-aborting errors: the upstream
/// tracker does not enforce the extremes invariant, so the engine must
/// tolerate violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSignal {
    #[error("non-positive entry price")]
    NonPositiveEntry,
    #[error("non-finite price field")]
    NonFinitePrice,
    #[error("price extremes inconsistent with entry")]
    InconsistentExtremes,
}

impl Signal {
    /// Structural validation.
    ///
    /// Entry must be positive and finite, and the recorded extremes must
    /// bracket the entry: `lowest_reached ≤ entry_price ≤ highest_reached`,
    /// regardless of direction.
    pub fn validate(&self) -> Result<(), InvalidSignal> {
        let prices = [
            self.entry_price,
            self.target_min,
            self.target_max,
            self.highest_reached,
            self.lowest_reached,
            self.final_price,
        ];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(InvalidSignal::NonFinitePrice);
        }
        if self.entry_price <= 0.0 {
            return Err(InvalidSignal::NonPositiveEntry);
        }
        if self.highest_reached < self.entry_price || self.lowest_reached > self.entry_price {
            return Err(InvalidSignal::InconsistentExtremes);
        }
        Ok(())
    }

    /// The excursion that moves against the position: `lowest_reached` for
    /// BUY, `highest_reached` for SELL.
    pub fn adverse_excursion(&self) -> f64 {
        match self.direction {
            Direction::Buy => self.lowest_reached,
            Direction::Sell => self.highest_reached,
        }
    }

    /// The excursion that moves with the position.
    pub fn favorable_excursion(&self) -> f64 {
        match self.direction {
            Direction::Buy => self.highest_reached,
            Direction::Sell => self.lowest_reached,
        }
    }
}
