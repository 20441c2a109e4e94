//! Siglab Runner — orchestration around the core engine.
//!
//! Everything that touches the outside world lives here: CSV signal-log
//! ingestion, single-run and Monte Carlo drivers, the parallel parameter
//! sweep with its leaderboard, exclusion search, ground-truth validation,
//! and artifact export.

pub mod exclusion;
pub mod export;
pub mod feed;
pub mod leaderboard;
pub mod runner;
pub mod space;
pub mod sweep;
pub mod validate;

pub use exclusion::{ExclusionResult, PairStats};
pub use feed::{LoadError, LoadedSignals};
pub use leaderboard::{ConfigOutcome, Leaderboard, SweepEntry};
pub use runner::{McSummary, RunError, RunOutput};
pub use space::{ConfigSpace, SpaceError};
pub use sweep::{SweepOptions, SweepResult};
pub use validate::ValidationReport;
