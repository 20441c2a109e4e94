//! Domain types: signals, positions, trades.

pub mod position;
pub mod signal;
pub mod trade;

pub use position::Position;
pub use signal::{Direction, InvalidSignal, RecordedResult, Signal};
pub use trade::{ExitReason, TradeRecord};
