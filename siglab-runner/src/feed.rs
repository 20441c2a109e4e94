//! Signal-log ingestion.
//!
//! The effectiveness log is an append-only CSV written by an external
//! tracker. Real logs carry damage — truncated rows, missing prices,
//! unparseable timestamps — so ingestion is tolerant: malformed rows are
//! counted and dropped, never fatal. Only an unreadable file or a log with
//! zero parseable rows is an error.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use siglab_core::domain::{Direction, RecordedResult, Signal};

/// Primary timestamp format of the tracker log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open signal log: {0}")]
    Io(#[from] io::Error),
    #[error("failed to read signal log: {0}")]
    Csv(#[from] csv::Error),
    #[error("signal log contains no parseable rows ({skipped} skipped)")]
    NoValidRows { skipped: usize },
}

/// Ingestion result: the usable signals plus a count of dropped rows.
#[derive(Debug, Clone, Default)]
pub struct LoadedSignals {
    pub signals: Vec<Signal>,
    pub skipped_rows: usize,
}

/// Raw CSV row. Everything beyond symbol/verdict/timestamp is optional at
/// the serde level so a half-written row deserializes and gets rejected by
/// `parse_row` instead of poisoning the whole read.
#[derive(Debug, Deserialize)]
struct RawRow {
    symbol: String,
    verdict: String,
    timestamp_sent: String,
    entry_price: Option<f64>,
    target_min: Option<f64>,
    target_max: Option<f64>,
    highest_reached: Option<f64>,
    lowest_reached: Option<f64>,
    final_price: Option<f64>,
    duration_minutes: Option<f64>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    result: Option<String>,
}

/// Load a signal log from disk.
pub fn load_signals(path: &Path) -> Result<LoadedSignals, LoadError> {
    let file = File::open(path)?;
    load_signals_from_reader(file)
}

/// Load a signal log from any reader. Rows come back in file order;
/// callers sort before replay.
pub fn load_signals_from_reader<R: io::Read>(reader: R) -> Result<LoadedSignals, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut loaded = LoadedSignals::default();
    for record in csv_reader.deserialize::<RawRow>() {
        let Ok(raw) = record else {
            loaded.skipped_rows += 1;
            continue;
        };
        match parse_row(raw) {
            Some(signal) => loaded.signals.push(signal),
            None => loaded.skipped_rows += 1,
        }
    }

    if loaded.signals.is_empty() {
        return Err(LoadError::NoValidRows {
            skipped: loaded.skipped_rows,
        });
    }
    Ok(loaded)
}

fn parse_row(raw: RawRow) -> Option<Signal> {
    let direction = parse_direction(&raw.verdict)?;
    let timestamp = parse_timestamp(&raw.timestamp_sent)?;
    Some(Signal {
        symbol: raw.symbol,
        direction,
        timestamp,
        entry_price: raw.entry_price?,
        target_min: raw.target_min?,
        target_max: raw.target_max?,
        highest_reached: raw.highest_reached?,
        lowest_reached: raw.lowest_reached?,
        final_price: raw.final_price?,
        duration_minutes: raw.duration_minutes.map(|d| d as i64).unwrap_or(0),
        confidence: raw.confidence,
        result: raw.result.as_deref().and_then(parse_result),
    })
}

fn parse_direction(verdict: &str) -> Option<Direction> {
    match verdict {
        "BUY" => Some(Direction::Buy),
        "SELL" => Some(Direction::Sell),
        _ => None,
    }
}

/// Recognized result labels; anything else reads as unlabeled.
fn parse_result(label: &str) -> Option<RecordedResult> {
    match label {
        "WIN" => Some(RecordedResult::Win),
        "LOSS" => Some(RecordedResult::Loss),
        "CANCELLED" => Some(RecordedResult::Cancelled),
        _ => None,
    }
}

/// Tracker format first, RFC 3339 as fallback for logs that passed through
/// a spreadsheet export.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    chrono::DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "symbol,verdict,timestamp_sent,entry_price,target_min,target_max,\
                          highest_reached,lowest_reached,final_price,duration_minutes,confidence,result";

    fn load(rows: &[&str]) -> Result<LoadedSignals, LoadError> {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        load_signals_from_reader(text.as_bytes())
    }

    #[test]
    fn parses_well_formed_rows() {
        let loaded = load(&[
            "BTC-USDT,BUY,2025-11-17 10:00:00,100.0,101.0,103.0,102.0,99.5,100.8,30,0.8,WIN",
            "ETH-USDT,SELL,2025-11-17 10:05:00,50.0,48.5,49.5,50.4,49.2,49.4,45,,LOSS",
        ])
        .unwrap();
        assert_eq!(loaded.signals.len(), 2);
        assert_eq!(loaded.skipped_rows, 0);

        let first = &loaded.signals[0];
        assert_eq!(first.symbol, "BTC-USDT");
        assert_eq!(first.direction, Direction::Buy);
        assert_eq!(first.entry_price, 100.0);
        assert_eq!(first.duration_minutes, 30);
        assert_eq!(first.confidence, Some(0.8));
        assert_eq!(first.result, Some(RecordedResult::Win));

        let second = &loaded.signals[1];
        assert_eq!(second.direction, Direction::Sell);
        assert_eq!(second.confidence, None);
        assert_eq!(second.result, Some(RecordedResult::Loss));
    }

    #[test]
    fn malformed_rows_are_counted_not_fatal() {
        let loaded = load(&[
            "BTC-USDT,BUY,2025-11-17 10:00:00,100.0,101.0,103.0,102.0,99.5,100.8,30,0.8,WIN",
            "ETH-USDT,SIDEWAYS,2025-11-17 10:01:00,50.0,48.5,49.5,50.4,49.2,49.4,45,,",
            "SOL-USDT,BUY,not-a-timestamp,20.0,21.0,22.0,21.5,19.9,21.0,30,,",
            "XRP-USDT,SELL,2025-11-17 10:03:00,,0.48,0.49,0.51,0.47,0.48,30,,",
            "DOGE-USDT,BUY,2025-11-17 10:04:00,0.1,abc,0.12,0.11,0.09,0.1,30,,",
        ])
        .unwrap();
        assert_eq!(loaded.signals.len(), 1);
        assert_eq!(loaded.skipped_rows, 4);
    }

    #[test]
    fn all_rows_bad_is_an_error() {
        let err = load(&["FOO,HOLD,garbage,,,,,,,,,"]).unwrap_err();
        assert!(matches!(err, LoadError::NoValidRows { skipped: 1 }));
    }

    #[test]
    fn rfc3339_timestamp_fallback() {
        let loaded = load(&[
            "BTC-USDT,BUY,2025-11-17T10:00:00+00:00,100.0,101.0,103.0,102.0,99.5,100.8,30,,",
        ])
        .unwrap();
        assert_eq!(
            loaded.signals[0].timestamp,
            NaiveDateTime::parse_from_str("2025-11-17 10:00:00", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let loaded = load(&[
            "BTC-USDT,BUY,2025-11-17 10:00:00,100.0,101.0,103.0,102.0,99.5,100.8,,,",
        ])
        .unwrap();
        // Zero duration: the resolver applies its own TTL fallback.
        assert_eq!(loaded.signals[0].duration_minutes, 0);
    }
}
