//! Artifact export: JSON reports, trade/leaderboard CSVs, and a Markdown
//! summary for pasting into a journal.
//!
//! JSON artifacts carry a `schema_version` so downstream notebooks can
//! reject files from a different engine generation instead of
//! misinterpreting them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use siglab_core::config::{PositionSizing, StrategyConfig};
use siglab_core::domain::TradeRecord;
use siglab_core::report::TradeReport;

use crate::feed::TIMESTAMP_FORMAT;
use crate::leaderboard::{ConfigOutcome, SweepEntry};
use crate::sweep::SweepResult;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct RunArtifact<'a> {
    schema_version: u32,
    config: &'a StrategyConfig,
    report: &'a TradeReport,
}

#[derive(Serialize)]
struct SweepArtifact<'a> {
    schema_version: u32,
    result: &'a SweepResult,
}

/// Full single-run artifact as pretty JSON.
pub fn render_report_json(config: &StrategyConfig, report: &TradeReport) -> Result<String> {
    let artifact = RunArtifact {
        schema_version: SCHEMA_VERSION,
        config,
        report,
    };
    serde_json::to_string_pretty(&artifact).context("serializing run report")
}

/// One row per trade, flat CSV.
pub fn trades_to_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "symbol",
        "direction",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "exit_reason",
        "equity",
        "notional",
        "gross_pnl",
        "fees",
        "net_pnl",
        "balance_after",
    ])?;
    for trade in trades {
        writer.write_record([
            trade.symbol.clone(),
            trade.direction.to_string(),
            trade.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.8}", trade.entry_price),
            trade.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.8}", trade.exit_price),
            trade.exit_reason.to_string(),
            format!("{:.2}", trade.equity),
            format!("{:.2}", trade.notional),
            format!("{:.4}", trade.gross_pnl),
            format!("{:.4}", trade.fees),
            format!("{:.4}", trade.net_pnl),
            format!("{:.4}", trade.balance_after),
        ])?;
    }
    let bytes = writer.into_inner().context("flushing trades csv")?;
    String::from_utf8(bytes).context("trades csv is not utf-8")
}

/// One row per leaderboard entry, ranked order.
pub fn leaderboard_to_csv(entries: &[SweepEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "rank",
        "run_id",
        "status",
        "leverage",
        "stop_loss_pct",
        "target_policy",
        "sizing",
        "concurrency_limit",
        "direction_filter",
        "final_balance",
        "win_rate",
        "trade_count",
        "max_drawdown",
        "profit_factor",
        "error",
    ])?;
    for (rank, entry) in entries.iter().enumerate() {
        let config = &entry.config;
        let (status, trade_count, max_drawdown, profit_factor, error) = match &entry.outcome {
            ConfigOutcome::Completed(report) => (
                "completed".to_string(),
                report.trade_count.to_string(),
                format!("{:.4}", report.max_drawdown),
                format!("{:.2}", report.profit_factor),
                String::new(),
            ),
            ConfigOutcome::Failed { error } => (
                "failed".to_string(),
                String::new(),
                String::new(),
                String::new(),
                error.clone(),
            ),
        };
        let final_balance = if entry.is_completed() {
            format!("{:.2}", entry.final_balance())
        } else {
            String::new()
        };
        writer.write_record([
            (rank + 1).to_string(),
            entry.run_id.clone(),
            status,
            config.leverage.to_string(),
            config.stop_loss_pct.to_string(),
            variant_name(&config.target_policy)?,
            sizing_label(&config.sizing),
            config.concurrency_limit.to_string(),
            variant_name(&config.direction_filter)?,
            final_balance,
            format!("{:.4}", entry.win_rate()),
            trade_count,
            max_drawdown,
            profit_factor,
            error,
        ])?;
    }
    let bytes = writer.into_inner().context("flushing leaderboard csv")?;
    String::from_utf8(bytes).context("leaderboard csv is not utf-8")
}

/// Human-readable run summary.
pub fn render_summary_md(config: &StrategyConfig, report: &TradeReport) -> String {
    let mut md = String::new();
    md.push_str("# Backtest summary\n\n");
    md.push_str(&format!("- Run id: `{}`\n", config.run_id()));
    md.push_str(&format!(
        "- Leverage {}x, stop loss {}% of equity, concurrency {}\n",
        config.leverage, config.stop_loss_pct, config.concurrency_limit
    ));
    md.push_str(&format!(
        "- Balance: {:.2} → {:.2} ({:+.2}%)\n",
        report.initial_balance, report.final_balance, report.roi_pct
    ));
    md.push_str(&format!(
        "- Trades: {} ({} wins / {} losses, win rate {:.1}%)\n",
        report.trade_count,
        report.wins,
        report.losses,
        report.win_rate * 100.0
    ));
    md.push_str(&format!(
        "- Exits: TP {:.1}% / SL {:.1}% / TTL {:.1}%\n",
        report.exits.tp_pct(),
        report.exits.sl_pct(),
        report.exits.ttl_pct()
    ));
    md.push_str(&format!(
        "- Fees paid: {:.2}, max drawdown {:.1}%, profit factor {:.2}\n",
        report.total_fees,
        report.max_drawdown * 100.0,
        report.profit_factor
    ));
    md.push_str(&format!("- Signals skipped: {}\n", report.skips.total()));
    if report.liquidated {
        md.push_str("\n**Account liquidated before the end of the log.**\n");
    }
    md
}

/// Write `report.json`, `trades.csv`, and `summary.md` into a directory.
pub fn save_run_artifacts(dir: &Path, config: &StrategyConfig, report: &TradeReport) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating artifact directory {}", dir.display()))?;
    write_artifact(dir, "report.json", &render_report_json(config, report)?)?;
    write_artifact(dir, "trades.csv", &trades_to_csv(&report.trades)?)?;
    write_artifact(dir, "summary.md", &render_summary_md(config, report))?;
    Ok(())
}

/// Write `leaderboard.json` and `leaderboard.csv` into a directory.
pub fn save_sweep_artifacts(dir: &Path, result: &SweepResult) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating artifact directory {}", dir.display()))?;
    let artifact = SweepArtifact {
        schema_version: SCHEMA_VERSION,
        result,
    };
    let json = serde_json::to_string_pretty(&artifact).context("serializing sweep result")?;
    write_artifact(dir, "leaderboard.json", &json)?;
    write_artifact(
        dir,
        "leaderboard.csv",
        &leaderboard_to_csv(result.leaderboard.entries())?,
    )?;
    Ok(())
}

fn write_artifact(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
}

/// snake_case variant name of a plain serde enum.
fn variant_name<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json.trim_matches('"').to_string())
}

fn sizing_label(sizing: &PositionSizing) -> String {
    match sizing {
        PositionSizing::FixedAmount { amount } => format!("fixed:{amount}"),
        PositionSizing::PercentOfBalance { percent } => format!("percent:{percent}"),
    }
}
