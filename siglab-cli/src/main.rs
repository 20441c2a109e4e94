//! Siglab CLI — backtest, sweep, validate, and exclusion-search commands.
//!
//! Commands:
//! - `run` — replay one strategy configuration over a signal log
//! - `sweep` — evaluate a parameter grid and print the leaderboard
//! - `validate` — compare the resolver against the log's recorded results
//! - `exclude` — greedily search for loss-making symbol/direction pairs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use siglab_core::config::StrategyConfig;
use siglab_core::domain::Signal;
use siglab_core::report::TradeReport;
use siglab_runner::exclusion;
use siglab_runner::export;
use siglab_runner::feed;
use siglab_runner::runner;
use siglab_runner::space::ConfigSpace;
use siglab_runner::sweep::{run_sweep_with_progress, SweepOptions, SweepResult};
use siglab_runner::validate::validate_resolver;

#[derive(Parser)]
#[command(name = "siglab", about = "Signal-log backtest and strategy-sweep engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one strategy configuration over a signal log.
    Run {
        /// Path to a TOML strategy config.
        #[arg(long)]
        config: PathBuf,

        /// Path to the signal-log CSV.
        #[arg(long)]
        signals: PathBuf,

        /// Output directory for report.json, trades.csv, summary.md.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Evaluate a parameter grid and print the leaderboard.
    Sweep {
        /// Path to a TOML sweep config (axes + template + options).
        #[arg(long)]
        config: PathBuf,

        /// Path to the signal-log CSV.
        #[arg(long)]
        signals: PathBuf,

        /// Output directory for leaderboard.json and leaderboard.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Leaderboard rows to print (overrides the config's top_n).
        #[arg(long)]
        top: Option<usize>,

        /// Wall-clock budget in seconds (overrides the config's timeout_secs).
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Compare the deterministic resolver against recorded WIN/LOSS labels.
    Validate {
        /// Path to a TOML strategy config.
        #[arg(long)]
        config: PathBuf,

        /// Path to the signal-log CSV.
        #[arg(long)]
        signals: PathBuf,
    },
    /// Greedily exclude loss-making symbol/direction pairs.
    Exclude {
        /// Path to a TOML strategy config.
        #[arg(long)]
        config: PathBuf,

        /// Path to the signal-log CSV.
        #[arg(long)]
        signals: PathBuf,

        /// Maximum number of pairs to cut.
        #[arg(long, default_value_t = 5)]
        max_cuts: usize,
    },
}

/// On-disk sweep configuration.
#[derive(Debug, Deserialize)]
struct SweepSpec {
    #[serde(flatten)]
    space: ConfigSpace,
    /// Wall-clock budget in seconds; unset means unbounded.
    timeout_secs: Option<u64>,
    /// Leaderboard rows to print.
    #[serde(default = "default_top_n")]
    top_n: usize,
}

fn default_top_n() -> usize {
    10
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            signals,
            output_dir,
        } => cmd_run(&config, &signals, &output_dir),
        Commands::Sweep {
            config,
            signals,
            output_dir,
            top,
            timeout_secs,
        } => cmd_sweep(&config, &signals, &output_dir, top, timeout_secs),
        Commands::Validate { config, signals } => cmd_validate(&config, &signals),
        Commands::Exclude {
            config,
            signals,
            max_cuts,
        } => cmd_exclude(&config, &signals, max_cuts),
    }
}

fn cmd_run(config_path: &Path, signals_path: &Path, output_dir: &Path) -> Result<()> {
    let config = load_strategy_config(config_path)?;
    let signals = load_signal_log(signals_path)?;

    let output = runner::evaluate(&config, &signals)?;
    print_report(&config, &output.report);
    if let Some(mc) = &output.mc {
        println!("--- Monte Carlo ({} runs) ---", mc.runs);
        println!(
            "Final balance:  {:.2} ± {:.2} (min {:.2}, max {:.2})",
            mc.mean_final_balance,
            mc.std_final_balance,
            mc.min_final_balance,
            mc.max_final_balance
        );
        println!("Mean win rate:  {:.1}%", mc.mean_win_rate * 100.0);
        println!("Liquidations:   {:.1}%", mc.liquidation_rate * 100.0);
        println!();
    }

    export::save_run_artifacts(output_dir, &config, &output.report)?;
    println!("Artifacts saved to: {}", output_dir.display());
    Ok(())
}

fn cmd_sweep(
    config_path: &Path,
    signals_path: &Path,
    output_dir: &Path,
    top: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let text = fs::read_to_string(config_path)
        .with_context(|| format!("reading sweep config {}", config_path.display()))?;
    let spec: SweepSpec = toml::from_str(&text)
        .with_context(|| format!("parsing sweep config {}", config_path.display()))?;
    let signals = load_signal_log(signals_path)?;

    let options = SweepOptions {
        timeout: timeout_secs.or(spec.timeout_secs).map(Duration::from_secs),
        cancel: None,
    };
    println!("Sweeping {} configurations...", spec.space.len());
    let result = run_sweep_with_progress(&spec.space, &signals, &options, |done, total| {
        if done % 100 == 0 || done == total {
            println!("  {done}/{total}");
        }
    })?;

    print_leaderboard(&result, top.unwrap_or(spec.top_n));
    export::save_sweep_artifacts(output_dir, &result)?;
    println!("Artifacts saved to: {}", output_dir.display());
    Ok(())
}

fn cmd_validate(config_path: &Path, signals_path: &Path) -> Result<()> {
    let config = load_strategy_config(config_path)?;
    let signals = load_signal_log(signals_path)?;

    let report = validate_resolver(&config, &signals)?;
    println!();
    println!("=== Resolver Validation ===");
    println!("Checked:        {}", report.checked);
    println!("Agree:          {}", report.agree);
    println!("Disagree:       {}", report.disagree);
    println!("Agreement rate: {:.1}%", report.agreement_rate() * 100.0);
    println!(
        "Skipped:        {} cancelled, {} unlabeled, {} unresolved",
        report.skipped_cancelled, report.skipped_unlabeled, report.skipped_unresolved
    );
    println!();
    Ok(())
}

fn cmd_exclude(config_path: &Path, signals_path: &Path, max_cuts: usize) -> Result<()> {
    let config = load_strategy_config(config_path)?;
    let signals = load_signal_log(signals_path)?;

    let result = exclusion::greedy_exclusion_search(&config, &signals, max_cuts)?;
    println!();
    println!("=== Exclusion Search ===");
    if result.excluded.is_empty() {
        println!("No exclusion improved total net pnl.");
    } else {
        println!("Excluded pairs (in cut order):");
        for (symbol, direction) in &result.excluded {
            println!("  {symbol} {direction}");
        }
        println!(
            "Total net pnl:  {:.2} → {:.2} ({:+.2})",
            result.baseline.total_net_pnl,
            result.improved.total_net_pnl,
            result.pnl_gain()
        );
        println!(
            "Final balance:  {:.2} → {:.2}",
            result.baseline.final_balance, result.improved.final_balance
        );
    }
    println!();
    Ok(())
}

fn load_strategy_config(path: &Path) -> Result<StrategyConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading strategy config {}", path.display()))?;
    let config: StrategyConfig =
        toml::from_str(&text).with_context(|| format!("parsing strategy config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn load_signal_log(path: &Path) -> Result<Vec<Signal>> {
    let loaded = feed::load_signals(path)
        .with_context(|| format!("loading signal log {}", path.display()))?;
    if loaded.skipped_rows > 0 {
        eprintln!(
            "WARNING: skipped {} malformed row(s) in {}",
            loaded.skipped_rows,
            path.display()
        );
    }
    println!("Loaded {} signals.", loaded.signals.len());
    Ok(loaded.signals)
}

fn print_report(config: &StrategyConfig, report: &TradeReport) {
    println!();
    println!("=== Backtest Result ===");
    println!("Run id:         {}", config.run_id());
    println!(
        "Config:         {}x leverage, {}% stop, concurrency {}",
        config.leverage, config.stop_loss_pct, config.concurrency_limit
    );
    println!(
        "Balance:        {:.2} → {:.2} ({:+.2}%)",
        report.initial_balance, report.final_balance, report.roi_pct
    );
    println!(
        "Trades:         {} ({} wins / {} losses)",
        report.trade_count, report.wins, report.losses
    );
    println!("Win rate:       {:.1}%", report.win_rate * 100.0);
    println!(
        "Exits:          TP {:.1}% / SL {:.1}% / TTL {:.1}%",
        report.exits.tp_pct(),
        report.exits.sl_pct(),
        report.exits.ttl_pct()
    );
    println!("Total fees:     {:.2}", report.total_fees);
    println!("Max drawdown:   {:.1}%", report.max_drawdown * 100.0);
    println!("Profit factor:  {:.2}", report.profit_factor);
    println!("Skipped:        {} signal(s)", report.skips.total());
    if report.liquidated {
        println!();
        println!("WARNING: account liquidated before the end of the log");
    }
    println!();
}

fn print_leaderboard(result: &SweepResult, top_n: usize) {
    println!();
    println!("=== Leaderboard (top {top_n}) ===");
    println!(
        "{:<5} {:<6} {:<8} {:<12} {:<6} {:>14} {:>9}",
        "Rank", "Lev", "Stop%", "Policy", "Conc", "Final Balance", "Win Rate"
    );
    println!("{}", "-".repeat(70));
    for (rank, entry) in result.leaderboard.top(top_n).iter().enumerate() {
        if !entry.is_completed() {
            println!("{:<5} (failed) {}", rank + 1, entry.run_id);
            continue;
        }
        println!(
            "{:<5} {:<6} {:<8} {:<12} {:<6} {:>14.2} {:>8.1}%",
            rank + 1,
            entry.config.leverage,
            entry.config.stop_loss_pct,
            format!("{:?}", entry.config.target_policy),
            entry.config.concurrency_limit,
            entry.final_balance(),
            entry.win_rate() * 100.0
        );
    }
    println!();
    println!(
        "Evaluated {}/{} in {:.1}s{}{}",
        result.evaluated,
        result.total,
        result.elapsed.as_secs_f64(),
        if result.timed_out { " (timed out)" } else { "" },
        if result.cancelled { " (cancelled)" } else { "" },
    );
}
