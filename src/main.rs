mod aggregator;
mod config;
mod domain;
mod exchange;
mod history;
mod ledger;
mod notify;
mod price;
mod report;
mod routines;
mod signing;
mod valuation;
mod wallet;

use std::env;
use std::time::Duration;

use env_logger::Env;

use crate::config::app_config::AppConfig;
use crate::routines::balance_check::BalanceCheckRoutine;
use crate::routines::routine::Routine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("run") => run_scheduler().await,
        Some("check") => run_once().await,
        Some("history") => history::print_history(&args[2..]).await,
        Some("summary") => history::print_summary(&args[2..]).await,
        Some(other) => {
            eprintln!("unknown command: {other}");
            eprintln!("usage: balance-monitor [run|check|history|summary]");
            std::process::exit(2);
        }
    }
}

/// Runs one pass immediately, then keeps checking on the configured cadence
/// until interrupted. A pass always completes before the next one starts.
async fn run_scheduler() -> anyhow::Result<()> {
    let routine = BalanceCheckRoutine;
    log::info!("balance monitor started");

    loop {
        if let Err(report) = routine.run().await {
            log::error!("{} failed: {report:?}", routine.name());
        }

        // Re-read the cadence each round so config edits apply to the very
        // next wait.
        let interval_hours = AppConfig::load()
            .map(|config| config.scheduler.interval_hours)
            .unwrap_or(6);
        log::info!("next check in {interval_hours}h");

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(interval_hours * 3600)) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

async fn run_once() -> anyhow::Result<()> {
    let routine = BalanceCheckRoutine;
    routine
        .run()
        .await
        .map_err(|report| anyhow::anyhow!("{} failed: {report:?}", routine.name()))
}
