//! Read-only reporting over the balance ledger: the `history` and `summary`
//! subcommands. Pure queries, no writes.

use anyhow::Context;

use crate::config::app_config::AppConfig;
use crate::ledger::Ledger;

#[derive(Debug, PartialEq)]
pub struct HistoryArgs {
    pub account: Option<String>,
    pub days: i64,
    pub db_path: Option<String>,
}

/// Hand-rolled flag parsing: `--account/-a <note>`, `--days/-d <n>`,
/// `--db <path>`.
pub fn parse_history_args(args: &[String]) -> anyhow::Result<HistoryArgs> {
    let mut parsed = HistoryArgs {
        account: None,
        days: 7,
        db_path: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--account" | "-a" => {
                parsed.account = Some(
                    iter.next()
                        .context("--account requires a value")?
                        .clone(),
                );
            }
            "--days" | "-d" => {
                parsed.days = iter
                    .next()
                    .context("--days requires a value")?
                    .parse()
                    .context("--days must be a number")?;
            }
            "--db" => {
                parsed.db_path = Some(iter.next().context("--db requires a value")?.clone());
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(parsed)
}

pub async fn print_history(args: &[String]) -> anyhow::Result<()> {
    let args = parse_history_args(args)?;
    let ledger = open_ledger(args.db_path.as_deref()).await?;

    let records = ledger
        .history(args.account.as_deref(), args.days)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    if records.is_empty() {
        println!("no records found");
        return Ok(());
    }

    let suffix = args
        .account
        .as_deref()
        .map(|note| format!(" - {note}"))
        .unwrap_or_default();
    println!("\n📈 Balance trend{suffix}");
    println!("{}", "=".repeat(60));

    for record in &records {
        println!(
            "{} | ${:>10.2} USD | [{}] {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.total_usdt,
            record.account_type,
            record.account_note
        );
    }
    println!("\n{} record(s)", records.len());

    Ok(())
}

pub async fn print_summary(args: &[String]) -> anyhow::Result<()> {
    let args = parse_history_args(args)?;
    let ledger = open_ledger(args.db_path.as_deref()).await?;

    let summaries = ledger
        .summaries()
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    if summaries.is_empty() {
        println!("no records found");
        return Ok(());
    }

    println!("\n📊 Account summary");
    println!("{}", "=".repeat(95));
    println!(
        "{:<10} {:<20} {:>7} {:>12} {:>12} {:>12}  {}",
        "type", "account", "records", "avg", "min", "max", "last update"
    );
    println!("{}", "-".repeat(95));

    for summary in &summaries {
        println!(
            "{:<10} {:<20} {:>7} {:>12} {:>12} {:>12}  {}",
            summary.account_type,
            summary.account_note,
            summary.record_count,
            format!("${:.2}", summary.avg_usdt),
            format!("${:.2}", summary.min_usdt),
            format!("${:.2}", summary.max_usdt),
            summary.last_record.format("%m-%d %H:%M")
        );
    }

    Ok(())
}

async fn open_ledger(db_path: Option<&str>) -> anyhow::Result<Ledger> {
    let path = match db_path {
        Some(path) => path.to_string(),
        // Fall back to the configured path, then the stock filename.
        None => AppConfig::load()
            .map(|config| config.database.path)
            .unwrap_or_else(|_| "balance_history.db".to_string()),
    };

    Ledger::open(&path)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_apply_without_flags() {
        let parsed = parse_history_args(&[]).unwrap();
        assert_eq!(
            parsed,
            HistoryArgs {
                account: None,
                days: 7,
                db_path: None,
            }
        );
    }

    #[test]
    fn flags_are_recognized_in_both_forms() {
        let parsed =
            parse_history_args(&args(&["-a", "main", "--days", "30", "--db", "test.db"])).unwrap();
        assert_eq!(parsed.account.as_deref(), Some("main"));
        assert_eq!(parsed.days, 30);
        assert_eq!(parsed.db_path.as_deref(), Some("test.db"));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_history_args(&args(&["--frobnicate"])).is_err());
        assert!(parse_history_args(&args(&["--days", "soon"])).is_err());
    }
}
