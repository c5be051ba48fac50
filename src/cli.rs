use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::commands::import::{self, ImportOptions};

#[derive(Debug, Parser)]
#[command(name = "salt-import")]
#[command(about = "Import SALT HRS night downloads into the query tool catalog")]
#[command(after_help = "Examples:
  salt-import 231205              Import a single night
  salt-import --all               Import all nights
  salt-import 231205 --dry-run    Preview without changes")]
struct Cli {
    /// Night directory name (e.g. 231205)
    #[arg(conflicts_with = "all")]
    night: Option<String>,

    /// Import every six-digit night directory under the data dir
    #[arg(long)]
    all: bool,

    /// Preview without writing the catalog
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Base directory containing night folders [env: SALT_DATA_DIR]
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to the catalog JSON [env: SALT_CATALOG_PATH]
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for line in &report.details {
        println!("{line}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.night.is_none() && !cli.all {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let report = import::run(&ImportOptions {
        night: cli.night,
        all: cli.all,
        dry_run: cli.dry_run,
        data_dir: cli.data_dir,
        catalog_path: cli.catalog,
    })?;
    print_report(&report, cli.json)?;

    if !report.ok {
        anyhow::bail!("{} failed with {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
