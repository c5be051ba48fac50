use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::commands::CommandReport;
use crate::error::NightSkip;
use crate::salt::audit;
use crate::salt::catalog::{self, Catalog};
use crate::salt::config::{ImportSettings, load_config};
use crate::salt::merge::{ImportMode, NightOutcome, import_night};
use crate::salt::night::{discover_nights, read_night};
use crate::salt::paths::{SaltPaths, resolve_paths};
use crate::salt::products::DirProductLocator;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub night: Option<String>,
    pub all: bool,
    pub dry_run: bool,
    pub data_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
}

fn process_night(
    catalog: &mut Catalog,
    night_dir: &Path,
    settings: &ImportSettings,
    mode: ImportMode,
) -> Result<NightOutcome> {
    let sources = read_night(night_dir)?;
    let locator = DirProductLocator::new(&sources.product_dir);
    import_night(catalog, &sources, &locator, settings, mode)
}

fn record_audit(paths: &SaltPaths, night: &str, status: &str, added: usize, message: &str) {
    if let Err(err) = audit::append_event(&paths.audit_log, night, status, added, message) {
        tracing::warn!(night = %night, error = %format!("{err:#}"), "audit append failed");
    }
}

pub fn run(opts: &ImportOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths(opts.data_dir.as_deref(), opts.catalog_path.as_deref());
    let mode = if opts.dry_run {
        ImportMode::Preview
    } else {
        ImportMode::Commit
    };
    let mut report = CommandReport::new("import");

    let mut catalog = catalog::load(&paths.catalog_path, &cfg.catalog)?;

    let nights: Vec<String> = if opts.all {
        let found = discover_nights(&paths.data_dir)?;
        report.detail(format!("Found {} observation nights", found.len()));
        found
    } else {
        match opts.night.as_deref() {
            Some(night) => vec![night.to_string()],
            None => {
                report.issue("no night selected; pass a night name or --all");
                return Ok(report);
            }
        }
    };

    let mut total_added = 0usize;
    for night in &nights {
        let night_dir = paths.data_dir.join(night);
        if !night_dir.exists() {
            let skip = NightSkip::DirectoryNotFound(night_dir.clone());
            tracing::warn!(night = %night, code = skip.code(), "{skip}");
            report.detail(format!("Skipping {night}: {skip}"));
            continue;
        }

        report.detail(format!("Processing {night}..."));
        match process_night(&mut catalog, &night_dir, &cfg.import, mode) {
            Ok(outcome) => {
                for line in &outcome.lines {
                    report.detail(format!("  {line}"));
                }
                total_added += outcome.added;
                if mode == ImportMode::Commit {
                    record_audit(
                        &paths,
                        &outcome.night,
                        "imported",
                        outcome.added,
                        &format!(
                            "new_targets={} fallback_matches={}",
                            outcome.new_targets, outcome.fallback_matches
                        ),
                    );
                }
            }
            Err(err) => match err.downcast_ref::<NightSkip>() {
                Some(skip) => {
                    tracing::warn!(night = %night, code = skip.code(), "{skip}");
                    report.detail(format!("  Skipping {night}: {skip}"));
                    if mode == ImportMode::Commit {
                        record_audit(&paths, night, "skipped", 0, skip.code());
                    }
                }
                None => {
                    tracing::warn!(night = %night, error = %format!("{err:#}"), "night failed");
                    report.issue(format!("{night}: {err:#}"));
                }
            },
        }
    }

    match mode {
        ImportMode::Commit => {
            catalog::save(&paths.catalog_path, &mut catalog)?;
            report.detail(format!(
                "Catalog saved to {}",
                paths.catalog_path.display()
            ));
            report.detail(format!(
                "Total: {total_added} observations from {} unique targets",
                catalog.targets.len()
            ));
        }
        ImportMode::Preview => {
            report.detail("Dry run: catalog not written".to_string());
            report.detail(format!(
                "Total: {total_added} observations (would add) from {} unique targets",
                catalog.targets.len()
            ));
        }
    }

    Ok(report)
}
