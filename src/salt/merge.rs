use crate::error::NightSkip;
use crate::salt::astronomer_log::{LogTarget, LogTargets, parse_astronomer_log};
use crate::salt::catalog::{Catalog, CatalogEntry, ObservationEntry};
use crate::salt::config::ImportSettings;
use crate::salt::night::{NightSources, night_date};
use crate::salt::obs_sequence::{ObservationRecord, parse_observation_sequence};
use crate::salt::products::{ProductLocator, paired_products, product_location, select_primary};
use crate::salt::resolve::{Resolution, resolve_gaia_id};
use crate::salt::util::format_exposure;
use anyhow::Result;
use serde_json::Map;
use std::collections::HashSet;

/// Blue-arm frames are the canonical half of each paired HRS exposure.
pub const BLUE_ARM: char = 'H';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Commit,
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    NewTarget,
    NewObservation,
    AlreadyImported,
}

#[derive(Debug, Clone)]
pub struct PlannedObservation {
    pub file_id: String,
    pub resolution: Resolution,
    pub gaia_id: String,
    pub ra_deg: Option<f64>,
    pub dec_deg: Option<f64>,
    pub entry: ObservationEntry,
    pub disposition: Disposition,
}

/// Everything one night would contribute, computed without touching the
/// catalog.
#[derive(Debug, Clone)]
pub struct NightPlan {
    pub night: String,
    pub date: String,
    pub planned: Vec<PlannedObservation>,
    pub lines: Vec<String>,
}

impl NightPlan {
    pub fn additions(&self) -> usize {
        self.planned
            .iter()
            .filter(|p| p.disposition != Disposition::AlreadyImported)
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NightOutcome {
    pub night: String,
    pub added: usize,
    pub new_targets: usize,
    pub fallback_matches: usize,
    pub lines: Vec<String>,
}

pub fn mode_label(mode: &str) -> &str {
    match mode {
        "MR" => "Medium Resolution",
        "LR" => "Low Resolution",
        "HR" => "High Resolution",
        other => other,
    }
}

fn build_entry(
    night: &str,
    date: &str,
    record: &ObservationRecord,
    log: Option<&LogTarget>,
    files: Vec<String>,
    primary: Option<String>,
    settings: &ImportSettings,
) -> ObservationEntry {
    ObservationEntry {
        date: date.to_string(),
        instrument: Some(settings.instrument.clone()),
        mode: log
            .and_then(|l| l.mode.as_deref())
            .map(|m| mode_label(m).to_string()),
        exposure_time: record.exposure.map(|e| e.trunc() as i64),
        filename: primary,
        all_files: files,
        dropbox_path: Some(product_location(night)),
        snr: None,
        seeing: log.and_then(|l| l.seeing.clone()),
        conditions: log.and_then(|l| l.conditions.clone()),
        block_id: log.and_then(|l| l.block_id.clone()),
        extra: Map::new(),
    }
}

/// Resolve, dedupe, and locate products for one night's blue-arm frames.
///
/// Read-only over `catalog`: the plan records whether each observation is
/// new, so preview and commit report the same lines and counts.
pub fn plan_night(
    catalog: &Catalog,
    night: &str,
    records: &[ObservationRecord],
    log_targets: &LogTargets,
    locator: &dyn ProductLocator,
    settings: &ImportSettings,
) -> Result<NightPlan> {
    let Some(date) = night_date(night) else {
        return Err(NightSkip::UnrecognizedDate(night.to_string()).into());
    };
    let date = date.format("%Y-%m-%d").to_string();

    let mut plan = NightPlan {
        night: night.to_string(),
        date: date.clone(),
        planned: Vec::new(),
        lines: Vec::new(),
    };
    let mut processed: HashSet<String> = HashSet::new();

    for record in records.iter().filter(|r| r.file_id.starts_with(BLUE_ARM)) {
        let resolution =
            resolve_gaia_id(record, log_targets, settings.exposure_tolerance_secs);
        let Some(gaia_id) = resolution.gaia_id().map(str::to_string) else {
            tracing::debug!(night = %night, file_id = %record.file_id, "no log target for frame");
            continue;
        };
        if !processed.insert(gaia_id.clone()) {
            continue;
        }
        tracing::debug!(
            night = %night,
            file_id = %record.file_id,
            gaia_id = %gaia_id,
            matched_by = resolution.label(),
            proposal = ?record.proposal,
            pi = ?record.pi,
            instrument = record.instrument,
            "frame resolved"
        );

        let files = paired_products(locator, &record.file_id)?;
        if files.is_empty() {
            tracing::warn!(
                night = %night,
                file_id = %record.file_id,
                gaia_id = %gaia_id,
                "no product files"
            );
            plan.lines.push(format!("{gaia_id}: no product files found"));
            continue;
        }
        let primary = select_primary(&files).map(str::to_string);

        let mut line = format!(
            "Gaia DR3 {gaia_id}: {} files, {}",
            files.len(),
            format_exposure(record.exposure)
        );
        if resolution.is_fallback() {
            tracing::warn!(
                night = %night,
                file_id = %record.file_id,
                gaia_id = %gaia_id,
                "matched by exposure time only"
            );
            line.push_str(&format!(" (matched by {})", resolution.label()));
        }

        let disposition = match catalog.target(&gaia_id) {
            None => Disposition::NewTarget,
            Some(entry) if entry.has_observation_on(&date) => Disposition::AlreadyImported,
            Some(_) => Disposition::NewObservation,
        };
        if disposition == Disposition::AlreadyImported {
            line.push_str(" (already imported)");
        }
        plan.lines.push(line);

        let entry = build_entry(
            night,
            &date,
            record,
            log_targets.get(&gaia_id),
            files,
            primary,
            settings,
        );
        plan.planned.push(PlannedObservation {
            file_id: record.file_id.clone(),
            resolution,
            gaia_id,
            ra_deg: record.ra_deg,
            dec_deg: record.dec_deg,
            entry,
            disposition,
        });
    }

    Ok(plan)
}

/// Create missing targets and append observations for dates not yet
/// recorded. Returns the number of observations added.
pub fn apply_plan(catalog: &mut Catalog, plan: NightPlan, settings: &ImportSettings) -> usize {
    let mut added = 0usize;
    for item in plan.planned {
        let target = catalog.upsert_target(&item.gaia_id, || {
            CatalogEntry::new(&item.gaia_id, item.ra_deg, item.dec_deg, &settings.program)
        });
        if target.push_observation(item.entry) {
            tracing::debug!(
                night = %plan.night,
                date = %plan.date,
                file_id = %item.file_id,
                gaia_id = %item.gaia_id,
                "observation added"
            );
            added += 1;
        }
    }
    added
}

/// Parse one night's documents and merge them into `catalog`.
///
/// Missing structure is returned as a [`NightSkip`] error; in preview mode the
/// catalog is only read.
pub fn import_night(
    catalog: &mut Catalog,
    sources: &NightSources,
    locator: &dyn ProductLocator,
    settings: &ImportSettings,
    mode: ImportMode,
) -> Result<NightOutcome> {
    let mut lines = Vec::new();
    let records = match parse_observation_sequence(&sources.observation_sequence) {
        Some(records) => records,
        None => {
            tracing::warn!(night = %sources.name, "observation table not found");
            lines.push("Warning: Could not find observation table in HTML".to_string());
            Vec::new()
        }
    };

    let log_targets = sources
        .astronomer_log
        .as_deref()
        .map(parse_astronomer_log)
        .unwrap_or_default();
    if log_targets.is_empty() {
        return Err(NightSkip::NoLogTargets.into());
    }
    tracing::debug!(
        night = %sources.name,
        records = records.len(),
        log_targets = log_targets.len(),
        "parsed night documents"
    );

    let plan = plan_night(
        catalog,
        &sources.name,
        &records,
        &log_targets,
        locator,
        settings,
    )?;
    let fallback_matches = plan
        .planned
        .iter()
        .filter(|p| p.resolution.is_fallback())
        .count();
    let new_targets = plan
        .planned
        .iter()
        .filter(|p| p.disposition == Disposition::NewTarget)
        .count();
    lines.extend(plan.lines.iter().cloned());

    let added = match mode {
        ImportMode::Preview => plan.additions(),
        ImportMode::Commit => apply_plan(catalog, plan, settings),
    };

    Ok(NightOutcome {
        night: sources.name.clone(),
        added,
        new_targets,
        fallback_matches,
        lines,
    })
}
