use crate::error::NightSkip;
use crate::salt::obs_sequence::decode_latin1;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub const OBS_SEQUENCE_PREFIX: &str = "ObservationSequence";
pub const ASTRONOMER_LOG_PREFIX: &str = "AstronomersLogExtract";

pub fn is_night_name(name: &str) -> bool {
    name.len() == 6 && name.bytes().all(|b| b.is_ascii_digit())
}

/// Map a `YYMMDD` night name to its calendar date. Two-digit years below 50
/// land in the 2000s, the rest in the 1900s.
pub fn night_date(name: &str) -> Option<NaiveDate> {
    if !is_night_name(name) {
        return None;
    }
    let yy: i32 = name[0..2].parse().ok()?;
    let month: u32 = name[2..4].parse().ok()?;
    let day: u32 = name[4..6].parse().ok()?;
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Night directory names under `data_dir`, sorted.
pub fn discover_nights(data_dir: &Path) -> Result<Vec<String>> {
    let read_dir = fs::read_dir(data_dir)
        .with_context(|| format!("failed to read {}", data_dir.display()))?;

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_night_name(&name) {
            out.push(name);
        }
    }
    out.sort();
    Ok(out)
}

/// Source documents of one night download, already read into memory.
#[derive(Debug, Clone)]
pub struct NightSources {
    pub name: String,
    pub observation_sequence: String,
    pub astronomer_log: Option<String>,
    pub product_dir: PathBuf,
}

fn first_matching(dir: &Path, prefix: &str, ext: &str) -> Result<Option<PathBuf>> {
    let mut hits = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) && name.ends_with(ext) {
            hits.push(path);
        }
    }
    hits.sort();
    Ok(hits.into_iter().next())
}

/// Locate and read the documents of `night_dir`. Missing structure surfaces
/// as a [`NightSkip`] inside the error.
pub fn read_night(night_dir: &Path) -> Result<NightSources> {
    let name = night_dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    if !night_dir.is_dir() {
        return Err(NightSkip::DirectoryNotFound(night_dir.to_path_buf()).into());
    }
    let doc_dir = night_dir.join("doc");
    if !doc_dir.is_dir() {
        return Err(NightSkip::MissingDocDir.into());
    }

    let Some(seq_path) = first_matching(&doc_dir, OBS_SEQUENCE_PREFIX, ".html")? else {
        return Err(NightSkip::MissingObservationSequence.into());
    };
    let seq_bytes =
        fs::read(&seq_path).with_context(|| format!("failed to read {}", seq_path.display()))?;

    let astronomer_log = match first_matching(&doc_dir, ASTRONOMER_LOG_PREFIX, ".txt")? {
        Some(log_path) => {
            let bytes = fs::read(&log_path)
                .with_context(|| format!("failed to read {}", log_path.display()))?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        None => None,
    };

    Ok(NightSources {
        name,
        observation_sequence: decode_latin1(&seq_bytes),
        astronomer_log,
        product_dir: night_dir.join("product"),
    })
}
