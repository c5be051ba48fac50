use crate::salt::config::CatalogDefaults;
use crate::salt::util::today_iso;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub last_updated: String,
    pub contact: Option<String>,
    pub dropbox_folder: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Only `date` is required; hand-edited entries may null or omit the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    pub date: String,
    pub instrument: Option<String>,
    pub mode: Option<String>,
    pub exposure_time: Option<i64>,
    pub filename: Option<String>,
    #[serde(default)]
    pub all_files: Vec<String>,
    pub dropbox_path: Option<String>,
    pub snr: Option<f64>,
    pub seeing: Option<String>,
    pub conditions: Option<String>,
    pub block_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub gaia_dr3_id: String,
    pub common_name: Option<String>,
    pub ra_deg: Option<f64>,
    pub dec_deg: Option<f64>,
    pub g_mag: Option<f64>,
    pub program: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub observations: Vec<ObservationEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogEntry {
    pub fn new(gaia_dr3_id: &str, ra_deg: Option<f64>, dec_deg: Option<f64>, program: &str) -> Self {
        Self {
            gaia_dr3_id: gaia_dr3_id.to_string(),
            common_name: None,
            ra_deg,
            dec_deg,
            g_mag: None,
            program: Some(program.to_string()),
            notes: None,
            observations: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn has_observation_on(&self, date: &str) -> bool {
        self.observations.iter().any(|o| o.date == date)
    }

    /// Append unless an observation for the same date is already recorded.
    pub fn push_observation(&mut self, obs: ObservationEntry) -> bool {
        if self.has_observation_on(&obs.date) {
            return false;
        }
        self.observations.push(obs);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub catalog_info: CatalogInfo,
    #[serde(default)]
    pub targets: Vec<CatalogEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Catalog {
    pub fn new(defaults: &CatalogDefaults) -> Self {
        Self {
            catalog_info: CatalogInfo {
                name: Some(defaults.name.clone()),
                description: Some(defaults.description.clone()),
                last_updated: today_iso(),
                contact: Some(defaults.contact.clone()),
                dropbox_folder: Some(defaults.storage_folder.clone()),
                extra: Map::new(),
            },
            targets: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn target(&self, gaia_id: &str) -> Option<&CatalogEntry> {
        self.targets.iter().find(|t| t.gaia_dr3_id == gaia_id)
    }

    /// Return the entry for `gaia_id`, appending the one built by `create`
    /// when the id is new.
    pub fn upsert_target(
        &mut self,
        gaia_id: &str,
        create: impl FnOnce() -> CatalogEntry,
    ) -> &mut CatalogEntry {
        let pos = match self.targets.iter().position(|t| t.gaia_dr3_id == gaia_id) {
            Some(pos) => pos,
            None => {
                self.targets.push(create());
                self.targets.len() - 1
            }
        };
        &mut self.targets[pos]
    }
}

/// Load the catalog at `path`, or a fresh one when the file does not exist.
pub fn load(path: &Path, defaults: &CatalogDefaults) -> Result<Catalog> {
    if !path.exists() {
        return Ok(Catalog::new(defaults));
    }

    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: Catalog = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

/// Stamp `last_updated` and replace the catalog file in one rename.
pub fn save(path: &Path, catalog: &mut Catalog) -> Result<()> {
    catalog.catalog_info.last_updated = today_iso();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;

    let data = serde_json::to_string_pretty(catalog)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    tmp.write_all(format!("{data}\n").as_bytes())
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
