use crate::salt::resolve::DEFAULT_EXPOSURE_TOLERANCE_SECS;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDefaults {
    pub name: String,
    pub description: String,
    pub contact: String,
    pub storage_folder: String,
}

impl Default for CatalogDefaults {
    fn default() -> Self {
        Self {
            name: "Soares-Furtado Group SALT Observations".to_string(),
            description: "Spectroscopic observations from SALT HRS".to_string(),
            contact: "soares-furtado@wisc.edu".to_string(),
            storage_folder: "2023-2-SCI-018".to_string(),
        }
    }
}

/// Keys left out of the `[import]` table keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub program: String,
    pub instrument: String,
    pub exposure_tolerance_secs: f64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            program: "Sheffler UMa Survey".to_string(),
            instrument: "HRS".to_string(),
            exposure_tolerance_secs: DEFAULT_EXPOSURE_TOLERANCE_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SaltConfig {
    pub catalog: CatalogDefaults,
    pub import: ImportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialSaltConfig {
    catalog: Option<CatalogDefaults>,
    import: Option<ImportSettings>,
}

fn env_or_f64(var: &str, fallback: f64) -> f64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &SaltConfig) -> Result<()> {
    let tol = cfg.import.exposure_tolerance_secs;
    if !(tol.is_finite() && tol > 0.0) {
        return Err(anyhow!(
            "invalid exposure tolerance: require a finite value > 0 seconds"
        ));
    }
    if cfg.import.program.trim().is_empty() {
        return Err(anyhow!("invalid program label: cannot be empty"));
    }
    if cfg.import.instrument.trim().is_empty() {
        return Err(anyhow!("invalid instrument tag: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("SALT_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".salt-catalog").join("config.toml"))
}

fn merge_toml(base: &mut SaltConfig, raw: &str) -> Result<()> {
    let parsed: PartialSaltConfig = toml::from_str(raw)?;
    if let Some(catalog) = parsed.catalog {
        base.catalog = catalog;
    }
    if let Some(import) = parsed.import {
        base.import = import;
    }
    Ok(())
}

fn merge_file_config(base: &mut SaltConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse salt config {}: {err}", path.display()))
}

pub fn load_config() -> Result<SaltConfig> {
    let mut cfg = SaltConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.catalog.name = env_or_string("SALT_CATALOG_NAME", &cfg.catalog.name);
    cfg.catalog.contact = env_or_string("SALT_CATALOG_CONTACT", &cfg.catalog.contact);
    cfg.catalog.storage_folder = env_or_string("SALT_STORAGE_FOLDER", &cfg.catalog.storage_folder);
    cfg.import.program = env_or_string("SALT_PROGRAM", &cfg.import.program);
    cfg.import.instrument = env_or_string("SALT_INSTRUMENT", &cfg.import.instrument);
    cfg.import.exposure_tolerance_secs = env_or_f64(
        "SALT_EXPOSURE_TOLERANCE_SECS",
        cfg.import.exposure_tolerance_secs,
    );

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&SaltConfig::default()).is_ok());
    }

    #[test]
    fn toml_sections_replace_defaults() {
        let mut cfg = SaltConfig::default();
        merge_toml(
            &mut cfg,
            r#"
[import]
program = "Young Stars"
instrument = "HRS"
"#,
        )
        .expect("merge");
        assert_eq!(cfg.import.program, "Young Stars");
        assert_eq!(cfg.import.exposure_tolerance_secs, 5.0);
        assert_eq!(cfg.catalog, CatalogDefaults::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let mut cfg = SaltConfig::default();
        merge_toml(
            &mut cfg,
            r#"
[catalog]
contact = "ops@example.org"

[import]
exposure_tolerance_secs = 3
"#,
        )
        .expect("merge");
        assert_eq!(cfg.import.exposure_tolerance_secs, 3.0);
        assert_eq!(cfg.import.program, ImportSettings::default().program);
        assert_eq!(cfg.import.instrument, "HRS");
        assert_eq!(cfg.catalog.contact, "ops@example.org");
        assert_eq!(cfg.catalog.storage_folder, "2023-2-SCI-018");
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let mut cfg = SaltConfig::default();
        cfg.import.exposure_tolerance_secs = 0.0;
        assert!(validate(&cfg).is_err());
        cfg.import.exposure_tolerance_secs = f64::NAN;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn empty_program_is_rejected() {
        let mut cfg = SaltConfig::default();
        cfg.import.program = "  ".to_string();
        assert!(validate(&cfg).is_err());
    }
}
