use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CATALOG_PATH: &str = "salt-query-tool/index.json";

#[derive(Debug, Clone)]
pub struct SaltPaths {
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub audit_log: PathBuf,
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn audit_log_beside(catalog_path: &Path) -> PathBuf {
    catalog_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("import_audit.log")
}

/// Command-line values win over `SALT_*` env vars, which win over defaults.
pub fn resolve_paths(data_dir: Option<&Path>, catalog_path: Option<&Path>) -> SaltPaths {
    let data_dir = data_dir
        .map(Path::to_path_buf)
        .or_else(|| env_path("SALT_DATA_DIR"))
        .unwrap_or_else(|| PathBuf::from("."));
    let catalog_path = catalog_path
        .map(Path::to_path_buf)
        .or_else(|| env_path("SALT_CATALOG_PATH"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH));
    let audit_log = env_path("SALT_AUDIT_LOG").unwrap_or_else(|| audit_log_beside(&catalog_path));

    SaltPaths {
        data_dir,
        catalog_path,
        audit_log,
    }
}

#[cfg(test)]
mod tests {
    use super::audit_log_beside;
    use std::path::{Path, PathBuf};

    #[test]
    fn audit_log_sits_next_to_catalog() {
        assert_eq!(
            audit_log_beside(Path::new("salt-query-tool/index.json")),
            PathBuf::from("salt-query-tool/import_audit.log")
        );
        assert_eq!(
            audit_log_beside(Path::new("index.json")),
            PathBuf::from("import_audit.log")
        );
    }
}
