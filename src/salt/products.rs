use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

/// Priority order for the file that represents an observation in the catalog.
pub const PRIMARY_SUFFIXES: [&str; 3] = ["_uwm.fits", "_1wm.fits", ".fits"];

pub trait ProductLocator {
    /// Reduced-data file names that contain `file_fragment`.
    fn find(&self, file_fragment: &str) -> Result<Vec<String>>;
}

/// Looks up `*<fragment>*.fits` in one night's `product` directory.
#[derive(Debug, Clone)]
pub struct DirProductLocator {
    pub dir: PathBuf,
}

impl DirProductLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ProductLocator for DirProductLocator {
    fn find(&self, file_fragment: &str) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let read_dir = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read {}", self.dir.display()))?;
        for entry in read_dir {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.contains(file_fragment) && name.ends_with(".fits") {
                out.push(name);
            }
        }
        out.sort();
        Ok(out)
    }
}

/// Product files for a blue-arm frame and its red-arm twin, sorted and unique.
pub fn paired_products(locator: &dyn ProductLocator, blue_file_id: &str) -> Result<Vec<String>> {
    let mut files: BTreeSet<String> = locator.find(blue_file_id)?.into_iter().collect();
    if let Some(digits) = blue_file_id.get(1..) {
        files.extend(locator.find(&format!("R{digits}"))?);
    }
    Ok(files.into_iter().collect())
}

/// Prefer merged blue-arm products (`H20...`) by suffix priority, else the
/// first file in name order.
pub fn select_primary(files: &[String]) -> Option<&str> {
    PRIMARY_SUFFIXES
        .iter()
        .find_map(|suffix| {
            files
                .iter()
                .find(|f| f.ends_with(suffix) && f.contains("H20"))
        })
        .or_else(|| files.first())
        .map(String::as_str)
}

pub fn product_location(night_name: &str) -> String {
    format!("{night_name}/product")
}
