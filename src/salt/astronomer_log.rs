use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const BLOCK_DELIMITER: &str = "======";
pub const DEFAULT_MODE: &str = "MR";

/// Per-target details pulled from one block of the astronomer's night log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub gaia_id: String,
    pub block_id: Option<String>,
    pub conditions: Option<String>,
    pub mode: Option<String>,
    pub exposure: Option<i64>,
    pub seeing: Option<String>,
}

/// Log targets keyed by full Gaia DR3 id, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTargets {
    entries: Vec<LogTarget>,
    index: HashMap<String, usize>,
}

impl LogTargets {
    pub fn insert(&mut self, target: LogTarget) {
        match self.index.get(&target.gaia_id) {
            Some(&pos) => self.entries[pos] = target,
            None => {
                self.index.insert(target.gaia_id.clone(), self.entries.len());
                self.entries.push(target);
            }
        }
    }

    pub fn get(&self, gaia_id: &str) -> Option<&LogTarget> {
        self.index.get(gaia_id).map(|&pos| &self.entries[pos])
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogTarget> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<LogTarget> for LogTargets {
    fn from_iter<I: IntoIterator<Item = LogTarget>>(iter: I) -> Self {
        let mut out = LogTargets::default();
        for target in iter {
            out.insert(target);
        }
        out
    }
}

fn block_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Block ID:\s*(\d+)").expect("valid block id pattern"))
}

fn gaia_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Gaia DR3\s+(\d+)").expect("valid gaia pattern"))
}

fn guider_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Guider:\s*~?([\d.]+)"?"#).expect("valid guider pattern"))
}

fn exposure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"H/R\d+:\s*(\d+)\s*(MR|LR|HR)?").expect("valid exposure pattern")
    })
}

/// Split the log on `======` and keep every non-aborted block that names a
/// Gaia DR3 target. A later block for the same target replaces the earlier one.
pub fn parse_astronomer_log(content: &str) -> LogTargets {
    content
        .split(BLOCK_DELIMITER)
        .filter_map(parse_block)
        .collect()
}

#[derive(Debug, Default)]
struct BlockScan {
    gaia_id: Option<String>,
    block_id: Option<String>,
    conditions: Vec<String>,
    mode: Option<String>,
    exposure: Option<i64>,
    seeing: Option<String>,
    aborted: bool,
}

fn parse_block(block: &str) -> Option<LogTarget> {
    let mut scan = BlockScan::default();
    for raw in block.trim().lines() {
        let line = raw.trim();

        if let Some(id) = capture(block_id_re(), line) {
            scan.block_id = Some(id.to_string());
        }
        if let Some(id) = capture(gaia_re(), line) {
            scan.gaia_id = Some(id.to_string());
        }
        if line.to_lowercase().contains("cloud") {
            scan.conditions
                .push(line.trim_matches(|c: char| c == '*' || c == ' ').to_string());
        }
        if let Some(value) = capture(guider_re(), line) {
            scan.seeing = Some(value.to_string());
        }
        if let Some(caps) = exposure_re().captures(line) {
            scan.exposure = caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok());
            scan.mode = Some(
                caps.get(2)
                    .map_or(DEFAULT_MODE, |m| m.as_str())
                    .to_string(),
            );
        }
        if line.contains("Aborting") || line.to_lowercase().contains("abort") {
            scan.aborted = true;
        }
    }

    if scan.aborted {
        return None;
    }
    let gaia_id = scan.gaia_id?;
    let conditions = if scan.conditions.is_empty() {
        None
    } else {
        Some(scan.conditions.join("; "))
    };

    Some(LogTarget {
        gaia_id,
        block_id: scan.block_id,
        conditions,
        mode: scan.mode,
        exposure: scan.exposure,
        seeing: scan.seeing,
    })
}

fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Night log 2023-12-05
======
Block ID: 12345
* Target: Gaia DR3 987654321
* H/R1: 300 MR
* Guider: ~1.2\"
* Thin clouds early on
* Clouds cleared by end
======
Block ID: 12346
Target: Gaia DR3 111222333
H/R2: 1200
======
Block ID: 12347
Target: Gaia DR3 12345
H/R1: 600 HR
Aborting due to wind
======
Calibrations only, no target
";

    #[test]
    fn blocks_with_targets_are_extracted_in_order() {
        let got = parse_astronomer_log(LOG);
        let ids: Vec<&str> = got.iter().map(|t| t.gaia_id.as_str()).collect();
        assert_eq!(ids, vec!["987654321", "111222333"]);

        let first = got.get("987654321").expect("first");
        assert_eq!(first.block_id.as_deref(), Some("12345"));
        assert_eq!(first.exposure, Some(300));
        assert_eq!(first.mode.as_deref(), Some("MR"));
        assert_eq!(first.seeing.as_deref(), Some("1.2"));
        assert_eq!(
            first.conditions.as_deref(),
            Some("Thin clouds early on; Clouds cleared by end")
        );
    }

    #[test]
    fn missing_mode_defaults_to_medium_resolution() {
        let got = parse_astronomer_log(LOG);
        let second = got.get("111222333").expect("second");
        assert_eq!(second.exposure, Some(1200));
        assert_eq!(second.mode.as_deref(), Some(DEFAULT_MODE));
        assert_eq!(second.conditions, None);
        assert_eq!(second.seeing, None);
    }

    #[test]
    fn aborted_block_is_excluded_entirely() {
        let got = parse_astronomer_log(LOG);
        assert!(got.get("12345").is_none());

        let lower = "Gaia DR3 555\nobserver decided to abort after 2 frames";
        assert!(parse_astronomer_log(lower).is_empty());
    }

    #[test]
    fn later_block_for_same_target_wins() {
        let log = "Gaia DR3 42\nH/R1: 100 LR\n======\nGaia DR3 7\n======\nGaia DR3 42\nH/R1: 200 HR\n";
        let got = parse_astronomer_log(log);
        assert_eq!(got.len(), 2);
        let ids: Vec<&str> = got.iter().map(|t| t.gaia_id.as_str()).collect();
        assert_eq!(ids, vec!["42", "7"]);
        let target = got.get("42").expect("42");
        assert_eq!(target.exposure, Some(200));
        assert_eq!(target.mode.as_deref(), Some("HR"));
    }

    #[test]
    fn block_without_exposure_line_has_no_mode() {
        let got = parse_astronomer_log("Gaia DR3 99\nGuider: 0.9");
        let target = got.get("99").expect("99");
        assert_eq!(target.mode, None);
        assert_eq!(target.exposure, None);
        assert_eq!(target.seeing.as_deref(), Some("0.9"));
    }
}
