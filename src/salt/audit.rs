use crate::salt::util::now_epoch_secs;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub night: String,
    pub status: String,
    pub added: usize,
    pub message: String,
}

pub fn append_event(
    log_path: &Path,
    night: &str,
    status: &str,
    added: usize,
    message: &str,
) -> Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        night: night.to_string(),
        status: status.to_string(),
        added,
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::append_event;
    use serde_json::Value;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn events_append_as_json_lines() {
        let tmp = tempdir().expect("tempdir");
        let log = tmp.path().join("logs/import_audit.log");
        append_event(&log, "231205", "imported", 2, "ok").expect("first");
        append_event(&log, "231206", "skipped", 0, "no doc").expect("second");

        let raw = fs::read_to_string(&log).expect("read");
        let lines: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["night"], "231205");
        assert_eq!(lines[0]["added"], 2);
        assert_eq!(lines[1]["status"], "skipped");
    }
}
