use anyhow::Result;
use chrono::Local;
use std::time::{SystemTime, UNIX_EPOCH};

/// Return the current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Local calendar date as `YYYY-MM-DD`.
pub fn today_iso() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Render an exposure the way operators read it in the night report.
pub fn format_exposure(exposure: Option<f64>) -> String {
    match exposure {
        Some(v) if v.fract() == 0.0 => format!("{v:.1}s"),
        Some(v) => format!("{v}s"),
        None => "unknown exposure".to_string(),
    }
}
