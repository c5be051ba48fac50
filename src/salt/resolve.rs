use crate::salt::astronomer_log::LogTargets;
use crate::salt::obs_sequence::ObservationRecord;

pub const DEFAULT_EXPOSURE_TOLERANCE_SECS: f64 = 5.0;

/// How an observation-table row was linked to a log target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The truncated table id is a prefix of the full log id.
    Prefix(String),
    /// No prefix match; the first log target with a near-identical exposure.
    /// Lower confidence: two targets with similar exposures in one night can
    /// be confused.
    ExposureFallback(String),
    Unresolved,
}

impl Resolution {
    pub fn gaia_id(&self) -> Option<&str> {
        match self {
            Self::Prefix(id) | Self::ExposureFallback(id) => Some(id),
            Self::Unresolved => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Prefix(_) => "prefix",
            Self::ExposureFallback(_) => "exposure-fallback",
            Self::Unresolved => "unresolved",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::ExposureFallback(_))
    }
}

/// Link a table row to a full Gaia id from the astronomer's log.
///
/// Candidates are tried in log order and the first hit wins. A missing partial
/// id behaves like an empty prefix and so matches the first log target.
pub fn resolve_gaia_id(
    record: &ObservationRecord,
    log_targets: &LogTargets,
    tolerance_secs: f64,
) -> Resolution {
    let partial = record.gaia_partial.as_deref().unwrap_or("");
    if let Some(target) = log_targets.iter().find(|t| t.gaia_id.starts_with(partial)) {
        return Resolution::Prefix(target.gaia_id.clone());
    }

    let Some(obs_exposure) = record.exposure.filter(|e| *e != 0.0) else {
        return Resolution::Unresolved;
    };
    log_targets
        .iter()
        .find(|t| {
            t.exposure
                .filter(|e| *e != 0)
                .is_some_and(|e| (obs_exposure - e as f64).abs() < tolerance_secs)
        })
        .map_or(Resolution::Unresolved, |t| {
            Resolution::ExposureFallback(t.gaia_id.clone())
        })
}
