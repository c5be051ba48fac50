/// Whether a sexagesimal value is an hour angle (right ascension) or a plain angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    RightAscension,
    Declination,
}

/// Convert `[±]D:MM:SS.s` to decimal degrees rounded to 6 fraction digits.
///
/// Right ascension is read as hours and scaled by 15. Anything that does not
/// split into three numeric components yields `None`; callers treat that as
/// missing data.
pub fn sexagesimal_to_degrees(raw: &str, axis: Axis) -> Option<f64> {
    let negative = raw.starts_with('-');
    let cleaned = raw.replace('+', "");
    let parts: Vec<&str> = cleaned.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let d = parts[0].trim().parse::<f64>().ok()?;
    let m = parts[1].trim().parse::<f64>().ok()?;
    let s = parts[2].trim().parse::<f64>().ok()?;

    let sign = if negative { -1.0 } else { 1.0 };
    let mut degrees = sign * (d.abs() + m / 60.0 + s / 3600.0);
    if axis == Axis::RightAscension {
        degrees *= 15.0;
    }
    if !degrees.is_finite() {
        return None;
    }

    Some(round6(degrees))
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
