use crate::salt::coords::{Axis, sexagesimal_to_degrees};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const CALIBRATION_MARKERS: [&str; 3] = ["BIAS", "ARC ", "FLAT"];

/// One science row from the observation-sequence table.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub file_id: String,
    pub gaia_partial: Option<String>,
    pub ra_deg: Option<f64>,
    pub dec_deg: Option<f64>,
    pub exposure: Option<f64>,
    pub proposal: Option<String>,
    pub pi: Option<String>,
    pub instrument: &'static str,
}

fn pre_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("valid pre pattern"))
}

fn file_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[HRSP]\d{12}$").expect("valid file id pattern"))
}

fn ra_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}:\d{2}:\d{2}\.\d").expect("valid ra pattern"))
}

fn dec_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d{2}:\d{2}:\d{2}").expect("valid dec pattern"))
}

fn proposal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d-[A-Z]+-\d+").expect("valid proposal pattern"))
}

/// Decode the observation-sequence page. The export is Latin-1, so every byte
/// maps straight to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Parse the `<pre>` table of an observation-sequence page.
///
/// Returns `None` when the page has no table. Rows keep the position of the
/// first occurrence of their file id; a later duplicate replaces the content.
pub fn parse_observation_sequence(html: &str) -> Option<Vec<ObservationRecord>> {
    let table = pre_block_re().captures(html)?.get(1)?.as_str();

    let mut out: Vec<ObservationRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for line in table.lines() {
        let Some(record) = parse_row(line) else {
            continue;
        };
        match index.get(&record.file_id) {
            Some(&pos) => out[pos] = record,
            None => {
                index.insert(record.file_id.clone(), out.len());
                out.push(record);
            }
        }
    }

    Some(out)
}

fn parse_row(line: &str) -> Option<ObservationRecord> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with("File") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let file_id = *tokens.first()?;
    if !file_id_re().is_match(file_id) {
        return None;
    }

    let upper = line.to_uppercase();
    if CALIBRATION_MARKERS.iter().any(|m| upper.contains(m)) {
        return None;
    }

    // Science frames come from the two HRS arms only.
    if !file_id.starts_with(['H', 'R']) {
        return None;
    }
    if !line.contains("Gaia DR3") {
        return None;
    }

    let (Some(ra), Some(dec)) = find_coordinates(&tokens) else {
        return None;
    };
    let (proposal, pi) = find_proposal(&tokens);

    Some(ObservationRecord {
        file_id: file_id.to_string(),
        gaia_partial: find_gaia_partial(&tokens).map(str::to_string),
        ra_deg: sexagesimal_to_degrees(ra, Axis::RightAscension),
        dec_deg: sexagesimal_to_degrees(dec, Axis::Declination),
        exposure: find_exposure(&tokens),
        proposal: proposal.map(str::to_string),
        pi: pi.map(str::to_string),
        instrument: "HRS",
    })
}

/// First `HH:MM:SS.s` token is the RA; the token right after it is the Dec
/// only when it looks like `±DD:MM:SS`.
pub fn find_coordinates<'a>(tokens: &[&'a str]) -> (Option<&'a str>, Option<&'a str>) {
    let Some(pos) = tokens.iter().position(|t| ra_re().is_match(t)) else {
        return (None, None);
    };
    let dec = tokens
        .get(pos + 1)
        .copied()
        .filter(|t| dec_re().is_match(t));
    (Some(tokens[pos]), dec)
}

/// Last decimal-looking token strictly between 1 and 10000 seconds.
pub fn find_exposure(tokens: &[&str]) -> Option<f64> {
    tokens
        .iter()
        .filter(|t| t.contains('.'))
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| *v > 1.0 && *v < 10_000.0)
        .last()
}

/// Proposal code such as `2023-2-SCI-018`, followed by the PI surname.
pub fn find_proposal<'a>(tokens: &[&'a str]) -> (Option<&'a str>, Option<&'a str>) {
    let Some(pos) = tokens.iter().position(|t| proposal_re().is_match(t)) else {
        return (None, None);
    };
    (Some(tokens[pos]), tokens.get(pos + 1).copied())
}

/// Token following the first `Gaia DR3` pair. The table truncates long ids,
/// so this is usually a prefix of the real identifier.
pub fn find_gaia_partial<'a>(tokens: &[&'a str]) -> Option<&'a str> {
    tokens
        .windows(3)
        .find(|w| w[0] == "Gaia" && w[1] == "DR3")
        .map(|w| w[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "H202312050012  10:00:00.0 +20:00:00  Gaia DR3 987  300.0  2023-2-SCI-018  Soares-Furtado  HRS  MR";

    fn page(rows: &[&str]) -> String {
        format!(
            "<html><body><h1>Sequence</h1>\n<PRE class=\"tbl\">\nFile           RA         Dec     Target\n---------------------------------\n{}\n</PRE></body></html>",
            rows.join("\n")
        )
    }

    #[test]
    fn science_row_is_extracted() {
        let got = parse_observation_sequence(&page(&[ROW])).expect("table");
        assert_eq!(got.len(), 1);
        let rec = &got[0];
        assert_eq!(rec.file_id, "H202312050012");
        assert_eq!(rec.gaia_partial.as_deref(), Some("987"));
        assert_eq!(rec.ra_deg, Some(150.0));
        assert_eq!(rec.dec_deg, Some(20.0));
        assert_eq!(rec.exposure, Some(300.0));
        assert_eq!(rec.proposal.as_deref(), Some("2023-2-SCI-018"));
        assert_eq!(rec.pi.as_deref(), Some("Soares-Furtado"));
        assert_eq!(rec.instrument, "HRS");
    }

    #[test]
    fn missing_table_is_none() {
        assert!(parse_observation_sequence("<html>no table</html>").is_none());
    }

    #[test]
    fn calibration_frames_never_appear() {
        let flat = "H202312050001  10:00:00.0 +20:00:00  Gaia DR3 111  1.5  FLAT";
        let arc = "R202312050002  ThAr ARC  Gaia DR3 222  30.0";
        let bias = "H202312050003  bias  Gaia DR3 333  0.0";
        let got = parse_observation_sequence(&page(&[flat, arc, bias, ROW])).expect("table");
        let ids: Vec<&str> = got.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, vec!["H202312050012"]);
    }

    #[test]
    fn other_instruments_and_untargeted_rows_are_dropped() {
        let salticam = "S202312050004  10:00:00.0 +20:00:00  Gaia DR3 444  20.0";
        let no_gaia = "H202312050005  10:00:00.0 +20:00:00  HD 1234  20.0";
        let short_id = "H2023120500  10:00:00.0 +20:00:00  Gaia DR3 555  20.0";
        let got =
            parse_observation_sequence(&page(&[salticam, no_gaia, short_id])).expect("table");
        assert!(got.is_empty());
    }

    #[test]
    fn duplicate_file_id_keeps_first_position_with_last_content() {
        let first = "H202312050012  10:00:00.0 +20:00:00  Gaia DR3 987  100.0";
        let other = "R202312050012  10:00:00.0 +20:00:00  Gaia DR3 987  300.0";
        let again = "H202312050012  10:00:00.0 +20:00:00  Gaia DR3 987  200.0";
        let got = parse_observation_sequence(&page(&[first, other, again])).expect("table");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].file_id, "H202312050012");
        assert_eq!(got[0].exposure, Some(200.0));
    }

    #[test]
    fn rows_missing_either_coordinate_are_dropped() {
        let none = "H202312050020  Gaia DR3 42  450.5";
        let ra_only = "H202312050021  10:00:00.0  Gaia DR3 42  450.5";
        let got = parse_observation_sequence(&page(&[none, ra_only, ROW])).expect("table");
        let ids: Vec<&str> = got.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, vec!["H202312050012"]);
    }

    #[test]
    fn exposure_prefers_last_plausible_decimal() {
        let tokens = ["H1", "0.5", "300.0", "1200", "12000.0", "900.5", "abc.d"];
        assert_eq!(find_exposure(&tokens), Some(900.5));
        assert_eq!(find_exposure(&["1.0", "10000.0"]), None);
    }

    #[test]
    fn declination_must_follow_right_ascension() {
        let tokens = ["H1", "10:00:00.0", "Gaia", "-20:00:00"];
        assert_eq!(find_coordinates(&tokens), (Some("10:00:00.0"), None));
        let tokens = ["H1", "10:00:00", "-20:00:00"];
        assert_eq!(find_coordinates(&tokens), (None, None));
    }

    #[test]
    fn proposal_without_pi_at_end_of_row() {
        assert_eq!(
            find_proposal(&["x", "2023-2-SCI-018"]),
            (Some("2023-2-SCI-018"), None)
        );
        assert_eq!(find_proposal(&["2023-SCI-018"]), (None, None));
    }

    #[test]
    fn gaia_partial_requires_trailing_token() {
        assert_eq!(find_gaia_partial(&["Gaia", "DR3", "12"]), Some("12"));
        assert_eq!(find_gaia_partial(&["Gaia", "DR3"]), None);
        assert_eq!(find_gaia_partial(&["Gaia", "DR2", "12"]), None);
    }

    #[test]
    fn latin1_bytes_decode_one_to_one() {
        assert_eq!(decode_latin1(&[0x48, 0xe9, 0x21]), "H\u{e9}!");
    }
}
