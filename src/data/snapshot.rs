use regex::Regex;
use std::path::Path;
use tracing::warn;

use crate::data::error::FetchError;
use crate::data::types::{LiftStatus, SnowReport};

/// How far past a label we look for its value.
const WINDOW_CHARS: usize = 120;

const LIFTS_OPEN: &[&str] = &["Lifts Open", "Open Lifts"];
const LIFTS_CLOSED: &[&str] = &["Lifts Closed", "Closed Lifts"];
const LIFTS_TOTAL: &[&str] = &["Total Lifts", "Lifts Total"];

const SNOW_OVERNIGHT: &[&str] = &["Overnight", "New Snow"];
const SNOW_24H: &[&str] = &["24 Hours", "24 Hrs", "24hr"];
const SNOW_48H: &[&str] = &["48 Hours", "48 Hrs", "48hr"];
const SNOW_7D: &[&str] = &["7 Days", "7 Day", "Past Week"];
const SEASON_TOTAL: &[&str] = &["Season Total", "Season To Date"];
const BASE_DEPTH: &[&str] = &["Base Depth", "Alpine Base", "Base"];

pub async fn read_snapshot(path: impl AsRef<Path>) -> Result<String, FetchError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Extract lift counts. Each count is independent; missing labels give `None`.
pub fn parse_lifts(text: &str) -> LiftStatus {
    let stops: Vec<&str> = [LIFTS_CLOSED, LIFTS_TOTAL].concat();
    let (mut open, mut total) = LIFTS_OPEN
        .iter()
        .find_map(|label| {
            let window = window_after(text, label, &stops)?;
            open_of_total(window)
        })
        .unwrap_or((None, None));

    if open.is_none() {
        open = integer_after(text, LIFTS_OPEN, &stops);
    }
    if total.is_none() {
        total = integer_after(text, LIFTS_TOTAL, &[LIFTS_OPEN, LIFTS_CLOSED].concat());
    }
    let mut closed = integer_after(text, LIFTS_CLOSED, &[LIFTS_OPEN, LIFTS_TOTAL].concat());

    if let (Some(o), Some(t)) = (open, total) {
        if o > t {
            warn!("Discarding lift counts: {} open exceeds {} total", o, t);
            return LiftStatus::default();
        }
        if closed.is_none() {
            closed = Some(t - o);
        }
    }

    LiftStatus { open, total, closed }
}

/// Extract snow figures in centimetres.
pub fn parse_snow(text: &str) -> SnowReport {
    let fields: [&[&str]; 6] = [
        SNOW_OVERNIGHT,
        SNOW_24H,
        SNOW_48H,
        SNOW_7D,
        SEASON_TOTAL,
        BASE_DEPTH,
    ];
    let cm = |index: usize| {
        let stops: Vec<&str> = fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .flat_map(|(_, labels)| labels.iter().copied())
            .collect();
        centimetres_after(text, fields[index], &stops)
    };

    SnowReport {
        snow_overnight_cm: cm(0),
        snow24_hours_cm: cm(1),
        snow48_hours_cm: cm(2),
        snow7_days_cm: cm(3),
        season_total_cm: cm(4),
        base_depth_cm: cm(5),
    }
}

/// Text following the first case-insensitive match of `label`, cut at the next
/// stop label or after `WINDOW_CHARS` characters.
fn window_after<'a>(text: &'a str, label: &str, stops: &[&str]) -> Option<&'a str> {
    let found = label_regex(label)?.find(text)?;
    let rest = &text[found.end()..];

    let mut end = rest
        .char_indices()
        .nth(WINDOW_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    for stop in stops {
        if let Some(m) = label_regex(stop).and_then(|re| re.find(rest)) {
            end = end.min(m.start());
        }
    }

    Some(&rest[..end])
}

fn label_regex(label: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(label))).ok()
}

/// "4 of 6", "4 / 6", or a lone "4".
fn open_of_total(window: &str) -> Option<(Option<u32>, Option<u32>)> {
    let re = Regex::new(r"(?i)^\D*?(\d+)(?:\D{0,24}?(?:/|\bof\b)\D{0,24}?(\d+))?").ok()?;
    let caps = re.captures(window)?;
    let open = caps.get(1).and_then(|m| m.as_str().parse().ok());
    let total = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some((open, total))
}

fn integer_after(text: &str, labels: &[&str], stops: &[&str]) -> Option<u32> {
    let re = Regex::new(r"\d+").ok()?;
    labels.iter().find_map(|label| {
        let window = window_after(text, label, stops)?;
        re.find(window)?.as_str().parse().ok()
    })
}

fn centimetres_after(text: &str, labels: &[&str], stops: &[&str]) -> Option<f64> {
    let re = Regex::new(r#"(?i)(\d+(?:\.\d+)?)["\s]*cm\b"#).ok()?;
    labels.iter().find_map(|label| {
        let window = window_after(text, label, stops)?;
        re.captures(window)?.get(1)?.as_str().parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFTS_FIXTURE: &str = include_str!("../../fixtures/lifts_snapshot.txt");
    const SNOW_FIXTURE: &str = include_str!("../../fixtures/snow_snapshot.txt");

    #[test]
    fn test_parse_lifts_fixture() {
        let lifts = parse_lifts(LIFTS_FIXTURE);

        assert_eq!(lifts.open, Some(4));
        assert_eq!(lifts.total, Some(6));
        assert_eq!(lifts.closed, Some(2));
    }

    #[test]
    fn test_parse_snow_fixture() {
        let snow = parse_snow(SNOW_FIXTURE);

        assert_eq!(snow.snow_overnight_cm, Some(2.0));
        assert_eq!(snow.snow24_hours_cm, Some(5.0));
        assert_eq!(snow.snow48_hours_cm, Some(9.0));
        assert_eq!(snow.snow7_days_cm, Some(15.0));
        assert_eq!(snow.season_total_cm, Some(412.0));
        assert_eq!(snow.base_depth_cm, Some(150.0));
    }

    #[test]
    fn test_lifts_slash_format_derives_closed() {
        let lifts = parse_lifts("Lifts Open: 3 / 5");

        assert_eq!(lifts.open, Some(3));
        assert_eq!(lifts.total, Some(5));
        assert_eq!(lifts.closed, Some(2));
    }

    #[test]
    fn test_lifts_separate_total_label() {
        let lifts = parse_lifts("Lifts Open 2\nTotal Lifts 7");

        assert_eq!(lifts.open, Some(2));
        assert_eq!(lifts.total, Some(7));
        assert_eq!(lifts.closed, Some(5));
    }

    #[test]
    fn test_open_exceeding_total_is_discarded() {
        let lifts = parse_lifts("Lifts Open 9 of 6");

        assert_eq!(lifts, LiftStatus::default());
    }

    #[test]
    fn test_missing_value_does_not_borrow_next_field() {
        let text = "- text: Overnight\n- strong: -- cm\n- text: 24 Hours\n- strong: 5 cm";
        let snow = parse_snow(text);

        assert_eq!(snow.snow_overnight_cm, None);
        assert_eq!(snow.snow24_hours_cm, Some(5.0));
    }

    #[test]
    fn test_unrecognised_page_yields_nulls() {
        let snow = parse_snow("Page not found");
        let lifts = parse_lifts("Page not found");

        assert_eq!(snow, SnowReport::default());
        assert_eq!(lifts, LiftStatus::default());
    }

    #[test]
    fn test_decimal_values() {
        let snow = parse_snow("7 Days 12.5 cm Base Depth 201.4cm");

        assert_eq!(snow.snow7_days_cm, Some(12.5));
        assert_eq!(snow.base_depth_cm, Some(201.4));
    }
}
