use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use tracing::{info, warn};

use crate::data::error::FetchError;
use crate::data::types::SnowpackBulletin;

pub const BLURB_MAX_CHARS: usize = 260;
const BLURB_START: &str = "Snowpack Summary";
const BLURB_END: &str = "Snow Basin Indices";

pub struct BulletinClient {
    client: Client,
    url: String,
}

impl BulletinClient {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the bulletin page and extract snowpack figures from it.
    pub async fn fetch(&self) -> Result<SnowpackBulletin, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: self.url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }

        let html = response.text().await.map_err(|source| FetchError::Http {
            url: self.url.clone(),
            source,
        })?;

        let bulletin = parse_bulletin(&html, &self.url);
        info!(
            "Snowpack bulletin: provincial={:?}% island={:?}% updated={:?}",
            bulletin.provincial_pct_median,
            bulletin.vancouver_island_pct_median,
            bulletin.updated_on
        );

        Ok(bulletin)
    }
}

/// Flatten the bulletin HTML and pull out the labelled figures.
/// Every field is optional; a redesigned page degrades to `None`s.
pub fn parse_bulletin(html: &str, source_url: &str) -> SnowpackBulletin {
    let text = html_to_text(html);

    let bulletin = SnowpackBulletin {
        source_url: source_url.to_string(),
        updated_on: extract_updated_on(&text),
        provincial_pct_median: extract_provincial_pct(&text),
        vancouver_island_pct_median: extract_island_pct(&text),
        blurb: extract_blurb(&text),
    };

    if bulletin.provincial_pct_median.is_none() && bulletin.vancouver_island_pct_median.is_none() {
        warn!("No snowpack percentages found in bulletin from {}", source_url);
    }

    bulletin
}

/// Drop scripts, styles and tags, decode common entities, collapse whitespace.
pub fn html_to_text(html: &str) -> String {
    let mut text = html.to_string();
    for pattern in [
        r"(?is)<script\b.*?</script\s*>",
        r"(?is)<style\b.*?</style\s*>",
        r"(?s)<!--.*?-->",
        r"(?s)<[^>]*>",
    ] {
        if let Ok(re) = Regex::new(pattern) {
            text = re.replace_all(&text, " ").into_owned();
        }
    }

    normalize_ws(&decode_entities(&text))
}

fn decode_entities(s: &str) -> String {
    let named = s
        .replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    let numeric = match Regex::new(r"&#(\d+);") {
        Ok(re) => re
            .replace_all(&named, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned(),
        Err(_) => named,
    };

    // Last, so "&amp;lt;" stays literal.
    numeric.replace("&amp;", "&")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_updated_on(text: &str) -> Option<NaiveDate> {
    let re = Regex::new(
        r"(?i)last\s+updated:?\s*(\d{4}-\d{2}-\d{2}|[A-Za-z]+\.?\s+\d{1,2},?\s+\d{4})",
    )
    .ok()?;
    let raw = re.captures(text)?.get(1)?.as_str();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let cleaned = normalize_ws(&raw.replace([',', '.'], " "));
    NaiveDate::parse_from_str(&cleaned, "%B %d %Y").ok()
}

fn extract_provincial_pct(text: &str) -> Option<f64> {
    first_percent(text, &[r"(?i)provincial\s+average[^%]{0,200}?(\d{1,3}(?:\.\d+)?)\s*%"])
}

/// "N% in Vancouver Island" first, then a figure after the label. Neither
/// form may cross a sentence end or another percentage.
fn extract_island_pct(text: &str) -> Option<f64> {
    first_percent(
        text,
        &[
            concat!(
                r"(?i)(\d{1,3}(?:\.\d+)?)\s*%[^%.]{0,40}?",
                r"\b(?:in|for|on)\s+(?:the\s+)?Vancouver\s+Island",
            ),
            r"(?i)Vancouver\s+Island[^%.]{0,40}?(\d{1,3}(?:\.\d+)?)\s*%",
        ],
    )
}

fn first_percent(text: &str, patterns: &[&str]) -> Option<f64> {
    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        re.captures(text)?.get(1)?.as_str().parse().ok()
    })
}

fn extract_blurb(text: &str) -> Option<String> {
    let start = text.find(BLURB_START)? + BLURB_START.len();
    let end = text[start..].find(BLURB_END).map(|i| start + i)?;
    let excerpt = text[start..end].trim();

    if excerpt.is_empty() {
        return None;
    }
    Some(truncate_with_ellipsis(excerpt, BLURB_MAX_CHARS))
}

/// At most `max_chars` characters, the last being `…` when cut.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
