use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Qualitative rating shared by per-day stoke and recommendation confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Meh,
    Bad,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Good => write!(f, "good"),
            Rating::Meh => write!(f, "meh"),
            Rating::Bad => write!(f, "bad"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftStatus {
    pub open: Option<u32>,
    pub total: Option<u32>,
    pub closed: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowReport {
    pub snow_overnight_cm: Option<f64>,
    pub snow24_hours_cm: Option<f64>,
    pub snow48_hours_cm: Option<f64>,
    pub snow7_days_cm: Option<f64>,
    pub season_total_cm: Option<f64>,
    pub base_depth_cm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub label: String,
    pub rain_mm: f64,
    pub snowfall_cm: f64,
    #[serde(rename = "rainBefore3pm")]
    pub rain_before_3pm: bool,
    pub stoke: Rating,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowpackBulletin {
    pub source_url: String,
    pub updated_on: Option<NaiveDate>,
    pub provincial_pct_median: Option<f64>,
    pub vancouver_island_pct_median: Option<f64>,
    pub blurb: Option<String>,
}

/// Hourly samples as delivered by the forecast provider, parallel by index.
/// The provider reports gaps as `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub rain: Vec<Option<f64>>,
    #[serde(default)]
    pub snowfall: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
}

/// A source result slot: the parsed value, or the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sourced<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> Sourced<T> {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Sourced::Failed {
            error: error.to_string(),
        }
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            Sourced::Ok(value) => Some(value),
            Sourced::Failed { .. } => None,
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Sourced<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Sourced::Ok(value),
            Err(e) => Sourced::failed(e),
        }
    }
}
