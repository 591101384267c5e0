use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::data::types::{ForecastDay, LiftStatus, SnowReport, SnowpackBulletin, Sourced};
use crate::strategies::types::Recommendation;

/// The JSON document handed to the renderer. Key names are a stable contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub generated_at: DateTime<Utc>,
    pub generated_at_local: DateTime<FixedOffset>,
    pub current: CurrentConditions,
    pub forecast: ForecastSection,
    pub bc_snowpack: Sourced<SnowpackBulletin>,
    pub next: Recommendation,
    pub sources: Vec<SourceLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub lifts: LiftStatus,
    pub snow: SnowReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastSection {
    pub days: Vec<ForecastDay>,
    #[serde(rename = "excludeBefore3pmRain")]
    pub exclude_before_3pm_rain: bool,
    pub raw: Sourced<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLink {
    pub label: String,
    pub url: String,
}

impl SourceLink {
    pub fn new(label: &str, url: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            url: url.into(),
        }
    }
}
