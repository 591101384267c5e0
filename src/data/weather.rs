use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;

use crate::config::{ForecastConfig, ResortConfig};
use crate::data::error::FetchError;
use crate::data::types::HourlySeries;

/// Open-Meteo serves at most this many forecast days.
const MAX_FORECAST_DAYS: usize = 16;
const HOURLY_VARIABLES: &str = "rain,snowfall,temperature_2m";

pub struct WeatherClient {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
    timezone: String,
    forecast_days: usize,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    utc_offset_seconds: Option<i32>,
    hourly: HourlySeries,
}

/// Decoded hourly forecast plus the untouched response body.
#[derive(Debug, Clone)]
pub struct ForecastPayload {
    pub hourly: HourlySeries,
    pub utc_offset_seconds: Option<i32>,
    pub raw: serde_json::Value,
}

impl WeatherClient {
    pub fn new(client: Client, forecast: &ForecastConfig, resort: &ResortConfig) -> Self {
        Self {
            client,
            base_url: forecast.base_url.clone(),
            latitude: resort.latitude,
            longitude: resort.longitude,
            timezone: resort.timezone.clone(),
            forecast_days: forecast.horizon_days.clamp(1, MAX_FORECAST_DAYS),
        }
    }

    /// Full request URL, hourly times localized to the resort timezone.
    pub fn request_url(&self) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("latitude", self.latitude.to_string()),
                ("longitude", self.longitude.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("timezone", self.timezone.clone()),
                ("forecast_days", self.forecast_days.to_string()),
            ],
        )
        .map_err(|e| FetchError::Decode {
            url: self.base_url.clone(),
            message: e.to_string(),
        })
    }

    /// Fetch the hourly rain/snowfall/temperature forecast.
    pub async fn fetch_hourly(&self) -> Result<ForecastPayload, FetchError> {
        let url = self.request_url()?;
        let url_str = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url_str.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url_str,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url_str.clone(),
            source,
        })?;
        let payload = decode_body(&url_str, &body)?;

        info!(
            "Forecast: {} hourly samples, utc offset {:?}s",
            payload.hourly.time.len(),
            payload.utc_offset_seconds
        );

        Ok(payload)
    }
}

/// A body that is not JSON, or lacks the hourly block, is a decode failure.
fn decode_body(url: &str, body: &str) -> Result<ForecastPayload, FetchError> {
    let decode_error = |message: String| FetchError::Decode {
        url: url.to_string(),
        message,
    };
    let raw: serde_json::Value =
        serde_json::from_str(body).map_err(|e| decode_error(e.to_string()))?;

    decode_forecast(raw).map_err(decode_error)
}

/// Decode an Open-Meteo body, keeping the original JSON alongside.
pub fn decode_forecast(raw: serde_json::Value) -> Result<ForecastPayload, String> {
    let response: OpenMeteoResponse =
        serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;

    Ok(ForecastPayload {
        hourly: response.hourly,
        utc_offset_seconds: response.utc_offset_seconds,
        raw,
    })
}
