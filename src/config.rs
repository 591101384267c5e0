use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub resort: ResortConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub snowpack: SnowpackConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResortConfig {
    #[serde(default = "default_resort_name")]
    pub name: String,
    #[serde(default = "default_report_url")]
    pub report_url: String,
    #[serde(default = "default_lifts_snapshot")]
    pub lifts_snapshot_path: String,
    #[serde(default = "default_snow_snapshot")]
    pub snow_snapshot_path: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Used for "today" when the forecast response carries no offset.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_open_meteo_url")]
    pub base_url: String,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnowpackConfig {
    #[serde(default = "default_bulletin_url")]
    pub bulletin_url: String,
}

/// Thresholds for the decision engine and forecast aggregation.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionConfig {
    #[serde(default = "default_min_lift_ratio")]
    pub min_lift_ratio: f64,
    #[serde(default = "default_min_snow_7d")]
    pub min_snow_7d_cm: f64,
    #[serde(default = "default_min_base")]
    pub min_base_depth_cm: f64,
    #[serde(default = "default_rain_cutoff_hour")]
    pub rain_cutoff_hour: u32,
    #[serde(default = "default_snow_max_temp")]
    pub snow_max_temp_c: f64,
    #[serde(default = "default_dry_rain")]
    pub dry_rain_mm: f64,
    #[serde(default = "default_snowy_rain")]
    pub snowy_rain_mm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default)]
    pub csv_logging: bool,
    #[serde(default = "default_csv_log_path")]
    pub csv_log_path: String,
}

fn default_output_path() -> String { "site/data/latest.json".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_resort_name() -> String { "Mount Washington".to_string() }
fn default_report_url() -> String {
    "https://www.mountwashington.ca/weather/snow-report.html".to_string()
}
fn default_lifts_snapshot() -> String { "snapshots/lifts.txt".to_string() }
fn default_snow_snapshot() -> String { "snapshots/snow.txt".to_string() }
fn default_latitude() -> f64 { 49.7425 }
fn default_longitude() -> f64 { -125.2900 }
fn default_timezone() -> String { "America/Vancouver".to_string() }
fn default_utc_offset_hours() -> i32 { -8 }
fn default_open_meteo_url() -> String { "https://api.open-meteo.com/v1/forecast".to_string() }
fn default_horizon_days() -> usize { 7 }
fn default_bulletin_url() -> String {
    "https://www2.gov.bc.ca/gov/content/environment/air-land-water/water/drought-flooding-dikes-dams/river-forecast-centre/snow-survey-water-supply-bulletin".to_string()
}
fn default_min_lift_ratio() -> f64 { 0.67 }
fn default_min_snow_7d() -> f64 { 10.0 }
fn default_min_base() -> f64 { 80.0 }
fn default_rain_cutoff_hour() -> u32 { 15 }
fn default_snow_max_temp() -> f64 { 1.0 }
fn default_dry_rain() -> f64 { 2.0 }
fn default_snowy_rain() -> f64 { 5.0 }
fn default_csv_log_path() -> String { "site/data/history.csv".to_string() }

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ResortConfig {
    fn default() -> Self {
        Self {
            name: default_resort_name(),
            report_url: default_report_url(),
            lifts_snapshot_path: default_lifts_snapshot(),
            snow_snapshot_path: default_snow_snapshot(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            timezone: default_timezone(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_open_meteo_url(),
            horizon_days: default_horizon_days(),
        }
    }
}

impl Default for SnowpackConfig {
    fn default() -> Self {
        Self {
            bulletin_url: default_bulletin_url(),
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_lift_ratio: default_min_lift_ratio(),
            min_snow_7d_cm: default_min_snow_7d(),
            min_base_depth_cm: default_min_base(),
            rain_cutoff_hour: default_rain_cutoff_hour(),
            snow_max_temp_c: default_snow_max_temp(),
            dry_rain_mm: default_dry_rain(),
            snowy_rain_mm: default_snowy_rain(),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            csv_logging: false,
            csv_log_path: default_csv_log_path(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub config_path: String,
    pub output_path: Option<String>,
    pub open_meteo_url: Option<String>,
    pub bulletin_url: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!("No config file at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(path) = &env.output_path {
            self.system.output_path = path.clone();
        }
        if let Some(url) = &env.open_meteo_url {
            self.forecast.base_url = url.clone();
        }
        if let Some(url) = &env.bulletin_url {
            self.snowpack.bulletin_url = url.clone();
        }
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            config_path: std::env::var("SNOWDAY_CONFIG")
                .unwrap_or_else(|_| "config.toml".to_string()),
            output_path: non_empty_var("SNOWDAY_OUTPUT_PATH"),
            open_meteo_url: non_empty_var("OPEN_METEO_BASE_URL"),
            bulletin_url: non_empty_var("SNOWPACK_BULLETIN_URL"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
