use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures::future::{join, join3};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::data::bulletin::BulletinClient;
use crate::data::error::FetchError;
use crate::data::snapshot::{parse_lifts, parse_snow, read_snapshot};
use crate::data::types::{LiftStatus, SnowReport, SnowpackBulletin, Sourced};
use crate::data::weather::{ForecastPayload, WeatherClient};
use crate::output::types::{Artifact, CurrentConditions, ForecastSection, SourceLink};
use crate::strategies::daily::aggregate_days;
use crate::strategies::next_day::{DecisionInputs, NextDayStrategy};

/// Raw results of the external sources, each independently ok or failed.
#[derive(Debug)]
pub struct Acquired {
    pub lifts_text: Result<String, FetchError>,
    pub snow_text: Result<String, FetchError>,
    pub forecast: Result<ForecastPayload, FetchError>,
    pub bulletin: Result<SnowpackBulletin, FetchError>,
}

/// Read the snapshots and fetch forecast and bulletin concurrently.
/// Never fails as a whole; each failure stays in its own slot.
pub async fn acquire(config: &Config, http: Client) -> (Acquired, Vec<SourceLink>) {
    let weather = WeatherClient::new(http.clone(), &config.forecast, &config.resort);
    let bulletin_client = BulletinClient::new(http, config.snowpack.bulletin_url.clone());

    let report = join(
        read_snapshot(&config.resort.lifts_snapshot_path),
        read_snapshot(&config.resort.snow_snapshot_path),
    );
    let ((lifts_text, snow_text), forecast, bulletin) =
        join3(report, weather.fetch_hourly(), bulletin_client.fetch()).await;

    for (source, err) in [
        ("lifts snapshot", lifts_text.as_ref().err()),
        ("snow snapshot", snow_text.as_ref().err()),
        ("forecast", forecast.as_ref().err()),
        ("snowpack bulletin", bulletin.as_ref().err()),
    ] {
        if let Some(err) = err {
            warn!("Source {} unavailable: {}", source, err);
        }
    }

    let forecast_url = weather
        .request_url()
        .map(|u| u.to_string())
        .unwrap_or_else(|_| config.forecast.base_url.clone());
    let sources = vec![
        SourceLink::new("Snow report", config.resort.report_url.clone()),
        SourceLink::new("Forecast (Open-Meteo)", forecast_url),
        SourceLink::new("BC snowpack bulletin", bulletin_client.url()),
    ];

    (
        Acquired {
            lifts_text,
            snow_text,
            forecast,
            bulletin,
        },
        sources,
    )
}

/// Parse, aggregate and decide. Pure given `acquired` and `now`.
pub fn assemble(
    acquired: Acquired,
    sources: Vec<SourceLink>,
    config: &Config,
    now: DateTime<Utc>,
) -> Artifact {
    let offset = resort_offset(acquired.forecast.as_ref().ok(), config);
    let local_now = now.with_timezone(&offset);
    let today = local_now.date_naive();

    let mut errors = Vec::new();
    let lifts = match &acquired.lifts_text {
        Ok(text) => parse_lifts(text),
        Err(e) => {
            errors.push(e.to_string());
            LiftStatus::default()
        }
    };
    let snow = match &acquired.snow_text {
        Ok(text) => parse_snow(text),
        Err(e) => {
            errors.push(e.to_string());
            SnowReport::default()
        }
    };
    let current = CurrentConditions {
        lifts,
        snow,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    };

    let forecast = match acquired.forecast {
        Ok(payload) => ForecastSection {
            days: aggregate_days(
                &payload.hourly,
                today,
                config.forecast.horizon_days,
                &config.decision,
            ),
            exclude_before_3pm_rain: true,
            raw: Sourced::Ok(payload.raw),
        },
        Err(e) => ForecastSection {
            days: Vec::new(),
            exclude_before_3pm_rain: true,
            raw: Sourced::failed(e),
        },
    };
    info!("Forecast days: {}", forecast.days.len());

    let bc_snowpack: Sourced<SnowpackBulletin> = acquired.bulletin.into();

    let strategy = NextDayStrategy::new(config.decision.clone());
    let next = strategy.recommend(
        &DecisionInputs {
            lifts: &current.lifts,
            snow: &current.snow,
            days: &forecast.days,
            bulletin: bc_snowpack.as_ok(),
        },
        today,
    );

    Artifact {
        generated_at: now,
        generated_at_local: local_now,
        current,
        forecast,
        bc_snowpack,
        next,
        sources,
    }
}

/// Offset reported by the forecast, else the configured one, else UTC.
fn resort_offset(forecast: Option<&ForecastPayload>, config: &Config) -> FixedOffset {
    forecast
        .and_then(|f| f.utc_offset_seconds)
        .and_then(FixedOffset::east_opt)
        .or_else(|| FixedOffset::east_opt(config.resort.utc_offset_hours * 3600))
        .unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{HourlySeries, Rating};
    use chrono::{NaiveDate, TimeZone};

    const LIFTS_FIXTURE: &str = include_str!("../fixtures/lifts_snapshot.txt");
    const SNOW_FIXTURE: &str = include_str!("../fixtures/snow_snapshot.txt");
    const BULLETIN_FIXTURE: &str = include_str!("../fixtures/bulletin.html");

    fn missing(path: &str) -> FetchError {
        FetchError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }
    }

    /// Two local days; the first rains in the morning, the second snows.
    fn forecast() -> ForecastPayload {
        let hourly = HourlySeries {
            time: vec![
                "2026-02-04T09:00".to_string(),
                "2026-02-04T16:00".to_string(),
                "2026-02-05T09:00".to_string(),
            ],
            rain: vec![Some(1.2), Some(0.0), Some(0.0)],
            snowfall: vec![Some(0.0), Some(0.0), Some(2.4)],
            temperature_2m: vec![Some(3.0), Some(2.0), Some(-2.0)],
        };
        ForecastPayload {
            hourly,
            utc_offset_seconds: Some(-8 * 3600),
            raw: serde_json::json!({ "hourly": {} }),
        }
    }

    fn bulletin() -> SnowpackBulletin {
        crate::data::bulletin::parse_bulletin(BULLETIN_FIXTURE, "https://example.test/bulletin")
    }

    // 2026-02-04 06:00 at UTC-8
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 4, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_assemble_full_run() {
        let acquired = Acquired {
            lifts_text: Ok(LIFTS_FIXTURE.to_string()),
            snow_text: Ok(SNOW_FIXTURE.to_string()),
            forecast: Ok(forecast()),
            bulletin: Ok(bulletin()),
        };
        let artifact = assemble(acquired, Vec::new(), &Config::default(), now());

        assert_eq!(artifact.current.lifts.open, Some(4));
        assert_eq!(artifact.forecast.days.len(), 2);
        assert_eq!(artifact.forecast.days[0].date, NaiveDate::from_ymd_opt(2026, 2, 4).unwrap());
        assert!(artifact.forecast.days[0].rain_before_3pm);
        assert_eq!(artifact.next.confidence, Rating::Meh);
        assert!(artifact.next.label.contains("2026-02-05"));
        assert_eq!(artifact.generated_at_local.to_rfc3339(), "2026-02-04T06:00:00-08:00");
    }

    #[test]
    fn test_assemble_with_every_source_failed() {
        let acquired = Acquired {
            lifts_text: Err(missing("snapshots/lifts.txt")),
            snow_text: Err(missing("snapshots/snow.txt")),
            forecast: Err(FetchError::Status {
                status: 503,
                url: "https://api.test".to_string(),
            }),
            bulletin: Err(FetchError::Status {
                status: 404,
                url: "https://bulletin.test".to_string(),
            }),
        };
        let artifact = assemble(acquired, Vec::new(), &Config::default(), now());

        let error = artifact.current.error.as_deref().unwrap();
        assert!(error.contains("snapshots/lifts.txt"));
        assert!(error.contains("snapshots/snow.txt"));
        assert!(artifact.forecast.days.is_empty());
        assert!(artifact.bc_snowpack.as_ok().is_none());
        assert!(artifact
            .next
            .reasons
            .iter()
            .any(|r| r.contains("No acceptable day found")));

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["forecast"]["raw"]["error"], "HTTP 503 from https://api.test");
        assert_eq!(json["bcSnowpack"]["error"], "HTTP 404 from https://bulletin.test");
    }

    #[test]
    fn test_today_follows_resort_offset() {
        // 05:00 UTC on the 5th is still the 4th in Vancouver.
        let early = Utc.with_ymd_and_hms(2026, 2, 5, 5, 0, 0).unwrap();
        let acquired = Acquired {
            lifts_text: Ok(String::new()),
            snow_text: Ok(String::new()),
            forecast: Ok(forecast()),
            bulletin: Ok(bulletin()),
        };
        let artifact = assemble(acquired, Vec::new(), &Config::default(), early);

        assert_eq!(artifact.forecast.days[0].label, "Today");
        assert_eq!(artifact.forecast.days[0].date, NaiveDate::from_ymd_opt(2026, 2, 4).unwrap());
    }

    #[test]
    fn test_offset_falls_back_to_config() {
        let config = Config::default();

        assert_eq!(resort_offset(None, &config).local_minus_utc(), -8 * 3600);
    }
}
