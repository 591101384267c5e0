use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::collections::BTreeMap;
use tracing::warn;

use crate::config::DecisionConfig;
use crate::data::types::{ForecastDay, HourlySeries, Rating};

const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Default)]
struct DayTotals {
    rain_mm: f64,
    snowfall_cm: f64,
    rain_before_cutoff: bool,
}

/// Bucket local hourly samples into per-day records, starting at `today`.
///
/// A sample counts as snow (not rain) when it is at or below
/// `snow_max_temp_c` and reports snowfall. Rain in any other sample before
/// `rain_cutoff_hour` marks the day as excluded. Days without samples are
/// not emitted.
pub fn aggregate_days(
    hourly: &HourlySeries,
    today: NaiveDate,
    horizon_days: usize,
    rules: &DecisionConfig,
) -> Vec<ForecastDay> {
    let samples = hourly.time.len();
    if hourly.rain.len() != samples
        || hourly.snowfall.len() != samples
        || hourly.temperature_2m.len() != samples
    {
        warn!(
            "Hourly arrays misaligned (time={}, rain={}, snowfall={}, temp={}); \
             missing values treated as absent",
            samples,
            hourly.rain.len(),
            hourly.snowfall.len(),
            hourly.temperature_2m.len()
        );
    }

    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();

    for (i, stamp) in hourly.time.iter().enumerate() {
        let Ok(at) = NaiveDateTime::parse_from_str(stamp, HOURLY_TIME_FORMAT) else {
            warn!("Skipping unparseable forecast time {:?}", stamp);
            continue;
        };
        if at.date() < today {
            continue;
        }

        let rain = hourly.rain.get(i).copied().flatten().unwrap_or(0.0);
        let snowfall = hourly.snowfall.get(i).copied().flatten().unwrap_or(0.0);
        let temperature = hourly.temperature_2m.get(i).copied().flatten();

        let totals = days.entry(at.date()).or_default();
        totals.snowfall_cm += snowfall;

        if is_snow_hour(temperature, snowfall, rules.snow_max_temp_c) {
            continue;
        }
        totals.rain_mm += rain;
        if at.hour() < rules.rain_cutoff_hour && rain > 0.0 {
            totals.rain_before_cutoff = true;
        }
    }

    days.into_iter()
        .take(horizon_days)
        .enumerate()
        .map(|(index, (date, totals))| {
            let rain_mm = round1(totals.rain_mm);
            let snowfall_cm = round1(totals.snowfall_cm);
            ForecastDay {
                date,
                label: day_label(index, date),
                rain_mm,
                snowfall_cm,
                rain_before_3pm: totals.rain_before_cutoff,
                stoke: stoke_for(rain_mm, snowfall_cm, totals.rain_before_cutoff, rules),
            }
        })
        .collect()
}

/// Cold hours reporting snowfall are snow even when the rain channel is non-zero.
pub fn is_snow_hour(temperature_c: Option<f64>, snowfall_cm: f64, snow_max_temp_c: f64) -> bool {
    snowfall_cm > 0.0 && temperature_c.is_some_and(|t| t <= snow_max_temp_c)
}

/// Rain before the cutoff always wins, whatever the snowfall.
pub fn stoke_for(
    rain_mm: f64,
    snowfall_cm: f64,
    rain_before_cutoff: bool,
    rules: &DecisionConfig,
) -> Rating {
    if rain_before_cutoff {
        Rating::Bad
    } else if (snowfall_cm > 0.0 && rain_mm < rules.snowy_rain_mm) || rain_mm < rules.dry_rain_mm {
        Rating::Good
    } else {
        Rating::Meh
    }
}

fn day_label(index: usize, date: NaiveDate) -> String {
    if index == 0 {
        "Today".to_string()
    } else {
        date.format("%a, %b %-d").to_string()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
