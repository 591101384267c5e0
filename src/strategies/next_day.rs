use chrono::NaiveDate;
use tracing::info;

use crate::config::DecisionConfig;
use crate::data::types::{ForecastDay, LiftStatus, Rating, SnowReport, SnowpackBulletin};
use crate::strategies::seasonal::seasonal_fallback;
use crate::strategies::types::Recommendation;

pub const NO_ACCEPTABLE_DAY: &str = "No acceptable day found";

/// Lets exactly two thirds (0.6667) meet a 0.67 minimum, but not 0.665.
const LIFT_RATIO_SLACK: f64 = 0.004;

/// Everything the engine looks at. Any part may be missing or empty.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    pub lifts: &'a LiftStatus,
    pub snow: &'a SnowReport,
    pub days: &'a [ForecastDay],
    pub bulletin: Option<&'a SnowpackBulletin>,
}

pub struct NextDayStrategy {
    config: DecisionConfig,
}

impl NextDayStrategy {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// Pick the next rideable day. First match wins:
    /// 1. today, if not rained out and lifts plus snow or base are good
    /// 2. the first later forecast day without rain before the cutoff
    /// 3. the seasonal fallback
    ///
    /// Reasons are appended in the order each fact was considered.
    pub fn recommend(&self, inputs: &DecisionInputs<'_>, today: NaiveDate) -> Recommendation {
        let mut reasons = Vec::new();
        let cutoff = format_hour(self.config.rain_cutoff_hour);

        // 1. Current conditions
        let lift_ok = self.lift_ok(inputs.lifts);
        reasons.push(lift_reason(inputs.lifts));

        let snow_ok = inputs
            .snow
            .snow7_days_cm
            .is_some_and(|cm| cm >= self.config.min_snow_7d_cm);
        reasons.push(match inputs.snow.snow7_days_cm {
            Some(cm) => format!("7-day snowfall: {} cm", cm),
            None => "7-day snowfall unknown".to_string(),
        });

        let base_ok = inputs
            .snow
            .base_depth_cm
            .is_some_and(|cm| cm >= self.config.min_base_depth_cm);
        reasons.push(match inputs.snow.base_depth_cm {
            Some(cm) => format!("Base depth: {} cm", cm),
            None => "Base depth unknown".to_string(),
        });

        // 2. Today's rain exclusion, day 0 only
        let today_excluded = match inputs.days.first() {
            Some(day) if day.rain_before_3pm => {
                reasons.push(format!(
                    "Rain before {} today ({} mm); today excluded",
                    cutoff, day.rain_mm
                ));
                true
            }
            Some(_) => {
                reasons.push(format!("No rain before {} today", cutoff));
                false
            }
            None => {
                reasons.push("No forecast available; today not excluded".to_string());
                false
            }
        };

        // 3. Today
        if !today_excluded && lift_ok && (snow_ok || base_ok) {
            reasons.push("Enough lifts running on good snow or base".to_string());
            info!("Recommendation: today (lifts ok, snow_ok={}, base_ok={})", snow_ok, base_ok);
            return Recommendation::new("Today is rideable now", Rating::Good).with_reasons(reasons);
        }
        if !today_excluded {
            reasons.push(self.today_shortfall(lift_ok));
        }

        // 4. Next forecast day without rain before the cutoff
        if let Some(day) = inputs.days.iter().skip(1).find(|d| !d.rain_before_3pm) {
            reasons.push(format!(
                "{}: {} cm snow, {} mm rain, no rain before {} (stoke: {})",
                day.date, day.snowfall_cm, day.rain_mm, cutoff, day.stoke
            ));
            info!("Recommendation: {} ({})", day.label, day.date);
            return Recommendation::new(format!("{} ({})", day.label, day.date), Rating::Meh)
                .with_reasons(reasons);
        }

        // 5. Seasonal fallback
        reasons.push(if inputs.days.is_empty() {
            format!("{}: no forecast to scan", NO_ACCEPTABLE_DAY)
        } else {
            format!(
                "{} in the next {} forecast days",
                NO_ACCEPTABLE_DAY,
                inputs.days.len()
            )
        });
        let fallback = seasonal_fallback(today, inputs.bulletin);
        info!("Recommendation: seasonal fallback ({})", fallback.label);
        fallback.with_reasons(reasons)
    }

    /// Open/total at or above the minimum ratio, less a small slack for
    /// thresholds written to two decimals.
    pub fn lift_ok(&self, lifts: &LiftStatus) -> bool {
        match (lifts.open, lifts.total) {
            (Some(open), Some(total)) if total > 0 => {
                let ratio = f64::from(open) / f64::from(total);
                ratio >= self.config.min_lift_ratio - LIFT_RATIO_SLACK
            }
            _ => false,
        }
    }

    fn today_shortfall(&self, lift_ok: bool) -> String {
        if lift_ok {
            format!(
                "Today: under {} cm new snow in 7 days and base under {} cm",
                self.config.min_snow_7d_cm, self.config.min_base_depth_cm
            )
        } else {
            format!(
                "Today: fewer than {:.0}% of lifts confirmed open",
                self.config.min_lift_ratio * 100.0
            )
        }
    }
}

fn lift_reason(lifts: &LiftStatus) -> String {
    match (lifts.open, lifts.total) {
        (Some(open), Some(total)) if total > 0 => format!(
            "Lifts open: {}/{} ({:.0}%)",
            open,
            total,
            f64::from(open) / f64::from(total) * 100.0
        ),
        (Some(open), _) => format!("Lifts open: {} (total unknown)", open),
        _ => "Lift status unknown".to_string(),
    }
}

fn format_hour(hour: u32) -> String {
    match hour {
        0 => "12am".to_string(),
        1..=11 => format!("{}am", hour),
        12 => "12pm".to_string(),
        h => format!("{}pm", h - 12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(date: NaiveDate, label: &str, rain_before_3pm: bool) -> ForecastDay {
        ForecastDay {
            date,
            label: label.to_string(),
            rain_mm: if rain_before_3pm { 6.0 } else { 0.0 },
            snowfall_cm: if rain_before_3pm { 0.0 } else { 4.0 },
            rain_before_3pm,
            stoke: if rain_before_3pm { Rating::Bad } else { Rating::Good },
        }
    }

    fn lifts(open: u32, total: u32) -> LiftStatus {
        LiftStatus {
            open: Some(open),
            total: Some(total),
            closed: Some(total - open),
        }
    }

    fn good_snow() -> SnowReport {
        SnowReport {
            snow7_days_cm: Some(15.0),
            base_depth_cm: Some(150.0),
            ..Default::default()
        }
    }

    fn strategy() -> NextDayStrategy {
        NextDayStrategy::new(DecisionConfig::default())
    }

    const TODAY: (i32, u32, u32) = (2026, 2, 4);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_lift_ratio_boundaries() {
        let s = strategy();

        assert!(s.lift_ok(&lifts(2, 3)));
        assert!(s.lift_ok(&lifts(6, 6)));
        assert!(!s.lift_ok(&lifts(1, 2)));
        assert!(s.lift_ok(&lifts(134, 200)));
        assert!(!s.lift_ok(&lifts(133, 200)));
        assert!(!s.lift_ok(&lifts(0, 0)));
        assert!(!s.lift_ok(&LiftStatus { open: Some(5), total: None, closed: None }));
    }

    #[test]
    fn test_today_good() {
        let days = vec![day(today(), "Today", false)];
        let snow = good_snow();
        let lifts = lifts(6, 6);
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, today());

        assert_eq!(rec.confidence, Rating::Good);
        assert!(rec.label.contains("Today"));
        assert_eq!(rec.reasons[0], "Lifts open: 6/6 (100%)");
    }

    #[test]
    fn test_rain_today_moves_to_next_dry_day() {
        let days = vec![
            day(today(), "Today", true),
            day(date(2026, 2, 5), "Thu, Feb 5", false),
        ];
        let snow = good_snow();
        let lifts = lifts(6, 6);
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, today());

        assert_eq!(rec.confidence, Rating::Meh);
        assert!(rec.label.contains("2026-02-05"));
        assert!(rec.reasons.iter().any(|r| r.contains("today excluded")));
        assert!(rec.reasons.last().unwrap().contains("4 cm snow"));
    }

    #[test]
    fn test_all_days_rained_out_falls_back() {
        let days = vec![
            day(today(), "Today", true),
            day(date(2026, 2, 5), "Thu, Feb 5", true),
            day(date(2026, 2, 6), "Fri, Feb 6", true),
        ];
        let snow = good_snow();
        let lifts = lifts(6, 6);
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, today());

        assert!(rec.reasons.iter().any(|r| r.contains(NO_ACCEPTABLE_DAY)));
        assert_eq!(rec.label, "This week or next week");
        // Evidence from earlier steps stays in front.
        assert_eq!(rec.reasons[0], "Lifts open: 6/6 (100%)");
    }

    #[test]
    fn test_dry_today_with_few_lifts_scans_forward() {
        let days = vec![
            day(today(), "Today", false),
            day(date(2026, 2, 5), "Thu, Feb 5", true),
            day(date(2026, 2, 6), "Fri, Feb 6", false),
        ];
        let snow = good_snow();
        let lifts = lifts(1, 6);
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, today());

        assert_eq!(rec.confidence, Rating::Meh);
        assert_eq!(rec.label, "Fri, Feb 6 (2026-02-06)");
        assert!(rec.reasons.iter().any(|r| r.contains("fewer than 67% of lifts")));
    }

    #[test]
    fn test_no_inputs_at_all() {
        let lifts = LiftStatus::default();
        let snow = SnowReport::default();
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &[],
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, date(2026, 8, 1));

        assert_eq!(rec.confidence, Rating::Bad);
        assert!(rec.reasons.contains(&"Lift status unknown".to_string()));
        assert!(rec.reasons.contains(&"No forecast available; today not excluded".to_string()));
        assert!(rec.reasons.iter().any(|r| r.starts_with(NO_ACCEPTABLE_DAY)));
    }

    #[test]
    fn test_forecast_starting_tomorrow_never_excludes_today() {
        // Day 0 is taken as today even when its date is tomorrow.
        let days = vec![day(date(2026, 2, 5), "Today", false)];
        let snow = good_snow();
        let lifts = lifts(4, 6);
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: None,
        };
        let rec = strategy().recommend(&inputs, today());

        assert_eq!(rec.confidence, Rating::Good);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let days = vec![
            day(today(), "Today", true),
            day(date(2026, 2, 5), "Thu, Feb 5", false),
        ];
        let snow = good_snow();
        let lifts = lifts(3, 6);
        let bulletin = SnowpackBulletin {
            provincial_pct_median: Some(127.0),
            ..Default::default()
        };
        let inputs = DecisionInputs {
            lifts: &lifts,
            snow: &snow,
            days: &days,
            bulletin: Some(&bulletin),
        };
        let s = strategy();

        assert_eq!(s.recommend(&inputs, today()), s.recommend(&inputs, today()));
    }

    #[test]
    fn test_format_hour() {
        assert_eq!(format_hour(15), "3pm");
        assert_eq!(format_hour(12), "12pm");
        assert_eq!(format_hour(9), "9am");
    }
}
