use chrono::{Datelike, NaiveDate};

use crate::data::types::{Rating, SnowpackBulletin};
use crate::strategies::types::Recommendation;

const ISLAND_HIGH_PCT: f64 = 110.0;
const ISLAND_LOW_PCT: f64 = 85.0;
const PROVINCIAL_HIGH_PCT: f64 = 115.0;
const PROVINCIAL_LOW_PCT: f64 = 95.0;

const MIN_BIAS: i32 = -1;
const MAX_BIAS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Off,
    Pre,
    Peak,
    Shoulder,
}

impl Season {
    pub fn of(date: NaiveDate) -> Self {
        match date.month() {
            5..=10 => Season::Off,
            11 => Season::Pre,
            12 | 1 | 2 => Season::Peak,
            _ => Season::Shoulder,
        }
    }
}

/// Positive when the snowpack runs above median, negative when below.
/// Always within [-1, +2].
pub fn snowpack_bias(bulletin: Option<&SnowpackBulletin>) -> i32 {
    let Some(bulletin) = bulletin else {
        return 0;
    };

    let mut bias = 0;
    if let Some(pct) = bulletin.vancouver_island_pct_median {
        if pct >= ISLAND_HIGH_PCT {
            bias += 1;
        } else if pct <= ISLAND_LOW_PCT {
            bias -= 1;
        }
    }
    if let Some(pct) = bulletin.provincial_pct_median {
        if pct >= PROVINCIAL_HIGH_PCT {
            bias += 1;
        } else if pct <= PROVINCIAL_LOW_PCT {
            bias -= 1;
        }
    }

    bias.clamp(MIN_BIAS, MAX_BIAS)
}

/// Calendar-based guess used when no forecast day qualifies.
pub fn seasonal_fallback(today: NaiveDate, bulletin: Option<&SnowpackBulletin>) -> Recommendation {
    let bias = snowpack_bias(bulletin);
    let month = today.format("%B").to_string();

    let mut rec = match Season::of(today) {
        Season::Off => {
            let window = match bias {
                b if b >= 2 => "late November",
                1 => "early December",
                0 => "mid December",
                _ => "late December",
            };
            let mut rec = Recommendation::new(format!("Next season ({})", window), Rating::Bad);
            rec.reasons.push(format!("{} is off-season; lifts are not running", month));
            rec.reasons.push(bias_shift_reason(bias));
            rec
        }
        Season::Pre => {
            let window = match bias {
                b if b >= 2 => "Late November",
                1 => "Late November to early December",
                0 => "Early to mid December",
                _ => "Mid to late December",
            };
            let mut rec = Recommendation::new(window, Rating::Meh);
            rec.reasons
                .push("November is pre-season; opening day depends on early storms".to_string());
            rec.reasons.push(bias_shift_reason(bias));
            rec
        }
        Season::Peak => {
            let mut rec = Recommendation::new("This week or next week", Rating::Meh);
            rec.reasons.push(format!(
                "{} is peak season; a dry, snowy day usually turns up within a week or two",
                month
            ));
            rec
        }
        Season::Shoulder => {
            let mut rec = Recommendation::new("Within the next 1-2 weeks", Rating::Meh);
            rec.reasons.push(format!(
                "{} is shoulder season; wait for a cold snap with fresh snow",
                month
            ));
            rec
        }
    };

    rec.reasons.push(snowpack_reason(bulletin, bias));
    rec
}

fn bias_shift_reason(bias: i32) -> String {
    match bias {
        b if b > 0 => format!("Snowpack bias +{} moves the window earlier", b),
        0 => "Snowpack near normal; window not shifted".to_string(),
        b => format!("Snowpack bias {} moves the window later", b),
    }
}

fn snowpack_reason(bulletin: Option<&SnowpackBulletin>, bias: i32) -> String {
    let Some(bulletin) = bulletin else {
        return "Snowpack bulletin unavailable".to_string();
    };

    let mut figures = Vec::new();
    if let Some(pct) = bulletin.vancouver_island_pct_median {
        figures.push(format!("Vancouver Island {}% of median", pct));
    }
    if let Some(pct) = bulletin.provincial_pct_median {
        figures.push(format!("provincial {}% of median", pct));
    }

    if figures.is_empty() {
        "Snowpack bulletin has no percentage figures".to_string()
    } else {
        format!("Snowpack: {} (bias {:+})", figures.join(", "), bias)
    }
}
