//! Time-of-day weight (spec §4.5): a pure function of a timestamp and a
//! configured local zone. Peak hours weigh trades fully, dead hours damp
//! them, everything else sits in between.

use crate::money::Money;
use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

pub const PEAK_WEIGHT: f64 = 1.0;
pub const DEAD_WEIGHT: f64 = 0.3;
pub const NORMAL_WEIGHT: f64 = 0.7;

/// `time_of_day_weight(t)` against the given local zone (spec §4.5).
///
/// - Peak: weekday 18:00-24:00, weekend 10:00-24:00.
/// - Dead: 02:00-08:00 every day, weekday 09:00-17:00 (6h peak + 14h dead +
///   4h normal = 24h on a weekday: the 17:00-18:00 hour is normal, not dead).
/// - Normal: everything else.
pub fn time_of_day_weight(at: DateTime<Utc>, zone: Tz) -> Money {
    let local = at.with_timezone(&zone);
    let hour = local.hour();
    let is_weekend = matches!(local.weekday(), Weekday::Sat | Weekday::Sun);

    let weight = if is_weekend {
        if (10..24).contains(&hour) {
            PEAK_WEIGHT
        } else if (2..8).contains(&hour) {
            DEAD_WEIGHT
        } else {
            NORMAL_WEIGHT
        }
    } else if (18..24).contains(&hour) {
        PEAK_WEIGHT
    } else if (2..8).contains(&hour) || (9..17).contains(&hour) {
        DEAD_WEIGHT
    } else {
        NORMAL_WEIGHT
    };

    Money::from_f64(weight)
}
