use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use shared::models::{DayPart, WeatherRecord, WindCondition};

use crate::sources::weather::Hourly;

/// Number of hourly samples between the current and the "later" reading.
pub const LOOKAHEAD_HOURS: usize = 4;

/// Hour assumed when a forecast timestamp carries no readable hour.
const FALLBACK_HOUR: u32 = 12;

/// Upper bounds (km/h, inclusive) of each wind band, in ascending order.
const WIND_BANDS: [(f64, WindCondition); 6] = [
    (5.0, WindCondition::Calm),
    (15.0, WindCondition::Breeze),
    (30.0, WindCondition::FreshBreeze),
    (60.0, WindCondition::Windy),
    (90.0, WindCondition::Gusty),
    (120.0, WindCondition::Stormy),
];

pub fn wind_condition(kmh: f64) -> WindCondition {
    WIND_BANDS
        .iter()
        .find(|(limit, _)| kmh <= *limit)
        .map(|(_, condition)| *condition)
        .unwrap_or(WindCondition::Twister)
}

pub fn day_part(hour: u32) -> DayPart {
    match hour {
        10..=14 => DayPart::Noon,
        15..=20 => DayPart::Afternoon,
        _ => DayPart::Night,
    }
}

/// Key of the hourly sample covering `now`, e.g. `2024-06-15T10:00`.
pub fn hour_key(now: &DateTime<Tz>) -> String {
    now.format("%Y-%m-%dT%H:00").to_string()
}

/// Index of `key` in the forecast times. Falls back to the first sample
/// when the current hour is not listed.
pub fn current_index(times: &[String], key: &str) -> usize {
    times.iter().position(|time| time == key).unwrap_or(0)
}

pub fn lookahead_index(current: usize, len: usize) -> usize {
    (current + LOOKAHEAD_HOURS).min(len.saturating_sub(1))
}

fn hour_of(timestamp: &str) -> u32 {
    timestamp
        .get(11..13)
        .and_then(|hour| hour.parse().ok())
        .unwrap_or(FALLBACK_HOUR)
}

pub fn normalize(hourly: &Hourly, now: &DateTime<Tz>) -> Result<WeatherRecord> {
    let current = current_index(&hourly.time, &hour_key(now));

    let current_temp = hourly
        .temperature_2m
        .get(current)
        .context("No temperature for the current hour")?;
    let wind_kmh = hourly
        .wind_speed_10m
        .get(current)
        .context("No wind speed for the current hour")?;

    let later = lookahead_index(current, hourly.temperature_2m.len());
    let later_temp = hourly.temperature_2m[later];
    let later_time = hourly
        .time
        .get(later)
        .context("No timestamp for the later reading")?;

    let precipitation = hourly
        .precipitation_probability
        .get(current..=later)
        .filter(|window| !window.is_empty())
        .map(|window| window.iter().copied().fold(f64::MIN, f64::max))
        .ok_or_else(|| {
            anyhow!(
                "Precipitation window {}..={} out of range ({} samples)",
                current,
                later,
                hourly.precipitation_probability.len()
            )
        })?;

    Ok(WeatherRecord {
        current_temp: format!("{}°C", current_temp),
        wind_kmh: format!("{} km/h", wind_kmh),
        wind_condition: wind_condition(*wind_kmh).to_string(),
        later_temp: format!("{}°C", later_temp),
        later_temp_time: day_part(hour_of(later_time)).to_string(),
        precipitation: format!("{}%", precipitation),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Stockholm;

    fn hours(day: &str, from: u32, count: u32) -> Vec<String> {
        (from..from + count)
            .map(|h| format!("{}T{:02}:00", day, h))
            .collect()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Tz> {
        Stockholm.with_ymd_and_hms(2024, 6, 15, hour, minute, 0).unwrap()
    }

    // =========================================================================
    // wind bands
    // =========================================================================

    #[test]
    fn test_wind_band_boundaries_are_inclusive() {
        assert_eq!(wind_condition(0.0), WindCondition::Calm);
        assert_eq!(wind_condition(5.0), WindCondition::Calm);
        assert_eq!(wind_condition(5.1), WindCondition::Breeze);
        assert_eq!(wind_condition(15.0), WindCondition::Breeze);
        assert_eq!(wind_condition(30.0), WindCondition::FreshBreeze);
        assert_eq!(wind_condition(60.0), WindCondition::Windy);
        assert_eq!(wind_condition(90.0), WindCondition::Gusty);
        assert_eq!(wind_condition(120.0), WindCondition::Stormy);
        assert_eq!(wind_condition(120.5), WindCondition::Twister);
    }

    #[test]
    fn test_wind_bands_are_monotonic() {
        let mut previous = wind_condition(0.0);
        for tenth in 0..1500 {
            let condition = wind_condition(tenth as f64 / 10.0);
            assert!(condition >= previous, "band went down at {}", tenth);
            previous = condition;
        }
        assert_eq!(previous, WindCondition::Twister);
    }

    // =========================================================================
    // day parts and indexes
    // =========================================================================

    #[test]
    fn test_day_part() {
        assert_eq!(day_part(9), DayPart::Night);
        assert_eq!(day_part(10), DayPart::Noon);
        assert_eq!(day_part(14), DayPart::Noon);
        assert_eq!(day_part(15), DayPart::Afternoon);
        assert_eq!(day_part(20), DayPart::Afternoon);
        assert_eq!(day_part(21), DayPart::Night);
        assert_eq!(day_part(0), DayPart::Night);
    }

    #[test]
    fn test_hour_of_falls_back_to_noon() {
        assert_eq!(hour_of("2024-06-15T16:00"), 16);
        assert_eq!(hour_of("garbage"), FALLBACK_HOUR);
        assert_eq!(day_part(hour_of("garbage")), DayPart::Noon);
    }

    #[test]
    fn test_lookahead_is_clamped() {
        for len in 1..12 {
            for current in 0..len {
                assert_eq!(lookahead_index(current, len), (current + 4).min(len - 1));
            }
        }
    }

    #[test]
    fn test_current_index_falls_back_to_first_sample() {
        let times = hours("2024-06-15", 0, 24);
        assert_eq!(current_index(&times, &hour_key(&at(10, 42))), 10);
        assert_eq!(current_index(&times, "2030-01-01T00:00"), 0);
    }

    // =========================================================================
    // normalize
    // =========================================================================

    #[test]
    fn test_normalize_current_and_later_readings() {
        let mut temperature_2m = vec![0.0; 24];
        let mut wind_speed_10m = vec![0.0; 24];
        temperature_2m[12] = 10.0;
        wind_speed_10m[12] = 20.0;
        temperature_2m[16] = 5.0;

        let hourly = Hourly {
            time: hours("2024-06-15", 0, 24),
            temperature_2m,
            wind_speed_10m,
            precipitation_probability: vec![0.0; 24],
        };

        let record = normalize(&hourly, &at(12, 5)).unwrap();
        assert_eq!(record.current_temp, "10°C");
        assert_eq!(record.wind_kmh, "20 km/h");
        assert_eq!(record.wind_condition, "Fresh breeze");
        assert_eq!(record.later_temp, "5°C");
        assert_eq!(record.later_temp_time, "afternoon");
        assert_eq!(record.precipitation, "0%");
    }

    #[test]
    fn test_precipitation_is_window_maximum() {
        let mut precipitation_probability = vec![90.0; 24];
        precipitation_probability[8..=12].copy_from_slice(&[10.0, 40.0, 25.0, 5.0, 30.0]);

        let hourly = Hourly {
            time: hours("2024-06-15", 0, 24),
            temperature_2m: vec![12.5; 24],
            wind_speed_10m: vec![3.0; 24],
            precipitation_probability,
        };

        let record = normalize(&hourly, &at(8, 0)).unwrap();
        assert_eq!(record.precipitation, "40%");
        assert_eq!(record.current_temp, "12.5°C");
        assert_eq!(record.wind_condition, "Calm");
        assert_eq!(record.later_temp_time, "noon");
    }

    #[test]
    fn test_lookahead_clamped_at_end_of_forecast() {
        let hourly = Hourly {
            time: hours("2024-06-15", 20, 3),
            temperature_2m: vec![8.0, 7.0, 6.0],
            wind_speed_10m: vec![40.0, 40.0, 40.0],
            precipitation_probability: vec![0.0, 0.0, 70.0],
        };

        let record = normalize(&hourly, &at(21, 30)).unwrap();
        assert_eq!(record.current_temp, "7°C");
        assert_eq!(record.later_temp, "6°C");
        assert_eq!(record.later_temp_time, "night");
        assert_eq!(record.precipitation, "70%");
        assert_eq!(record.wind_condition, "Windy");
    }

    #[test]
    fn test_unmatched_hour_uses_first_sample() {
        let hourly = Hourly {
            time: hours("2024-06-14", 0, 6),
            temperature_2m: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            wind_speed_10m: vec![0.0; 6],
            precipitation_probability: vec![0.0; 6],
        };

        let record = normalize(&hourly, &at(12, 0)).unwrap();
        assert_eq!(record.current_temp, "1°C");
        assert_eq!(record.later_temp, "5°C");
    }

    #[test]
    fn test_short_columns_are_malformed() {
        let hourly = Hourly {
            time: hours("2024-06-15", 0, 24),
            temperature_2m: vec![10.0; 24],
            wind_speed_10m: vec![10.0; 24],
            precipitation_probability: vec![0.0; 2],
        };
        assert!(normalize(&hourly, &at(12, 0)).is_err());

        let empty = Hourly::default();
        assert!(normalize(&empty, &at(12, 0)).is_err());
    }
}
