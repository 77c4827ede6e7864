use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use shared::models::DepartureRecord;

use crate::sources::transit::{Departure, DeparturesResponse};

/// Departures closer than this many minutes show a relative label.
pub const DEPARTURE_WINDOW_MINUTES: i64 = 30;

/// Naive timestamp layouts accepted besides RFC 3339.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a departure timestamp into `tz`. Timestamps without an offset are
/// wall-clock times in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&tz));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
}

/// Relative label for a departure `diff` whole minutes away.
pub fn minutes_label(diff: i64) -> Option<String> {
    match diff {
        0 => Some("now".to_string()),
        1.. if diff < DEPARTURE_WINDOW_MINUTES => Some(format!("{} min", diff)),
        _ => None,
    }
}

fn is_allowed(destination: &str, allowed: &[String]) -> bool {
    allowed.is_empty() || allowed.iter().any(|name| name == destination)
}

fn normalize_one(departure: &Departure, allowed: &[String], now: &DateTime<Tz>) -> Option<DepartureRecord> {
    if departure.canceled {
        return None;
    }
    let destination = departure.destination_name()?;
    if !is_allowed(destination, allowed) {
        return None;
    }

    let at = parse_timestamp(departure.timestamp()?, now.timezone())?;
    let diff = (at - *now).num_milliseconds().div_euclid(60_000);

    Some(DepartureRecord {
        number: departure.route.designation.clone().unwrap_or_default(),
        destination: destination.to_string(),
        minutes: minutes_label(diff),
        time: at.format("%H:%M").to_string(),
    })
}

/// Displayable departures in source order.
pub fn normalize(response: &DeparturesResponse, allowed: &[String], now: &DateTime<Tz>) -> Vec<DepartureRecord> {
    response
        .departures
        .iter()
        .filter_map(|departure| normalize_one(departure, allowed, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::transit::{Destination, Route};
    use chrono::{TimeDelta, Timelike};
    use chrono_tz::Europe::Stockholm;

    fn now() -> DateTime<Tz> {
        Stockholm.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn departure(number: &str, destination: &str, realtime: DateTime<Tz>) -> Departure {
        Departure {
            canceled: false,
            route: Route {
                designation: Some(number.to_string()),
                destination: Some(Destination {
                    name: Some(destination.to_string()),
                }),
            },
            realtime: Some(realtime.format("%Y-%m-%dT%H:%M:%S").to_string()),
            scheduled: None,
        }
    }

    fn response(departures: Vec<Departure>) -> DeparturesResponse {
        DeparturesResponse { departures }
    }

    #[test]
    fn test_minutes_label() {
        assert_eq!(minutes_label(-1), None);
        assert_eq!(minutes_label(0).as_deref(), Some("now"));
        assert_eq!(minutes_label(1).as_deref(), Some("1 min"));
        assert_eq!(minutes_label(29).as_deref(), Some("29 min"));
        assert_eq!(minutes_label(30), None);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = now() + TimeDelta::minutes(7);
        assert_eq!(parse_timestamp("2024-06-15T10:07:00", Stockholm), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T10:07", Stockholm), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T08:07:00Z", Stockholm), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T10:07:00+02:00", Stockholm), Some(expected));
        assert_eq!(parse_timestamp("2024-06-15T10:07:00.500", Stockholm).map(|t| t.minute()), Some(7));
        assert_eq!(parse_timestamp("soon", Stockholm), None);
    }

    #[test]
    fn test_seven_minutes_away() {
        let departures = vec![departure("444", "Slussen", now() + TimeDelta::minutes(7))];
        let records = normalize(&response(departures), &[], &now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, "444");
        assert_eq!(records[0].destination, "Slussen");
        assert_eq!(records[0].minutes.as_deref(), Some("7 min"));
        assert_eq!(records[0].time, "10:07");
    }

    #[test]
    fn test_canceled_is_dropped() {
        let mut canceled = departure("444", "Slussen", now() + TimeDelta::minutes(7));
        canceled.canceled = true;
        let kept = departure("471", "Slussen", now() + TimeDelta::minutes(7));

        let records = normalize(&response(vec![canceled, kept]), &[], &now());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, "471");
    }

    #[test]
    fn test_allow_list_filters_destinations() {
        let departures = vec![
            departure("444", "Slussen", now() + TimeDelta::minutes(3)),
            departure("53", "Karolinska", now() + TimeDelta::minutes(4)),
            departure("471", "Gullmarsplan", now() + TimeDelta::minutes(5)),
        ];
        let allowed = vec!["Slussen".to_string(), "Gullmarsplan".to_string()];

        let records = normalize(&response(departures), &allowed, &now());
        let numbers: Vec<_> = records.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["444", "471"]);
    }

    #[test]
    fn test_missing_destination_or_time_is_dropped() {
        let mut no_destination = departure("1", "x", now());
        no_destination.route.destination = None;
        let mut empty_destination = departure("2", "", now());
        empty_destination.route.destination = Some(Destination { name: Some(String::new()) });
        let mut no_time = departure("3", "Slussen", now());
        no_time.realtime = None;
        let mut bad_time = departure("4", "Slussen", now());
        bad_time.realtime = Some("not a time".to_string());

        let records = normalize(
            &response(vec![no_destination, empty_destination, no_time, bad_time]),
            &[],
            &now(),
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_scheduled_fallback() {
        let mut scheduled_only = departure("444", "Slussen", now());
        scheduled_only.realtime = None;
        scheduled_only.scheduled = Some("2024-06-15T10:00:30".to_string());

        let records = normalize(&response(vec![scheduled_only]), &[], &now());
        assert_eq!(records[0].minutes.as_deref(), Some("now"));
        assert_eq!(records[0].time, "10:00");
    }

    #[test]
    fn test_window_edges_and_source_order() {
        let departures = vec![
            departure("a", "Slussen", now() + TimeDelta::minutes(45)),
            departure("b", "Slussen", now() + TimeDelta::seconds(29 * 60 + 59)),
            departure("c", "Slussen", now() + TimeDelta::minutes(30)),
            departure("d", "Slussen", now() - TimeDelta::seconds(30)),
        ];
        let records = normalize(&response(departures), &[], &now());

        let numbers: Vec<_> = records.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["a", "b", "c", "d"]);
        assert_eq!(records[0].minutes, None);
        assert_eq!(records[0].time, "10:45");
        assert_eq!(records[1].minutes.as_deref(), Some("29 min"));
        assert_eq!(records[2].minutes, None);
        // half a minute in the past floors to -1
        assert_eq!(records[3].minutes, None);
    }

    #[test]
    fn test_fraction_of_a_second_past_is_gone() {
        let now = now() + TimeDelta::milliseconds(300);
        let departures = vec![
            departure("444", "Slussen", now.with_nanosecond(0).unwrap()),
            departure("471", "Slussen", now + TimeDelta::seconds(59)),
        ];
        let records = normalize(&response(departures), &[], &now);

        assert_eq!(records[0].minutes, None);
        assert_eq!(records[0].time, "10:00");
        // the source drops the fraction: 58.7 s ahead
        assert_eq!(records[1].minutes.as_deref(), Some("now"));
    }
}
