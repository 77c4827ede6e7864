//! Minimal iCalendar (RFC 5545) reader.
//!
//! Only what the dashboard needs: the start and summary of each `VEVENT`.
//! Lines are unfolded first; nested components such as `VALARM` are skipped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

#[derive(Clone, Debug, PartialEq)]
pub enum EventStart {
    /// All-day event.
    Date(NaiveDate),
    /// UTC or zone-qualified start.
    At(DateTime<Utc>),
    /// Floating time, read as wall-clock time wherever it is displayed.
    Floating(NaiveDateTime),
}

impl EventStart {
    /// Calendar day of the start as seen in `tz`.
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        match self {
            EventStart::Date(date) => *date,
            EventStart::At(at) => at.with_timezone(&tz).date_naive(),
            EventStart::Floating(naive) => naive.date(),
        }
    }

    /// Wall-clock start in `tz`, used to order events.
    pub fn local_datetime(&self, tz: Tz) -> NaiveDateTime {
        match self {
            EventStart::Date(date) => date.and_time(NaiveTime::MIN),
            EventStart::At(at) => at.with_timezone(&tz).naive_local(),
            EventStart::Floating(naive) => *naive,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEvent {
    pub start: EventStart,
    pub summary: String,
}

struct Property<'a> {
    name: String,
    params: Vec<(String, String)>,
    value: &'a str,
}

impl Property<'_> {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Extract every `VEVENT` that carries a parseable `DTSTART`.
pub fn parse_events(data: &str) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    let mut current: Option<(Option<EventStart>, String)> = None;
    let mut depth = 0usize;

    for line in unfold(data) {
        let Some(prop) = parse_property(&line) else {
            continue;
        };

        match prop.name.as_str() {
            "BEGIN" if current.is_some() => depth += 1,
            "BEGIN" if prop.value.eq_ignore_ascii_case("VEVENT") => {
                current = Some((None, String::new()));
                depth = 0;
            }
            "END" if current.is_some() && depth > 0 => depth -= 1,
            "END" if prop.value.eq_ignore_ascii_case("VEVENT") => {
                if let Some((Some(start), summary)) = current.take() {
                    events.push(CalendarEvent { start, summary });
                }
            }
            "DTSTART" if depth == 0 => {
                if let Some(event) = current.as_mut() {
                    event.0 = parse_start(&prop);
                }
            }
            "SUMMARY" if depth == 0 => {
                if let Some(event) = current.as_mut() {
                    event.1 = unescape_text(prop.value);
                }
            }
            _ => {}
        }
    }

    events
}

fn unfold(data: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in data.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

fn parse_property(line: &str) -> Option<Property<'_>> {
    let mut in_quotes = false;
    let (split, _) = line.char_indices().find(|&(_, c)| {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        c == ':' && !in_quotes
    })?;

    let mut head = line[..split].split(';');
    let name = head.next()?.trim().to_ascii_uppercase();
    let params = head
        .filter_map(|param| param.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        .collect();

    Some(Property {
        name,
        params,
        value: &line[split + 1..],
    })
}

fn parse_start(prop: &Property) -> Option<EventStart> {
    let value = prop.value.trim();

    if prop.param("VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE")) || value.len() == 8 {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(EventStart::Date);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(EventStart::At(Utc.from_utc_datetime(&naive)));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    let zoned = prop
        .param("TZID")
        .and_then(|tzid| tzid.parse::<Tz>().ok())
        .and_then(|tz| tz.from_local_datetime(&naive).earliest())
        .map(|at| EventStart::At(at.with_timezone(&Utc)));

    Some(zoned.unwrap_or(EventStart::Floating(naive)))
}

/// Undo TEXT escaping. Unknown escapes are kept verbatim so that
/// `\uXXXX` sequences survive for the calendar normalizer.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
