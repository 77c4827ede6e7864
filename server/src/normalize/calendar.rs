use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use shared::models::CalendarRecord;

use crate::sources::ical::CalendarEvent;

/// Characters that fit on the first description line.
pub const LINE_BUDGET: usize = 21;

/// Decode `\uXXXX` (UTF-16, surrogate pairs allowed) and `\UXXXXXXXX`
/// escapes. Returns `None` when the escapes do not form valid text.
pub fn decode_unicode_escapes(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut units: Vec<u16> = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let escape = match chars.get(i + 1) {
            Some('u') if chars[i] == '\\' => hex_value(&chars, i + 2, 4).map(|v| (v, 6)),
            Some('U') if chars[i] == '\\' => hex_value(&chars, i + 2, 8).map(|v| (v, 10)),
            _ => None,
        };

        match escape {
            Some((value, len)) if len == 6 => {
                units.push(value as u16);
                i += len;
            }
            Some((value, len)) => {
                let c = char::from_u32(value)?;
                let mut buf = [0u16; 2];
                units.extend_from_slice(c.encode_utf16(&mut buf));
                i += len;
            }
            None => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(chars[i].encode_utf16(&mut buf));
                i += 1;
            }
        }
    }

    String::from_utf16(&units).ok()
}

fn hex_value(chars: &[char], start: usize, len: usize) -> Option<u32> {
    let digits: String = chars.get(start..start + len)?.iter().collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}

/// "today", "tomorrow" or an upper-cased short date such as `15JUN`.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "today".to_string()
    } else if today.succ_opt() == Some(date) {
        "tomorrow".to_string()
    } else {
        date.format("%d%b").to_string().to_uppercase()
    }
}

/// Split a summary over two lines at the last space at or before
/// [`LINE_BUDGET`], or hard at the budget when there is no such space.
pub fn split_description(summary: &str) -> (String, String) {
    let chars: Vec<char> = summary.chars().collect();
    if chars.len() <= LINE_BUDGET {
        return (summary.to_string(), String::new());
    }

    let split = chars[..=LINE_BUDGET]
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|&i| i > 0)
        .unwrap_or(LINE_BUDGET);

    let first: String = chars[..split].iter().collect();
    let second: String = chars[split..].iter().collect();
    (first.trim().to_string(), second.trim().to_string())
}

pub fn normalize(event: &CalendarEvent, now: &DateTime<Tz>) -> CalendarRecord {
    let summary = if event.summary.contains("\\u") || event.summary.contains("\\U") {
        decode_unicode_escapes(&event.summary).unwrap_or_else(|| event.summary.clone())
    } else {
        event.summary.clone()
    };

    let today = now.date_naive();
    let date = event.start.local_date(now.timezone());
    let (event_desc_1, event_desc_2) = split_description(summary.trim());

    CalendarRecord {
        event_date: day_label(date, today),
        event_desc_1,
        event_desc_2,
    }
}
