//! CalDAV calendar source.
//!
//! Walks the usual discovery chain (principal, calendar home, collections)
//! and then runs a single time-range `calendar-query` on the selected
//! collection, asking the server to expand recurring events.

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};

use super::ical::{self, CalendarEvent};
use super::{SourceError, SourceResult, Sources};
use crate::config::CalendarConfig;

const DAV: &str = "DAV:";
const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

/// How far ahead to look for the next event.
pub const LOOKAHEAD_DAYS: i64 = 30;

const PRINCIPAL_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop><d:current-user-principal/></d:prop>
</d:propfind>"#;

const HOME_SET_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop><c:calendar-home-set/></d:prop>
</d:propfind>"#;

const COLLECTIONS_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:propfind xmlns:d="DAV:">
  <d:prop><d:resourcetype/><d:displayname/></d:prop>
</d:propfind>"#;

fn events_query(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let start = start.format("%Y%m%dT%H%M%SZ");
    let end = end.format("%Y%m%dT%H%M%SZ");
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <c:calendar-data>
      <c:expand start="{start}" end="{end}"/>
    </c:calendar-data>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VEVENT">
        <c:time-range start="{start}" end="{end}"/>
      </c:comp-filter>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#
    )
}

/// First `DAV:href` nested under the given property of a multistatus body.
pub fn property_href(body: &str, property: (&str, &str)) -> Result<String> {
    let doc = roxmltree::Document::parse(body)?;
    doc.descendants()
        .find(|n| n.has_tag_name(property))
        .and_then(|prop| prop.descendants().find(|n| n.has_tag_name((DAV, "href"))))
        .and_then(|href| href.text())
        .map(|href| href.trim().to_string())
        .ok_or_else(|| anyhow!("No {} in multistatus response", property.1))
}

/// Hrefs of every response whose resource type is a calendar, in server order.
pub fn calendar_collections(body: &str) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(body)?;
    let hrefs = doc
        .descendants()
        .filter(|n| n.has_tag_name((DAV, "response")))
        .filter(|response| {
            response
                .descendants()
                .filter(|n| n.has_tag_name((DAV, "resourcetype")))
                .any(|rt| rt.children().any(|n| n.has_tag_name((CALDAV, "calendar"))))
        })
        .filter_map(|response| {
            response
                .children()
                .find(|n| n.has_tag_name((DAV, "href")))
                .and_then(|href| href.text())
                .map(|href| href.trim().to_string())
        })
        .collect();
    Ok(hrefs)
}

/// Raw iCalendar payloads of a `calendar-query` response.
pub fn calendar_data(body: &str) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(body)?;
    let data = doc
        .descendants()
        .filter(|n| n.has_tag_name((CALDAV, "calendar-data")))
        .map(|n| {
            n.descendants()
                .filter(|t| t.is_text())
                .filter_map(|t| t.text())
                .collect::<String>()
        })
        .filter(|data| !data.trim().is_empty())
        .collect();
    Ok(data)
}

/// Earliest event by local start time.
pub fn next_event(events: Vec<CalendarEvent>, tz: Tz) -> Option<CalendarEvent> {
    events
        .into_iter()
        .min_by_key(|event| event.start.local_datetime(tz))
}

fn malformed(err: anyhow::Error) -> SourceError {
    SourceError::Malformed(err)
}

impl Sources {
    /// Next event within [`LOOKAHEAD_DAYS`] of `now`, if any.
    pub async fn fetch_next_event(
        &self,
        config: &CalendarConfig,
        now: DateTime<Utc>,
        tz: Tz,
    ) -> SourceResult<Option<CalendarEvent>> {
        let base = Url::parse(&config.api_url).map_err(|e| SourceError::Unavailable(e.into()))?;

        let body = self
            .dav(config, "PROPFIND", &base, "0", PRINCIPAL_QUERY.to_string())
            .await?;
        let principal = property_href(&body, (DAV, "current-user-principal")).map_err(malformed)?;
        let principal = join(&base, &principal)?;

        let body = self
            .dav(config, "PROPFIND", &principal, "0", HOME_SET_QUERY.to_string())
            .await?;
        let home = property_href(&body, (CALDAV, "calendar-home-set")).map_err(malformed)?;
        let home = join(&base, &home)?;

        let body = self
            .dav(config, "PROPFIND", &home, "1", COLLECTIONS_QUERY.to_string())
            .await?;
        let collections = calendar_collections(&body).map_err(malformed)?;
        if collections.is_empty() {
            return Err(malformed(anyhow!("No calendars found")));
        }
        let collection = collections.get(config.number).ok_or_else(|| {
            malformed(anyhow!(
                "Calendar number {} out of range ({} calendars)",
                config.number,
                collections.len()
            ))
        })?;
        let collection = join(&base, collection)?;

        let end = now + TimeDelta::days(LOOKAHEAD_DAYS);
        let body = self
            .dav(config, "REPORT", &collection, "1", events_query(now, end))
            .await?;

        let events = calendar_data(&body)
            .map_err(malformed)?
            .iter()
            .flat_map(|data| ical::parse_events(data))
            .collect::<Vec<_>>();

        let event = next_event(events, tz);
        if event.is_none() {
            log::info!("No upcoming events found");
        }
        Ok(event)
    }

    async fn dav(
        &self,
        config: &CalendarConfig,
        method: &str,
        url: &Url,
        depth: &str,
        body: String,
    ) -> SourceResult<String> {
        let method =
            Method::from_bytes(method.as_bytes()).map_err(|e| SourceError::Unavailable(e.into()))?;

        let text = self
            .client()
            .request(method, url.clone())
            .basic_auth(&config.username, Some(&config.app_password))
            .header("Depth", depth)
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(text)
    }
}

fn join(base: &Url, href: &str) -> SourceResult<Url> {
    base.join(href)
        .map_err(|e| malformed(anyhow!("Invalid href {}: {}", href, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ical::EventStart;
    use chrono::{NaiveDate, TimeZone};

    const PRINCIPAL_RESPONSE: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/</d:href>
    <d:propstat>
      <d:prop>
        <d:current-user-principal><d:href>/dav/principals/me/</d:href></d:current-user-principal>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    const COLLECTIONS_RESPONSE: &str = r#"<?xml version="1.0"?>
<multistatus xmlns="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <response>
    <href>/dav/calendars/me/</href>
    <propstat><prop><resourcetype><collection/></resourcetype></prop></propstat>
  </response>
  <response>
    <href>/dav/calendars/me/home/</href>
    <propstat><prop><resourcetype><collection/><cal:calendar/></resourcetype><displayname>Home</displayname></prop></propstat>
  </response>
  <response>
    <href>/dav/calendars/me/work/</href>
    <propstat><prop><resourcetype><collection/><cal:calendar/></resourcetype><displayname>Work</displayname></prop></propstat>
  </response>
</multistatus>"#;

    const REPORT_RESPONSE: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/dav/calendars/me/home/a.ics</d:href>
    <d:propstat><d:prop><c:calendar-data><![CDATA[BEGIN:VCALENDAR
BEGIN:VEVENT
DTSTART:20240620T170000Z
SUMMARY:Later event
END:VEVENT
END:VCALENDAR
]]></c:calendar-data></d:prop></d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/calendars/me/home/b.ics</d:href>
    <d:propstat><d:prop><c:calendar-data>BEGIN:VCALENDAR
BEGIN:VEVENT
DTSTART;VALUE=DATE:20240616
SUMMARY:Sooner event
END:VEVENT
END:VCALENDAR
</c:calendar-data></d:prop></d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_property_href() {
        let href = property_href(PRINCIPAL_RESPONSE, (DAV, "current-user-principal")).unwrap();
        assert_eq!(href, "/dav/principals/me/");
    }

    #[test]
    fn test_property_href_missing() {
        assert!(property_href(PRINCIPAL_RESPONSE, (CALDAV, "calendar-home-set")).is_err());
    }

    #[test]
    fn test_calendar_collections_skips_plain_collections() {
        let hrefs = calendar_collections(COLLECTIONS_RESPONSE).unwrap();
        assert_eq!(hrefs, vec!["/dav/calendars/me/home/", "/dav/calendars/me/work/"]);
    }

    #[test]
    fn test_next_event_from_report() {
        let events: Vec<_> = calendar_data(REPORT_RESPONSE)
            .unwrap()
            .iter()
            .flat_map(|data| ical::parse_events(data))
            .collect();
        assert_eq!(events.len(), 2);

        let next = next_event(events, chrono_tz::Europe::Stockholm).unwrap();
        assert_eq!(next.summary, "Sooner event");
        assert_eq!(
            next.start,
            EventStart::Date(NaiveDate::from_ymd_opt(2024, 6, 16).unwrap())
        );
    }

    #[test]
    fn test_events_query_time_range() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
        let query = events_query(now, now + TimeDelta::days(LOOKAHEAD_DAYS));
        assert!(query.contains(r#"<c:time-range start="20240615T093000Z" end="20240715T093000Z"/>"#));
        assert!(roxmltree::Document::parse(&query).is_ok());
    }

    #[test]
    fn test_invalid_xml_is_an_error() {
        assert!(calendar_collections("<multistatus").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let config = crate::config::test_config().calendar;
        let sources = Sources::new().unwrap();
        let result = sources
            .fetch_next_event(&config, Utc::now(), chrono_tz::Europe::Stockholm)
            .await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }
}
