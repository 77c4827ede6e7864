use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::models::{CalendarRecord, DisplayPayload, WeatherRecord};

use crate::config::Config;
use crate::normalize;
use crate::sources::ical::CalendarEvent;
use crate::sources::transit::DeparturesResponse;
use crate::sources::weather::Forecast;
use crate::sources::{SourceResult, Sources};

/// Fetch every source one after the other and build the payload.
pub async fn snapshot(sources: &Sources, config: &Config) -> DisplayPayload {
    let now = Utc::now().with_timezone(&config.timezone);

    let forecast = sources.fetch_forecast(&config.weather, config.timezone).await;
    let departures = sources.fetch_departures(&config.transit).await;
    let event = sources
        .fetch_next_event(&config.calendar, now.with_timezone(&Utc), config.timezone)
        .await;

    assemble(forecast, departures, event, &now, config)
}

/// Normalize each source result, substituting defaults for the sections
/// whose source failed. A failure never affects the other sections.
pub fn assemble(
    forecast: SourceResult<Forecast>,
    departures: SourceResult<DeparturesResponse>,
    event: SourceResult<Option<CalendarEvent>>,
    now: &DateTime<Tz>,
    config: &Config,
) -> DisplayPayload {
    let weather = match forecast {
        Ok(forecast) => normalize::weather::normalize(&forecast.hourly, now).unwrap_or_else(|err| {
            log::warn!("Weather record malformed: {:#}", err);
            WeatherRecord::unavailable()
        }),
        Err(err) => {
            log::warn!("Weather source {}", err);
            WeatherRecord::unavailable()
        }
    };

    let buses = match departures {
        Ok(response) => {
            normalize::transit::normalize(&response, &config.transit.select_destinations, now)
        }
        Err(err) => {
            log::warn!("Public transport source {}", err);
            vec![]
        }
    };

    let calendar = match event {
        Ok(Some(event)) => normalize::calendar::normalize(&event, now),
        Ok(None) => CalendarRecord::default(),
        Err(err) => {
            log::warn!("Calendar source {}", err);
            CalendarRecord::default()
        }
    };

    DisplayPayload {
        buses,
        weather,
        calendar,
    }
}
