use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

/// Zone used when `LOCAL_TIMEZONE` is unset.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Stockholm;

#[derive(Clone, Debug, Deserialize)]
pub struct WeatherConfig {
    pub api_url: String,
    pub lat: f64,
    pub long: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransitConfig {
    pub api_url: String,
    pub station_id: String,
    pub api_key: String,
    /// Destination allow-list; empty means every destination is shown.
    #[serde(default, deserialize_with = "comma_separated")]
    pub select_destinations: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CalendarConfig {
    pub api_url: String,
    pub username: String,
    pub app_password: String,
    /// Index of the calendar collection to read, in server order.
    #[serde(default)]
    pub number: usize,
}

#[derive(Debug, Deserialize)]
struct GlobalConfig {
    local_timezone: Option<String>,
    api_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub weather: WeatherConfig,
    pub transit: TransitConfig,
    pub calendar: CalendarConfig,
    pub timezone: Tz,
    /// Bearer key required on `/display` when set.
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Config>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let weather = envy::prefixed("WEATHER_")
            .from_iter::<_, WeatherConfig>(vars.clone())
            .context("Missing weather config. Required env vars: WEATHER_API_URL, WEATHER_LAT, WEATHER_LONG")?;
        let transit = envy::prefixed("PUBLIC_TRANSPORT_")
            .from_iter::<_, TransitConfig>(vars.clone())
            .context("Missing public transport config. Required env vars: PUBLIC_TRANSPORT_API_URL, PUBLIC_TRANSPORT_STATION_ID, PUBLIC_TRANSPORT_API_KEY")?;
        let calendar = envy::prefixed("CALENDAR_")
            .from_iter::<_, CalendarConfig>(vars.clone())
            .context("Missing calendar config. Required env vars: CALENDAR_API_URL, CALENDAR_USERNAME, CALENDAR_APP_PASSWORD")?;
        let global = envy::from_iter::<_, GlobalConfig>(vars)?;

        let timezone = match global.local_timezone.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_TIMEZONE,
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid LOCAL_TIMEZONE {}: {}", name, e))?,
        };

        Ok(Config {
            weather,
            transit,
            calendar,
            timezone,
            api_key: global.api_key.filter(|key| !key.is_empty()),
        })
    }
}

fn comma_separated<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        weather: WeatherConfig {
            api_url: "http://127.0.0.1:9/v1/forecast".to_string(),
            lat: 59.33,
            long: 18.07,
        },
        transit: TransitConfig {
            api_url: "http://127.0.0.1:9/departures".to_string(),
            station_id: "740000001".to_string(),
            api_key: "secret".to_string(),
            select_destinations: vec![],
        },
        calendar: CalendarConfig {
            api_url: "http://127.0.0.1:9/dav/".to_string(),
            username: "user".to_string(),
            app_password: "password".to_string(),
            number: 0,
        },
        timezone: DEFAULT_TIMEZONE,
        api_key: None,
    }
}
