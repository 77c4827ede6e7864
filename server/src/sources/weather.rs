use chrono_tz::Tz;
use reqwest::Url;
use serde::Deserialize;

use super::{SourceError, SourceResult, Sources};
use crate::config::WeatherConfig;

/// Hourly variables requested from the forecast API.
const HOURLY_FIELDS: &str = "temperature_2m,wind_speed_10m,precipitation_probability";

#[derive(Clone, Debug, Deserialize)]
pub struct Forecast {
    pub hourly: Hourly,
}

/// Hourly forecast columns, aligned by index.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Hourly {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub wind_speed_10m: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
}

/// Build the forecast URL. Asking for the local zone makes the hourly keys
/// wall-clock times, which the current-hour lookup relies on.
pub fn build_url(config: &WeatherConfig, tz: Tz) -> anyhow::Result<Url> {
    let url = Url::parse_with_params(
        &config.api_url,
        &[
            ("latitude", config.lat.to_string()),
            ("longitude", config.long.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("forecast_days", "2".to_string()),
            ("timezone", tz.name().to_string()),
        ],
    )?;
    Ok(url)
}

impl Sources {
    pub async fn fetch_forecast(&self, config: &WeatherConfig, tz: Tz) -> SourceResult<Forecast> {
        let url = build_url(config, tz).map_err(SourceError::Unavailable)?;

        let forecast = self
            .client()
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Forecast>()
            .await?;

        Ok(forecast)
    }
}
