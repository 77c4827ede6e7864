use serde::Deserialize;

use super::{SourceError, SourceResult, Sources};
use crate::config::TransitConfig;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeparturesResponse {
    #[serde(default)]
    pub departures: Vec<Departure>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Departure {
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub route: Route,
    pub realtime: Option<String>,
    pub scheduled: Option<String>,
}

impl Departure {
    pub fn destination_name(&self) -> Option<&str> {
        self.route
            .destination
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Real-time estimate when published, otherwise the timetable.
    pub fn timestamp(&self) -> Option<&str> {
        self.realtime.as_deref().or(self.scheduled.as_deref())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Route {
    pub designation: Option<String>,
    pub destination: Option<Destination>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Destination {
    pub name: Option<String>,
}

pub fn build_url(config: &TransitConfig) -> String {
    format!(
        "{}/{}?key={}",
        config.api_url.trim_end_matches('/'),
        config.station_id,
        config.api_key
    )
}

impl Sources {
    pub async fn fetch_departures(&self, config: &TransitConfig) -> SourceResult<DeparturesResponse> {
        let response = self
            .client()
            .get(build_url(config))
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.into()))
    }
}
