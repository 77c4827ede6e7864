use anyhow::{Context, Result};
use shared::models::DisplayPayload;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Where the payload to render comes from.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    Api { url: String, api_key: Option<String> },
    File(PathBuf),
}

/// Obtain the payload, falling back to the placeholder payload on any
/// failure so the panel always gets a frame.
pub async fn load(source: &PayloadSource) -> DisplayPayload {
    let result = match source {
        PayloadSource::Api { url, api_key } => fetch(url, api_key.as_deref()).await,
        PayloadSource::File(path) => read(path),
    };

    result.unwrap_or_else(|err| {
        log::warn!("Rendering placeholders, payload unavailable: {:#}", err);
        DisplayPayload::default()
    })
}

async fn fetch(url: &str, api_key: Option<&str>) -> Result<DisplayPayload> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")?;

    let mut request = client.get(url);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    log::debug!("Fetching {}", url);
    let payload = request
        .send()
        .await
        .with_context(|| format!("Failed to fetch {}", url))?
        .error_for_status()?
        .json()
        .await
        .context("Invalid payload")?;

    Ok(payload)
}

fn read(path: &Path) -> Result<DisplayPayload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid payload in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::WeatherRecord;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"buses": [{{"number": "444", "destination": "Slussen", "minutes": "7 min", "time": "10:07"}}],
               "weather": {{"current_temp": "10°C"}}}}"#
        )
        .unwrap();

        let payload = load(&PayloadSource::File(file.path().to_path_buf())).await;
        assert_eq!(payload.buses.len(), 1);
        assert_eq!(payload.buses[0].label(), "7 min");
        assert_eq!(payload.weather.current_temp, "10°C");
        assert_eq!(payload.weather.wind_condition, "N/A");
        assert!(payload.calendar.is_empty());
    }

    #[tokio::test]
    async fn test_bad_file_renders_placeholders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let payload = load(&PayloadSource::File(file.path().to_path_buf())).await;
        assert!(payload.buses.is_empty());
        assert_eq!(payload.weather, WeatherRecord::unavailable());
    }

    #[tokio::test]
    async fn test_unreachable_api_renders_placeholders() {
        let source = PayloadSource::Api {
            url: "http://127.0.0.1:9/display".to_string(),
            api_key: Some("token".to_string()),
        };
        let payload = load(&source).await;
        assert!(payload.buses.is_empty());
        assert_eq!(payload.weather, WeatherRecord::unavailable());
    }
}
