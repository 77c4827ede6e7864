//! Adapters for the three upstream services.
//!
//! Each adapter performs a single best-effort fetch and reports failure as a
//! [`SourceError`]; nothing here retries.

use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;

pub mod calendar;
pub mod ical;
pub mod transit;
pub mod weather;

/// Per-request network timeout for every upstream call.
const SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub enum SourceError {
    /// Network failure, non-success status or undecodable body.
    Unavailable(anyhow::Error),
    /// The response decoded but lacks what we need.
    Malformed(anyhow::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(err) => write!(f, "unavailable: {:#}", err),
            SourceError::Malformed(err) => write!(f, "malformed: {:#}", err),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Malformed(err.into())
        } else {
            SourceError::Unavailable(err.into())
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// HTTP client shared by the adapters.
#[derive(Clone)]
pub struct Sources {
    client: reqwest::Client,
}

impl Sources {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SOURCE_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = SourceError::Malformed(anyhow::anyhow!("no hourly block"));
        assert_eq!(err.to_string(), "malformed: no hourly block");

        let err = SourceError::Unavailable(anyhow::anyhow!("connection refused"));
        assert_eq!(err.to_string(), "unavailable: connection refused");
    }
}
