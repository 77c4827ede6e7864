use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder shown for any weather value that could not be fetched.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum WindCondition {
    Calm,
    Breeze,
    #[serde(rename = "Fresh breeze")]
    FreshBreeze,
    Windy,
    Gusty,
    Stormy,
    Twister,
}

impl WindCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindCondition::Calm => "Calm",
            WindCondition::Breeze => "Breeze",
            WindCondition::FreshBreeze => "Fresh breeze",
            WindCondition::Windy => "Windy",
            WindCondition::Gusty => "Gusty",
            WindCondition::Stormy => "Stormy",
            WindCondition::Twister => "Twister",
        }
    }
}

impl fmt::Display for WindCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the day a later forecast sample falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Noon,
    Afternoon,
    Night,
}

impl DayPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayPart::Noon => "noon",
            DayPart::Afternoon => "afternoon",
            DayPart::Night => "night",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayPart {
    type Err = ();
    fn from_str(s: &str) -> Result<DayPart, ()> {
        match s {
            "noon" => Ok(DayPart::Noon),
            "afternoon" => Ok(DayPart::Afternoon),
            "night" => Ok(DayPart::Night),
            _ => Err(()),
        }
    }
}

/// Display-ready weather values. Every field is text so that a missing
/// source can be represented by placeholders.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherRecord {
    pub current_temp: String,
    pub wind_kmh: String,
    pub wind_condition: String,
    pub later_temp: String,
    pub later_temp_time: String,
    pub precipitation: String,
}

impl WeatherRecord {
    pub fn unavailable() -> Self {
        WeatherRecord {
            current_temp: NOT_AVAILABLE.to_string(),
            wind_kmh: NOT_AVAILABLE.to_string(),
            wind_condition: NOT_AVAILABLE.to_string(),
            later_temp: NOT_AVAILABLE.to_string(),
            later_temp_time: NOT_AVAILABLE.to_string(),
            precipitation: NOT_AVAILABLE.to_string(),
        }
    }
}

impl Default for WeatherRecord {
    fn default() -> Self {
        Self::unavailable()
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DepartureRecord {
    pub number: String,
    pub destination: String,
    /// "now" or "{n} min", only set inside the departure window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<String>,
    pub time: String,
}

impl DepartureRecord {
    /// Text for the right-hand column of a departure row.
    pub fn label(&self) -> &str {
        self.minutes.as_deref().unwrap_or(&self.time)
    }
}

/// Next calendar event. The empty record means "no event".
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalendarRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub event_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub event_desc_1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub event_desc_2: String,
}

impl CalendarRecord {
    pub fn is_empty(&self) -> bool {
        self.event_date.is_empty() && self.event_desc_1.is_empty() && self.event_desc_2.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayPayload {
    pub buses: Vec<DepartureRecord>,
    pub weather: WeatherRecord,
    pub calendar: CalendarRecord,
}
