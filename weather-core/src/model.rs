use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of the most recent fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Succeeded => "succeeded",
            Status::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_celsius: f64,
    pub condition_text: String,
    pub icon_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon_ref: String,
}

/// One provider day record, in the order the provider returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// ISO calendar date, e.g. `2024-05-01`.
    pub date: String,
    pub avg_temp_celsius: f64,
    pub max_temp_celsius: f64,
    pub min_temp_celsius: f64,
    pub condition: Condition,
}

/// Normalized result of a by-city lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    /// Provider local time, kept verbatim.
    pub local_time: String,
    pub location_name: String,
    pub forecast: Vec<ForecastDay>,
}

/// Success payload handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetchPayload {
    Report(WeatherReport),
    /// Fixed-key mode: provider body stored as-is under `key`.
    Region { key: String, body: Value },
}

/// The single current value of weather state.
///
/// Only the store builds new snapshots; everyone else sees them through
/// `Arc<WeatherSnapshot>` and cannot mutate a committed version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentConditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastDay>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub regions: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    /// True when any by-city success field is populated.
    pub fn has_report(&self) -> bool {
        self.current.is_some()
            || self.local_time.is_some()
            || self.location_name.is_some()
            || self.forecast.is_some()
    }

    /// Reassembles the by-city fields, if all of them are present.
    pub fn report(&self) -> Option<WeatherReport> {
        Some(WeatherReport {
            current: self.current.clone()?,
            local_time: self.local_time.clone()?,
            location_name: self.location_name.clone()?,
            forecast: self.forecast.clone()?,
        })
    }

    pub fn region(&self, key: &str) -> Option<&Value> {
        self.regions.get(key)
    }
}
