use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    FetchError, FetchPayload,
    model::{Condition, CurrentConditions, ForecastDay, WeatherReport},
    provider::{ResolutionStrategy, StrategyKind, endpoint},
    transport::Transport,
};

/// By-city lookup against WeatherAPI.com: one current-conditions call and
/// one N-day forecast call for the same free-text location.
#[derive(Debug, Clone)]
pub struct CityLookup {
    api_key: Option<String>,
    base_url: Url,
    days: u8,
}

impl CityLookup {
    pub fn new(api_key: Option<String>, base_url: Url, days: u8) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self { api_key, base_url, days }
    }

    fn credential(&self) -> Result<&str, FetchError> {
        self.api_key.as_deref().ok_or(FetchError::MissingCredential)
    }

    pub fn current_url(&self, city: &str) -> Result<Url, FetchError> {
        let key = self.credential()?;
        Ok(endpoint(&self.base_url, "current.json", &[("q", city), ("key", key)]))
    }

    pub fn forecast_url(&self, city: &str) -> Result<Url, FetchError> {
        let key = self.credential()?;
        let days = self.days.to_string();
        Ok(endpoint(
            &self.base_url,
            "forecast.json",
            &[("q", city), ("key", key), ("days", days.as_str())],
        ))
    }
}

#[async_trait]
impl ResolutionStrategy for CityLookup {
    fn kind(&self) -> StrategyKind {
        StrategyKind::City
    }

    fn validate(&self, location_key: &str) -> Result<(), FetchError> {
        self.credential()?;
        if location_key.trim().is_empty() {
            return Err(FetchError::EmptyLocation);
        }
        Ok(())
    }

    async fn fetch(
        &self,
        location_key: &str,
        transport: &dyn Transport,
    ) -> Result<FetchPayload, FetchError> {
        let city = location_key.trim();
        let current_url = self.current_url(city)?;
        let forecast_url = self.forecast_url(city)?;

        // Both must succeed; the first failure wins.
        let (current, forecast) = tokio::try_join!(
            transport.get_json(&current_url),
            transport.get_json(&forecast_url),
        )?;

        normalize(current, forecast).map(FetchPayload::Report)
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

impl From<WaCondition> for Condition {
    fn from(c: WaCondition) -> Self {
        Condition { text: c.text, icon_ref: c.icon }
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    localtime: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaCurrentResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

/// Maps the two raw bodies onto a [`WeatherReport`].
///
/// Any missing or mistyped field is a [`FetchError::Shape`].
pub fn normalize(current: Value, forecast: Value) -> Result<WeatherReport, FetchError> {
    let current: WaCurrentResponse = parse(current, "current conditions")?;
    let forecast: WaForecastResponse = parse(forecast, "forecast")?;

    let days = forecast
        .forecast
        .forecastday
        .into_iter()
        .map(|d| {
            NaiveDate::parse_from_str(&d.date, "%Y-%m-%d").map_err(|e| {
                FetchError::shape(format!("forecast date '{}' is not a calendar date: {e}", d.date))
            })?;

            Ok(ForecastDay {
                date: d.date,
                avg_temp_celsius: d.day.avgtemp_c,
                max_temp_celsius: d.day.maxtemp_c,
                min_temp_celsius: d.day.mintemp_c,
                condition: d.day.condition.into(),
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    Ok(WeatherReport {
        current: CurrentConditions {
            temperature_celsius: current.current.temp_c,
            condition_text: current.current.condition.text,
            icon_ref: current.current.condition.icon,
        },
        local_time: current.location.localtime,
        location_name: current.location.name,
        forecast: days,
    })
}

fn parse<T: DeserializeOwned>(body: Value, what: &str) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::shape(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::parse_base_url;
    use serde_json::json;

    fn lookup(key: Option<&str>) -> CityLookup {
        CityLookup::new(
            key.map(str::to_string),
            parse_base_url("http://api.weatherapi.com/v1").unwrap(),
            7,
        )
    }

    fn current_body() -> Value {
        json!({
            "location": { "name": "London", "localtime": "2024-05-01 10:00", "country": "UK" },
            "current": {
                "temp_c": 21.5,
                "condition": { "text": "Cloudy", "icon": "//x/cloud.png", "code": 1006 }
            }
        })
    }

    fn forecast_body() -> Value {
        json!({
            "forecast": { "forecastday": [
                { "date": "2024-05-01", "day": {
                    "avgtemp_c": 18.2, "maxtemp_c": 22.0, "mintemp_c": 14.5,
                    "condition": { "text": "Cloudy", "icon": "//x/cloud.png" } } },
                { "date": "2024-05-02", "day": {
                    "avgtemp_c": 16.0, "maxtemp_c": 19.5, "mintemp_c": 11.0,
                    "condition": { "text": "Rain", "icon": "//x/rain.png" } } }
            ] }
        })
    }

    #[test]
    fn builds_provider_urls() {
        let l = lookup(Some("KEY"));
        assert_eq!(
            l.current_url("London").unwrap().as_str(),
            "http://api.weatherapi.com/v1/current.json?q=London&key=KEY"
        );
        assert_eq!(
            l.forecast_url("London").unwrap().as_str(),
            "http://api.weatherapi.com/v1/forecast.json?q=London&key=KEY&days=7"
        );
    }

    #[test]
    fn validate_requires_credential() {
        assert_eq!(
            lookup(None).validate("London"),
            Err(FetchError::MissingCredential)
        );
        assert_eq!(
            lookup(Some("  ")).validate("London"),
            Err(FetchError::MissingCredential)
        );
        assert_eq!(lookup(Some("KEY")).validate("  "), Err(FetchError::EmptyLocation));
        assert!(lookup(Some("KEY")).validate("London").is_ok());
    }

    #[test]
    fn normalizes_current_and_forecast() {
        let report = normalize(current_body(), forecast_body()).unwrap();

        assert_eq!(report.location_name, "London");
        assert_eq!(report.local_time, "2024-05-01 10:00");
        assert_eq!(report.current.temperature_celsius, 21.5);
        assert_eq!(report.current.condition_text, "Cloudy");
        assert_eq!(report.current.icon_ref, "//x/cloud.png");

        let dates: Vec<_> = report.forecast.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);
        assert_eq!(report.forecast[1].condition.text, "Rain");
        assert_eq!(report.forecast[1].min_temp_celsius, 11.0);
    }

    #[test]
    fn empty_forecast_is_allowed() {
        let report = normalize(current_body(), json!({ "forecast": { "forecastday": [] } })).unwrap();
        assert!(report.forecast.is_empty());
    }

    #[test]
    fn missing_current_field_is_shape_error() {
        let mut body = current_body();
        body["current"].as_object_mut().unwrap().remove("temp_c");

        let err = normalize(body, forecast_body()).unwrap_err();
        assert!(matches!(err, FetchError::Shape(ref m) if m.contains("temp_c")));
    }

    #[test]
    fn missing_forecast_is_shape_error() {
        let err = normalize(current_body(), json!({ "location": {} })).unwrap_err();
        assert!(matches!(err, FetchError::Shape(ref m) if m.starts_with("forecast")));
    }

    #[test]
    fn non_iso_date_is_shape_error() {
        let mut body = forecast_body();
        body["forecast"]["forecastday"][0]["date"] = json!("01/05/2024");

        let err = normalize(current_body(), body).unwrap_err();
        assert!(matches!(err, FetchError::Shape(ref m) if m.contains("01/05/2024")));
    }
}
