use crate::{
    Config, FetchError, FetchPayload,
    provider::{openmeteo::RegionLookup, weatherapi::CityLookup},
    transport::Transport,
};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use std::fmt::Debug;

pub mod openmeteo;
pub mod weatherapi;

/// How a location key is turned into provider requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Free-text city name against WeatherAPI.com.
    City,
    /// Closed set of named regions against Open-Meteo.
    Region,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::City => "city",
            StrategyKind::Region => "region",
        }
    }

    pub const fn all() -> &'static [StrategyKind] {
        &[StrategyKind::City, StrategyKind::Region]
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StrategyKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "city" => Ok(StrategyKind::City),
            "region" => Ok(StrategyKind::Region),
            _ => Err(anyhow!(
                "Unknown strategy '{value}'. Supported strategies: city, region."
            )),
        }
    }
}

/// Resolution strategy the orchestrator is polymorphic over.
#[async_trait]
pub trait ResolutionStrategy: Send + Sync + Debug {
    fn kind(&self) -> StrategyKind;

    /// Checks everything that can be known before any I/O.
    fn validate(&self, location_key: &str) -> Result<(), FetchError>;

    /// Performs the provider call(s) and normalizes the result.
    async fn fetch(
        &self,
        location_key: &str,
        transport: &dyn Transport,
    ) -> Result<FetchPayload, FetchError>;
}

/// Construct a strategy from config and explicit StrategyKind.
pub fn strategy_from_config(
    kind: StrategyKind,
    config: &Config,
) -> anyhow::Result<Box<dyn ResolutionStrategy>> {
    let boxed: Box<dyn ResolutionStrategy> = match kind {
        StrategyKind::City => {
            let base = parse_base_url(&config.weatherapi_base_url)?;
            Box::new(CityLookup::new(config.effective_api_key(), base, config.forecast_days))
        }
        StrategyKind::Region => {
            let base = parse_base_url(&config.open_meteo_base_url)?;
            Box::new(RegionLookup::new(base, config.regions.clone()))
        }
    };

    Ok(boxed)
}

/// Construct the default strategy from config, using `default_strategy` field.
pub fn default_strategy_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn ResolutionStrategy>> {
    let kind = config.default_strategy_kind()?;
    strategy_from_config(kind, config)
}

/// Parses a provider base URL such as `http://api.weatherapi.com/v1`.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid provider base URL '{raw}'"))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("Provider base URL '{raw}' cannot carry a path"));
    }
    Ok(url)
}

/// `base` + `/name` + query pairs, in the order given.
pub(crate) fn endpoint(base: &Url, name: &str, query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name);
    }
    url.query_pairs_mut().extend_pairs(query);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_kind_as_str_roundtrip() {
        for kind in StrategyKind::all() {
            let parsed = StrategyKind::try_from(kind.as_str()).expect("roundtrip should succeed");
            assert_eq!(*kind, parsed);
        }
        assert_eq!(StrategyKind::try_from("CITY").unwrap(), StrategyKind::City);
    }

    #[test]
    fn unknown_strategy_error() {
        let err = StrategyKind::try_from("satellite").unwrap_err();
        assert!(err.to_string().contains("Unknown strategy"));
    }

    #[test]
    fn strategy_from_config_honours_kind() {
        let cfg = Config::default();
        for kind in StrategyKind::all() {
            let strategy = strategy_from_config(*kind, &cfg).unwrap();
            assert_eq!(strategy.kind(), *kind);
        }
    }

    #[test]
    fn default_strategy_from_config_uses_configured_kind() {
        let mut cfg = Config::default();
        assert_eq!(default_strategy_from_config(&cfg).unwrap().kind(), StrategyKind::City);

        cfg.set_default_strategy(StrategyKind::Region);
        assert_eq!(default_strategy_from_config(&cfg).unwrap().kind(), StrategyKind::Region);
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let cfg = Config {
            weatherapi_base_url: "not a url".into(),
            ..Config::default()
        };
        let err = strategy_from_config(StrategyKind::City, &cfg).unwrap_err();
        assert!(err.to_string().contains("Invalid provider base URL"));

        assert!(parse_base_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn endpoint_appends_path_and_query() {
        let base = parse_base_url("http://api.weatherapi.com/v1").unwrap();
        let url = endpoint(&base, "current.json", &[("q", "New York"), ("key", "K")]);
        assert_eq!(
            url.as_str(),
            "http://api.weatherapi.com/v1/current.json?q=New+York&key=K"
        );

        let base = parse_base_url("http://api.weatherapi.com/v1/").unwrap();
        let url = endpoint(&base, "forecast.json", &[("days", "7")]);
        assert_eq!(url.as_str(), "http://api.weatherapi.com/v1/forecast.json?days=7");
    }
}
