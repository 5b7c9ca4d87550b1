use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    FetchError, FetchPayload,
    config::RegionConfig,
    provider::{ResolutionStrategy, StrategyKind, endpoint},
    transport::Transport,
};

/// Fixed-key lookup against Open-Meteo: each known key maps to a
/// pre-built hourly temperature request. The body is not normalized.
#[derive(Debug, Clone)]
pub struct RegionLookup {
    base_url: Url,
    regions: BTreeMap<String, RegionConfig>,
}

impl RegionLookup {
    pub fn new(base_url: Url, regions: BTreeMap<String, RegionConfig>) -> Self {
        Self { base_url, regions }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    pub fn request_url(&self, key: &str) -> Result<Url, FetchError> {
        let region = self.regions.get(key).ok_or_else(|| self.unknown(key))?;
        let latitude = region.latitude.to_string();
        let longitude = region.longitude.to_string();

        Ok(endpoint(
            &self.base_url,
            "forecast",
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("hourly", "temperature_2m"),
            ],
        ))
    }

    fn unknown(&self, key: &str) -> FetchError {
        FetchError::UnknownLocation {
            key: key.to_string(),
            supported: self.keys().collect::<Vec<_>>().join(", "),
        }
    }
}

#[async_trait]
impl ResolutionStrategy for RegionLookup {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Region
    }

    fn validate(&self, location_key: &str) -> Result<(), FetchError> {
        if self.regions.contains_key(location_key) {
            Ok(())
        } else {
            Err(self.unknown(location_key))
        }
    }

    async fn fetch(
        &self,
        location_key: &str,
        transport: &dyn Transport,
    ) -> Result<FetchPayload, FetchError> {
        let url = self.request_url(location_key)?;
        let body = transport.get_json(&url).await?;

        Ok(FetchPayload::Region {
            key: location_key.to_string(),
            body,
        })
    }
}
