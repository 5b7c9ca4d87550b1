//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - The weather state store and its lifecycle transitions
//! - The fetch orchestrator that drives them
//! - Resolution strategies (by-city, fixed region key) over a pluggable HTTP transport
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;
pub mod transport;

pub use config::{Config, RegionConfig};
pub use error::{FetchError, TransportError};
pub use model::{
    Condition, CurrentConditions, FetchPayload, ForecastDay, Status, WeatherReport,
    WeatherSnapshot,
};
pub use orchestrator::Orchestrator;
pub use provider::{ResolutionStrategy, StrategyKind};
pub use store::{RequestId, StalePolicy, SubscriptionId, WeatherStore};
pub use transport::{HttpTransport, Transport};
