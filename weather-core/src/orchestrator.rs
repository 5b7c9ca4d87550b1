//! Fetch orchestrator: drives one dispatch from location key to a terminal
//! store transition.

use std::sync::Arc;

use tracing::Instrument;

use crate::{
    provider::ResolutionStrategy,
    store::{RequestId, WeatherStore},
    transport::Transport,
};

/// Issues provider requests for a location and records the outcome in the
/// store. Cheap to share; concurrent dispatches are independent.
#[derive(Debug)]
pub struct Orchestrator {
    store: Arc<WeatherStore>,
    transport: Arc<dyn Transport>,
    strategy: Box<dyn ResolutionStrategy>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<WeatherStore>,
        transport: Arc<dyn Transport>,
        strategy: Box<dyn ResolutionStrategy>,
    ) -> Self {
        Self {
            store,
            transport,
            strategy,
        }
    }

    pub fn store(&self) -> &Arc<WeatherStore> {
        &self.store
    }

    pub fn strategy(&self) -> &dyn ResolutionStrategy {
        self.strategy.as_ref()
    }

    /// Fetches weather for `location_key`.
    ///
    /// Never fails: every outcome lands in the store. Precondition failures
    /// commit `Failed` without passing through `Loading` and without any
    /// transport call. Otherwise `Loading` is committed before the first
    /// await, followed by exactly one of `Succeeded` or `Failed`.
    pub async fn dispatch_fetch(&self, location_key: &str) {
        let span = tracing::info_span!(
            "dispatch_fetch",
            strategy = %self.strategy.kind(),
            location = location_key,
        );

        if let Err(err) = self.strategy.validate(location_key) {
            let _guard = span.enter();
            tracing::warn!(error = %err, "rejected before dispatch");
            self.store.on_request_rejected(err.user_message());
            return;
        }

        let request = self.store.on_request_started();
        self.run(request, location_key).instrument(span).await;
    }

    async fn run(&self, request: RequestId, location_key: &str) {
        match self.strategy.fetch(location_key, self.transport.as_ref()).await {
            Ok(payload) => {
                let applied = self.store.on_request_succeeded(request, payload);
                tracing::info!(request = request.get(), applied, "weather fetch succeeded");
            }
            Err(err) => {
                let applied = self.store.on_request_failed(request, err.user_message());
                tracing::warn!(request = request.get(), applied, error = %err, "weather fetch failed");
            }
        }
    }
}
