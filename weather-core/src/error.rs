use thiserror::Error;

/// Message used when a failure carries no usable text of its own.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to fetch weather data";

/// Failure of the underlying HTTP capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("{0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be read or was not JSON.
    #[error("{0}")]
    Body(String),
}

/// Everything that can end a dispatch in `Failed`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("API key is missing or invalid")]
    MissingCredential,

    #[error("Location must not be empty")]
    EmptyLocation,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Provider answered, but not in the shape we normalize.
    #[error("Unexpected provider response: {0}")]
    Shape(String),

    #[error("Unknown location key '{key}'. Supported keys: {supported}.")]
    UnknownLocation { key: String, supported: String },
}

impl FetchError {
    pub fn shape(err: impl std::fmt::Display) -> Self {
        FetchError::Shape(err.to_string())
    }

    /// Human-readable text written into `WeatherSnapshot::error`.
    pub fn user_message(&self) -> String {
        let msg = self.to_string();
        if msg.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE.to_string()
        } else {
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_is_passed_through() {
        let err = FetchError::from(TransportError::Network("Network Error".into()));
        assert_eq!(err.user_message(), "Network Error");
    }

    #[test]
    fn empty_transport_message_falls_back() {
        let err = FetchError::from(TransportError::Network(String::new()));
        assert_eq!(err.user_message(), DEFAULT_FAILURE_MESSAGE);

        let err = FetchError::from(TransportError::Body("   ".into()));
        assert_eq!(err.user_message(), DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn missing_credential_has_fixed_message() {
        assert_eq!(
            FetchError::MissingCredential.user_message(),
            "API key is missing or invalid"
        );
    }

    #[test]
    fn unknown_location_lists_supported_keys() {
        let err = FetchError::UnknownLocation {
            key: "atlantis".into(),
            supported: "pakistan, saudiArabia".into(),
        };
        let msg = err.user_message();
        assert!(msg.contains("atlantis"));
        assert!(msg.contains("pakistan, saudiArabia"));
    }

    #[test]
    fn status_error_mentions_code() {
        let err = FetchError::from(TransportError::Status {
            status: 401,
            body: "{\"error\":\"bad key\"}".into(),
        });
        assert!(err.user_message().contains("status code 401"));
    }
}
