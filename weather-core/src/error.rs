//! Error taxonomy shared by providers, resolvers and the aggregator.

use thiserror::Error;

use crate::provider::ProviderId;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("No geocoding match for '{0}'")]
    NotFound(String),

    #[error("{service} request failed with status {status}: {body}")]
    UpstreamUnavailable {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} request timed out")]
    UpstreamTimeout { service: &'static str },

    #[error("Failed to reach {service}: {source}")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected {service} payload: {detail}")]
    UpstreamData {
        service: &'static str,
        detail: String,
    },

    #[error(
        "No API key configured for provider '{0}'.\n\
         Hint: run `city-weather configure {0}` or set the matching environment variable."
    )]
    MissingCredentials(ProviderId),
}

impl WeatherError {
    /// Classify a transport error from `reqwest` for the given upstream.
    pub fn from_transport(service: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::UpstreamTimeout { service }
        } else {
            Self::Network { service, source }
        }
    }

    /// User-friendly message for the error pages.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(city) => format!("We couldn't find a place called '{city}'."),
            Self::UpstreamUnavailable { service, .. } | Self::Network { service, .. } => {
                format!("The {service} service is unavailable right now. Please try again later.")
            }
            Self::UpstreamTimeout { service } => {
                format!("The {service} service took too long to answer. Please try again.")
            }
            Self::UpstreamData { service, .. } => {
                format!("The {service} service sent data we couldn't read.")
            }
            Self::MissingCredentials(_) => "The server is missing an API key.".to_string(),
        }
    }

    /// Whether the failure is on the user's side (bad input) rather than upstream.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
