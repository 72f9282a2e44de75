//! Turning free-text user input into a city name.

use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

use crate::{
    Config, WeatherError,
    provider::ProviderId,
    resolver::openai::{ChatModel, OpenAiChat},
};

pub mod openai;

const SYSTEM_PROMPT: &str = "You extract city names from user queries. \
    Answer with the city name only, no extra text. \
    It must be a city, not a country.";

/// Which resolver strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    PassThrough,
    Assisted,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverKind::PassThrough => "passthrough",
            ResolverKind::Assisted => "assisted",
        }
    }

    pub const fn all() -> &'static [ResolverKind] {
        &[ResolverKind::PassThrough, ResolverKind::Assisted]
    }
}

impl std::fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResolverKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "passthrough" | "pass-through" => Ok(ResolverKind::PassThrough),
            "assisted" => Ok(ResolverKind::Assisted),
            _ => Err(anyhow::anyhow!(
                "Unknown resolver '{value}'. Supported resolvers: passthrough, assisted."
            )),
        }
    }
}

/// Outcome of resolving a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// Nothing city-like came out; `raw` is what the resolver produced instead.
    Unresolved { raw: String },
}

impl Resolution {
    pub fn city(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(city) => Some(city),
            Resolution::Unresolved { .. } => None,
        }
    }

    /// User-facing explanation for an unresolved query, embedding the raw output.
    pub fn fallback_message(&self) -> Option<String> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Unresolved { raw } => Some(format!(
                "Oops! Looks like I couldn't find the city you are looking for. \
                 But here's what I got: '{raw}'. Try asking again!"
            )),
        }
    }
}

#[async_trait]
pub trait CityResolver: Send + Sync + Debug {
    async fn resolve(&self, query: &str) -> Result<Resolution, WeatherError>;
}

/// Hands the user's text straight to the geocoder.
#[derive(Debug, Clone, Default)]
pub struct PassThroughResolver;

#[async_trait]
impl CityResolver for PassThroughResolver {
    async fn resolve(&self, query: &str) -> Result<Resolution, WeatherError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Resolution::Unresolved { raw: String::new() });
        }
        Ok(Resolution::Resolved(trimmed.to_string()))
    }
}

/// Asks a chat model to pull the city out of the query, then sanity-checks the answer.
#[derive(Debug)]
pub struct AssistedResolver {
    model: Box<dyn ChatModel>,
}

impl AssistedResolver {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl CityResolver for AssistedResolver {
    async fn resolve(&self, query: &str) -> Result<Resolution, WeatherError> {
        let user = format!(
            "The user asked: '{}'. Extract the city name for this query.",
            query.trim()
        );

        let reply = self.model.complete(SYSTEM_PROMPT, &user).await?;
        let reply = reply.trim().to_string();

        if is_plausible_city(&reply) {
            tracing::info!(query, city = %reply, "Resolved city");
            Ok(Resolution::Resolved(reply))
        } else {
            tracing::info!(query, raw = %reply, "Model reply is not a city name");
            Ok(Resolution::Unresolved { raw: reply })
        }
    }
}

/// Non-empty, letters, whitespace and hyphens only.
pub fn is_plausible_city(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-')
}

/// Construct the configured resolver.
pub fn resolver_from_config(config: &Config) -> anyhow::Result<Box<dyn CityResolver>> {
    let kind = config.default_resolver_kind()?;

    let boxed: Box<dyn CityResolver> = match kind {
        ResolverKind::PassThrough => Box::new(PassThroughResolver),
        ResolverKind::Assisted => {
            let api_key = config
                .provider_api_key(ProviderId::OpenAi)
                .ok_or(WeatherError::MissingCredentials(ProviderId::OpenAi))?;
            let chat = OpenAiChat::new(api_key.to_owned(), &config.upstream)?;
            Box::new(AssistedResolver::new(Box::new(chat)))
        }
    };

    tracing::debug!(resolver = %kind, "Resolver configured");
    Ok(boxed)
}
