/// HTTP client for the tag generation backend.
///
/// This module provides `TagGenerationClient` for the blocking
/// `POST /api/ai/generate-tags` call, along with its error type, request and
/// response shapes, and a builder for configuration.
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::TagMap;

/// Default bound on one generation call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 240;

/// Errors that can occur when calling the tag generation backend.
#[derive(Debug, Error)]
pub enum AiError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The call did not finish within the configured bound
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: status {status}: {body}")]
    Http { status: u16, body: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Backend answered with `status: "error"` or an unusable payload
    #[error("Tag generation failed: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl AiError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error)
        } else {
            Self::Network(error)
        }
    }
}

/// Which kind of tags to generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Free-text descriptive tags per category.
    #[default]
    Seo,
    /// Weights for the fixed wizard tag ids.
    Wizard,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seo => write!(f, "seo"),
            Self::Wizard => write!(f, "wizard"),
        }
    }
}

/// Body of a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateTagsRequest {
    pub location_name: String,
    pub description: String,
    pub services: Value,
    pub language: String,
    pub mode: GenerationMode,
}

/// Per-category weights returned in wizard mode, keyed by tag id.
pub type TagWeights = BTreeMap<String, BTreeMap<String, f64>>;

/// Parsed generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum TagSuggestion {
    /// Proposed tag strings per category.
    Seo(TagMap),
    /// Weighted wizard tag ids per category.
    Wizard(TagWeights),
}

#[derive(Debug, Deserialize)]
struct GenerateTagsResponse {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl GenerateTagsResponse {
    fn into_suggestion(self, mode: GenerationMode) -> Result<TagSuggestion, AiError> {
        if self.status != "success" {
            return Err(AiError::Api {
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        let data = self.data.ok_or_else(|| AiError::Api {
            message: "Missing 'data' field in response".to_string(),
        })?;

        match mode {
            GenerationMode::Seo => Ok(TagSuggestion::Seo(TagMap::from_value(&data))),
            GenerationMode::Wizard => {
                let weights = match data.get("weights") {
                    Some(weights) => serde_json::from_value(weights.clone())
                        .map_err(AiError::Serialization)?,
                    None => TagWeights::new(),
                };
                Ok(TagSuggestion::Wizard(weights))
            }
        }
    }
}

/// Parses a raw response body for the given mode.
pub fn parse_response(body: &str, mode: GenerationMode) -> Result<TagSuggestion, AiError> {
    let response: GenerateTagsResponse =
        serde_json::from_str(body).map_err(AiError::Serialization)?;
    response.into_suggestion(mode)
}

/// Builder for constructing `TagGenerationClient` instances.
///
/// # Examples
///
/// ```
/// use loctag::ai::TagGenerationClientBuilder;
///
/// let client = TagGenerationClientBuilder::new()
///     .base_url("http://localhost:8000")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.base_url(), "http://localhost:8000");
/// ```
#[derive(Debug, Default)]
pub struct TagGenerationClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl TagGenerationClientBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the backend.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bound on one generation call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// Defaults to `http://localhost:8000` and a 240 second timeout.
    pub fn build(self) -> Result<TagGenerationClient, AiError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://localhost:8000".to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| AiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(AiError::Network)?;

        Ok(TagGenerationClient { client, base_url })
    }
}

/// Source of generated tags.
///
/// This trait enables mocking in unit tests.
pub trait TagGenerator {
    /// Generates tags for one location. Attempted once; never retried.
    fn generate_tags(&self, request: &GenerateTagsRequest) -> Result<TagSuggestion, AiError>;
}

/// Blocking HTTP client for the tag generation backend.
pub struct TagGenerationClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TagGenerationClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl TagGenerator for TagGenerationClient {
    fn generate_tags(&self, request: &GenerateTagsRequest) -> Result<TagSuggestion, AiError> {
        let url = format!("{}/api/ai/generate-tags", self.base_url);
        debug!(%url, mode = %request.mode, location = %request.location_name, "requesting tags");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(AiError::from_reqwest)?;

        let status = response.status();
        let body = response.text().map_err(AiError::from_reqwest)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "tag generation returned an error status");
            return Err(AiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body, request.mode)
    }
}
