//! Gemini backend implementation
//!
//! HTTP client for the Google generative-language API
//! (`generativelanguage.googleapis.com`). One request per operation, no
//! streaming; the caller decides which model to use per request.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required)
//! - `GEMINI_MODEL`: Default model name (default: gemini-2.0-flash)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::AiBackend;

/// Default production endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for insight generation and question answering
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini backend
///
/// Talks to the `v1beta` `generateContent` endpoint. The base URL is
/// overridable so tests can point at a local mock server.
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend against the production endpoint
    pub fn new(api_key: &str, default_model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            default_model: default_model.to_string(),
        }
    }

    /// Create a backend against a custom base URL (used by tests)
    pub fn with_base_url(base_url: &str, api_key: &str, default_model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            default_model: default_model.to_string(),
        }
    }

    /// Create a new instance with a different default model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            http_client: self.http_client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            default_model: model.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_MODEL` (default: gemini-2.0-flash)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(&api_key, &model))
    }
}

/// Request to the generateContent endpoint
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

/// Response from the generateContent endpoint
///
/// Only the fields we read; the API returns more (safety ratings, usage
/// metadata) which serde ignores.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[async_trait]
impl AiBackend for GeminiBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http_client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Http(response.error_for_status().unwrap_err()));
        }

        let body: GenerateContentResponse = response.json().await?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Backend("Empty response from Gemini".into()))?;

        debug!(model = %model, "Gemini response: {}", text);

        Ok(text)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1beta/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let backend = GeminiBackend::with_base_url("http://localhost:8080/", "key", "m");
        assert_eq!(backend.host(), "http://localhost:8080");
    }

    #[test]
    fn test_with_model() {
        let backend = GeminiBackend::new("key", DEFAULT_MODEL);
        let lite = backend.with_model("gemini-2.5-flash-lite");
        assert_eq!(lite.model(), "gemini-2.5-flash-lite");
        assert_eq!(backend.model(), DEFAULT_MODEL);
    }
}
