//! Pluggable AI backend abstraction
//!
//! This module provides a backend-agnostic interface for the one external
//! dependency the crate has: generate text from a named model given a prompt.
//!
//! # Architecture
//!
//! - `AiBackend` trait: defines the interface for all AI operations
//! - `AiClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! // Create from environment
//! let ai = AiClient::from_env();
//!
//! if let Some(client) = ai {
//!     let generator = InsightGenerator::new(client);
//!     let insights = generator.expense_insights(&expenses).await;
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_MODEL`: Default model name (default: gemini-2.0-flash)

mod gemini;
mod mock;
pub mod parsing;

pub use gemini::{GeminiBackend, DEFAULT_MODEL};
pub use mock::MockBackend;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generate text from a named model given a prompt
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the default model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
/// All variants implement the same AiBackend operations.
#[derive(Clone)]
pub enum AiClient {
    /// Gemini backend (generativelanguage HTTP API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AiClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY and GEMINI_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(AiClient::Gemini),
            "mock" => Some(AiClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AiClient::Gemini)
            }
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(api_key: &str, model: &str) -> Self {
        AiClient::Gemini(GeminiBackend::new(api_key, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AiClient::Mock(MockBackend::new())
    }
}

// Implement AiBackend for AiClient by delegating to the inner backend
#[async_trait]
impl AiBackend for AiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        match self {
            AiClient::Gemini(b) => b.generate(model, prompt).await,
            AiClient::Mock(b) => b.generate(model, prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AiClient::Gemini(b) => b.health_check().await,
            AiClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AiClient::Gemini(b) => b.model(),
            AiClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AiClient::Gemini(b) => b.host(),
            AiClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AiClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AiClient::mock();
        assert!(client.health_check().await);
    }
}
