//! Test utilities for tally-ai
//!
//! This module provides testing infrastructure including a mock Gemini server
//! that can be used for development and integration tests.

use axum::{
    extract::{Json, Path},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock Gemini server for testing and development
///
/// Implements just enough of the generativelanguage API surface:
/// `GET /v1beta/models` (health check) and
/// `POST /v1beta/models/{model}:generateContent`.
pub struct MockGeminiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/v1beta/models", get(handle_models))
            .route("/v1beta/models/:model_action", post(handle_generate));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Models listing endpoint (health check)
async fn handle_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: vec![ModelInfo {
            name: "models/gemini-2.0-flash".to_string(),
        }],
    })
}

/// generateContent endpoint
async fn handle_generate(
    Path(model_action): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Json<GenerateResponse> {
    let prompt = request
        .contents
        .first()
        .and_then(|c| c.parts.first())
        .map(|p| p.text.as_str())
        .unwrap_or("");

    // Detect what type of request this is based on prompt content.
    // These patterns match the prompt files in prompts/*.md
    let text = if prompt.contains("Respond with only the category name") {
        categorize_mock(prompt)
    } else if prompt.contains("Return only valid JSON array") {
        // Fenced on purpose: real models wrap JSON in Markdown fences
        "```json\n[\n  {\"type\": \"warning\", \"title\": \"High food spending\", \"message\": \"Food is your largest category this month.\", \"action\": \"Set a weekly food budget\", \"confidence\": 0.85},\n  {\"type\": \"tip\", \"title\": \"Trim subscriptions\", \"message\": \"Two streaming services overlap.\", \"confidence\": 0.7},\n  {\"type\": \"success\", \"title\": \"Transport under control\", \"message\": \"Transport spending fell versus last month.\", \"confidence\": 0.8}\n]\n```"
            .to_string()
    } else {
        "You spent the most on Food this month. Consider setting a weekly budget of $80 \
         to bring it down."
            .to_string()
    };

    let model = model_action
        .split(':')
        .next()
        .unwrap_or(&model_action)
        .to_string();

    Json(GenerateResponse {
        model_version: model,
        candidates: vec![Candidate {
            content: CandidateContent {
                parts: vec![TextPart { text }],
                role: "model".to_string(),
            },
            finish_reason: "STOP".to_string(),
        }],
    })
}

/// Canned categorization keyed off the quoted description
fn categorize_mock(prompt: &str) -> String {
    let lower = prompt.to_lowercase();
    if lower.contains("coffee") || lower.contains("pizza") || lower.contains("grocery") {
        "Food".to_string()
    } else if lower.contains("uber") || lower.contains("gas") {
        "Transportation".to_string()
    } else if lower.contains("pharmacy") {
        "Healthcare".to_string()
    } else if lower.contains("invented") {
        // Deliberately outside the fixed label set
        "Groceries".to_string()
    } else {
        "Other".to_string()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Deserialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    #[serde(rename = "modelVersion")]
    model_version: String,
    candidates: Vec<Candidate>,
}

#[derive(Debug, Serialize)]
struct Candidate {
    content: CandidateContent,
    #[serde(rename = "finishReason")]
    finish_reason: String,
}

#[derive(Debug, Serialize)]
struct CandidateContent {
    parts: Vec<TextPart>,
    role: String,
}

#[derive(Debug, Serialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
}
