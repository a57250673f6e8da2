//! Tally AI Layer
//!
//! AI-powered features for the Tally personal finance app:
//! - Insight generation from expense records
//! - Auto-categorization of free-text expense descriptions
//! - Free-form question answering over expense history
//!
//! The hard problems (natural-language understanding, categorization,
//! reasoning) are delegated to a hosted model; this crate is the thin
//! orchestration layer around it: prompt rendering, one round trip per
//! operation, defensive response parsing, and safe fallback values. No
//! public operation ever returns an error — callers always get a usable
//! value so the UI degrades gracefully when the model is unavailable.

pub mod ai;
pub mod error;
pub mod insights;
pub mod models;
pub mod prompts;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AiBackend, AiClient, GeminiBackend, MockBackend};
pub use error::{Error, Result};
pub use insights::InsightGenerator;
pub use models::{Category, ExpenseRecord, Insight, InsightKind};
pub use prompts::{Prompt, PromptId, PromptLibrary};
