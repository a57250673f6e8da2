//! AI-generated expense insights, categorization, and Q&A
//!
//! `InsightGenerator` is the public surface of this crate: three operations
//! that render a prompt, make one round trip to the AI backend, and
//! defensively parse the result. None of them ever returns an error to the
//! caller; every failure (network, auth, parse, validation) is logged and
//! replaced with a deterministic safe value so the app's insights panel,
//! auto-categorization, and Q&A degrade gracefully instead of crashing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::warn;

use crate::ai::parsing::{normalize_insight, parse_category, parse_insight_array};
use crate::ai::{AiBackend, AiClient};
use crate::error::{Error, Result};
use crate::models::{Category, ExpenseRecord, Insight, InsightKind};
use crate::prompts::{expense_data, PromptId, PromptLibrary};

/// Lighter-weight model used for categorization
pub const CATEGORIZE_MODEL: &str = "gemini-2.5-flash-lite";

/// Fixed answer returned when question answering fails
const ANSWER_FALLBACK: &str =
    "I'm unable to provide a detailed answer at the moment. Please try again.";

/// Generator for AI-powered insight, categorization, and answer operations
///
/// Stateless between calls: each invocation is independent and carries its
/// own prompt and response. Concurrent calls share nothing but the client.
#[derive(Clone)]
pub struct InsightGenerator {
    client: AiClient,
    /// Model for insight generation and question answering
    insight_model: String,
    /// Lighter model for categorization
    categorize_model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl InsightGenerator {
    /// Create a generator with the default model pair
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            insight_model: crate::ai::DEFAULT_MODEL.to_string(),
            categorize_model: CATEGORIZE_MODEL.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Create a generator with explicit model identifiers
    pub fn with_models(client: AiClient, insight_model: &str, categorize_model: &str) -> Self {
        Self {
            client,
            insight_model: insight_model.to_string(),
            categorize_model: categorize_model.to_string(),
            prompts: Arc::new(RwLock::new(PromptLibrary::new())),
        }
    }

    /// Generate 3-4 insights from a set of expense records
    ///
    /// Never fails: on any error the result is a single fixed fallback
    /// insight (id `fallback-1`) inviting the user to retry. It is
    /// all-fallback or all-success, never partial.
    pub async fn expense_insights(&self, expenses: &[ExpenseRecord]) -> Vec<Insight> {
        match self.try_expense_insights(expenses).await {
            Ok(insights) => insights,
            Err(e) => {
                warn!(error = %e, "Failed to generate expense insights, returning fallback");
                vec![fallback_insight()]
            }
        }
    }

    async fn try_expense_insights(&self, expenses: &[ExpenseRecord]) -> Result<Vec<Insight>> {
        let data = expense_data(expenses);

        let prompt = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::ExpenseInsights)?;
            let mut vars = HashMap::new();
            vars.insert("expense_data", data.as_str());
            template.render(&vars)
        };

        let response = self.client.generate(&self.insight_model, &prompt).await?;
        let raws = parse_insight_array(&response)?;

        if raws.is_empty() {
            return Err(Error::InvalidData("AI returned an empty insight array".into()));
        }

        // Ids are unique within this call: shared timestamp, per-element index
        let millis = Utc::now().timestamp_millis();
        Ok(raws
            .into_iter()
            .enumerate()
            .map(|(i, raw)| normalize_insight(raw, format!("ai-{}-{}", millis, i)))
            .collect())
    }

    /// Classify a free-text expense description into a fixed category
    ///
    /// Never fails: any deviation from the seven known labels, and any
    /// backend error, yields `Category::Other`.
    pub async fn categorize(&self, description: &str) -> Category {
        match self.try_categorize(description).await {
            Ok(category) => category,
            Err(e) => {
                warn!(error = %e, description = %description, "Failed to categorize expense");
                Category::Other
            }
        }
    }

    async fn try_categorize(&self, description: &str) -> Result<Category> {
        let prompt = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::CategorizeExpense)?;
            let mut vars = HashMap::new();
            vars.insert("description", description);
            template.render(&vars)
        };

        let response = self.client.generate(&self.categorize_model, &prompt).await?;
        Ok(parse_category(&response))
    }

    /// Answer a free-form question about expense history
    ///
    /// Never fails: any backend error (or an empty response) yields a fixed
    /// apology string suggesting retry. The successful response is returned
    /// trimmed but otherwise verbatim.
    pub async fn answer(&self, question: &str, context: &[ExpenseRecord]) -> String {
        match self.try_answer(question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Failed to generate AI answer, returning fallback");
                ANSWER_FALLBACK.to_string()
            }
        }
    }

    async fn try_answer(&self, question: &str, context: &[ExpenseRecord]) -> Result<String> {
        let data = expense_data(context);

        let prompt = {
            let mut prompts = self
                .prompts
                .write()
                .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
            let template = prompts.get(PromptId::AnswerQuestion)?;
            let mut vars = HashMap::new();
            vars.insert("question", question);
            vars.insert("expense_data", data.as_str());
            template.render(&vars)
        };

        let response = self.client.generate(&self.insight_model, &prompt).await?;
        let answer = response.trim();

        if answer.is_empty() {
            return Err(Error::InvalidData("AI returned an empty answer".into()));
        }

        Ok(answer.to_string())
    }
}

/// The fixed insight returned when generation fails
fn fallback_insight() -> Insight {
    Insight {
        id: "fallback-1".to_string(),
        kind: InsightKind::Info,
        title: "AI Analysis Unavailable".to_string(),
        message: "Unable to generate personalized insights at this time. Please try again later."
            .to_string(),
        action: Some("Refresh insights".to_string()),
        confidence: 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    fn records() -> Vec<ExpenseRecord> {
        vec![
            ExpenseRecord {
                id: "e1".to_string(),
                amount: 42.0,
                category: "Food".to_string(),
                description: "Groceries".to_string(),
                date: "2024-03-01".to_string(),
            },
            ExpenseRecord {
                id: "e2".to_string(),
                amount: 15.49,
                category: "Entertainment".to_string(),
                description: "Streaming".to_string(),
                date: "2024-03-02".to_string(),
            },
        ]
    }

    fn generator_with_reply(reply: &str) -> InsightGenerator {
        InsightGenerator::new(AiClient::Mock(MockBackend::with_reply(reply)))
    }

    fn failing_generator() -> InsightGenerator {
        InsightGenerator::new(AiClient::Mock(MockBackend::failing()))
    }

    #[tokio::test]
    async fn test_expense_insights_fenced_response() {
        let generator = generator_with_reply(
            "```json\n[{\"type\":\"tip\",\"title\":\"T\",\"message\":\"M\",\"confidence\":0.9}]\n```",
        );

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Tip);
        assert_eq!(insights[0].title, "T");
        assert_eq!(insights[0].message, "M");
        assert_eq!(insights[0].confidence, 0.9);
        assert!(insights[0].action.is_none());
        assert!(insights[0].id.starts_with("ai-"));
    }

    #[tokio::test]
    async fn test_expense_insights_applies_defaults() {
        let generator = generator_with_reply("[{}]");

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(insights[0].title, "AI Insight");
        assert_eq!(insights[0].message, "Analysis complete");
        assert_eq!(insights[0].confidence, 0.8);
    }

    #[tokio::test]
    async fn test_expense_insights_ids_unique_within_call() {
        let generator = generator_with_reply("[{}, {}, {}]");

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 3);
        let mut ids: Vec<_> = insights.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn test_expense_insights_fallback_on_backend_failure() {
        let generator = failing_generator();

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "fallback-1");
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(insights[0].title, "AI Analysis Unavailable");
        assert_eq!(insights[0].confidence, 0.5);
    }

    #[tokio::test]
    async fn test_expense_insights_fallback_on_non_json() {
        let generator = generator_with_reply("Sorry, I can't help with that.");

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "fallback-1");
    }

    #[tokio::test]
    async fn test_expense_insights_fallback_on_long_multibyte_response() {
        // Non-JSON multibyte text longer than the error-preview limit must
        // hit the fallback, not panic
        let generator = generator_with_reply(&"あ".repeat(100));

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "fallback-1");
    }

    #[tokio::test]
    async fn test_expense_insights_fallback_on_empty_array() {
        let generator = generator_with_reply("[]");

        let insights = generator.expense_insights(&records()).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].id, "fallback-1");
    }

    #[tokio::test]
    async fn test_expense_insights_empty_input_still_prompts() {
        let generator = generator_with_reply("[{\"type\":\"info\"}]");

        let insights = generator.expense_insights(&[]).await;
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
        // A real response, not the fallback
        assert_ne!(insights[0].id, "fallback-1");
    }

    #[tokio::test]
    async fn test_cloned_generator_shares_client_and_prompts() {
        let generator = generator_with_reply("Transportation");
        let clone = generator.clone();
        assert_eq!(clone.categorize("Uber ride").await, Category::Transportation);
    }

    #[tokio::test]
    async fn test_categorize_known_label() {
        let generator = generator_with_reply("Transportation");
        assert_eq!(generator.categorize("Uber ride").await, Category::Transportation);
    }

    #[tokio::test]
    async fn test_categorize_unknown_label_is_other() {
        let generator = generator_with_reply("Groceries");
        assert_eq!(generator.categorize("Weekly shop").await, Category::Other);
    }

    #[tokio::test]
    async fn test_categorize_backend_failure_is_other() {
        let generator = failing_generator();
        assert_eq!(generator.categorize("Anything").await, Category::Other);
    }

    #[tokio::test]
    async fn test_answer_returns_trimmed_response() {
        let generator = generator_with_reply("  You spent $42 on food this month.  \n");
        let answer = generator.answer("How much did I spend on food?", &records()).await;
        assert_eq!(answer, "You spent $42 on food this month.");
    }

    #[tokio::test]
    async fn test_answer_fallback_on_failure() {
        let generator = failing_generator();
        let answer = generator.answer("How much?", &records()).await;
        assert!(answer.contains("unable to provide a detailed answer"));
    }

    #[tokio::test]
    async fn test_answer_fallback_on_empty_response() {
        let generator = generator_with_reply("   ");
        let answer = generator.answer("How much?", &records()).await;
        assert!(!answer.is_empty());
        assert!(answer.contains("try again"));
    }
}
