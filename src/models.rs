//! Domain types shared across the AI layer
//!
//! These types mirror what the Tally app stores for expenses and what the
//! insights panel renders. Expense records are caller-owned input; the AI
//! layer never mutates or persists them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single expense as recorded by the app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Opaque identifier assigned by the app's data store
    pub id: String,
    /// Signed amount, currency-unit-agnostic
    pub amount: f64,
    /// Free-text category label
    pub category: String,
    /// Free-text description (e.g., "Coffee at Blue Bottle")
    pub description: String,
    /// Calendar date as a string (e.g., "2024-03-15")
    pub date: String,
}

/// Kind of insight, rendered as a badge in the insights panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    #[default]
    Info,
    Success,
    Tip,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Warning => "warning",
            InsightKind::Info => "info",
            InsightKind::Success => "success",
            InsightKind::Tip => "tip",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(InsightKind::Warning),
            "info" => Ok(InsightKind::Info),
            "success" => Ok(InsightKind::Success),
            "tip" => Ok(InsightKind::Tip),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// A generated financial insight
///
/// Every field is populated before an insight is returned to the caller:
/// defaults are applied for anything the model left out, so consumers never
/// see a partially-formed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Synthesized per call (`ai-{millis}-{index}`), unique within one call
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    /// Short imperative suggestion, absent when the model gave none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Always within [0.0, 1.0]
    pub confidence: f64,
}

/// Fixed set of expense categories
///
/// Anything the model returns outside this set collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
    Food,
    Transportation,
    Entertainment,
    Shopping,
    Bills,
    Healthcare,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Healthcare => "Healthcare",
            Category::Other => "Other",
        }
    }

    /// All known categories, in prompt order
    pub fn all() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transportation,
            Category::Entertainment,
            Category::Shopping,
            Category::Bills,
            Category::Healthcare,
            Category::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    // Exact, case-sensitive match. Model responses that deviate (extra text,
    // case variants, invented labels) are treated as unknown.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Category::Food),
            "Transportation" => Ok(Category::Transportation),
            "Entertainment" => Ok(Category::Entertainment),
            "Shopping" => Ok(Category::Shopping),
            "Bills" => Ok(Category::Bills),
            "Healthcare" => Ok(Category::Healthcare),
            "Other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}
