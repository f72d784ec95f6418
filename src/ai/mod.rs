//! Generative suggestions for todos.
//!
//! The model is reached through [`TextGenerator`]; everything else here is
//! prompt building, extraction of structured results from the returned text,
//! and substitution of static fallbacks when the model cannot be used.

pub mod extract;
pub mod fallback;
pub mod gemini;

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::config::AiConfig;
use crate::models::{Category, Priority, Todo};

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI is disabled")]
    Disabled,
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    ResponseError(String),
}

/// Anything that turns a prompt into free-form text
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoSuggestion {
    pub title: String,
    pub priority: Priority,
    pub category: Category,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Productivity,
    Organization,
    Suggestion,
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    pub category: Category,
    pub priority: Priority,
    #[serde(default)]
    pub reasoning: String,
}

/// A result plus whether it came from the static fallback
#[derive(Debug, Clone, PartialEq)]
pub struct Answer<T> {
    pub value: T,
    pub from_fallback: bool,
}

impl<T> Answer<T> {
    fn model(value: T) -> Self {
        Self {
            value,
            from_fallback: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            from_fallback: true,
        }
    }
}

pub struct AiAssistant {
    generator: Option<Box<dyn TextGenerator>>,
}

impl AiAssistant {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self {
            generator: Some(Box::new(generator)),
        }
    }

    /// Assistant that always answers from the fallbacks
    pub fn offline() -> Self {
        Self { generator: None }
    }

    /// Online when enabled and a client can be built, offline otherwise
    pub fn from_config(config: &AiConfig) -> Self {
        if !config.enabled {
            return Self::offline();
        }
        match GeminiClient::from_config(config) {
            Ok(client) => Self::new(client),
            Err(e) => {
                warn!(error = %e, "AI client unavailable, using offline suggestions");
                Self::offline()
            }
        }
    }

    pub fn is_online(&self) -> bool {
        self.generator.is_some()
    }

    fn ask(&self, prompt: &str) -> Result<String, AiError> {
        match self.generator {
            Some(ref generator) => generator.generate(prompt),
            None => Err(AiError::Disabled),
        }
    }

    /// Run a prompt and extract a result, substituting the fallback on any failure
    fn ask_with<T>(
        &self,
        what: &str,
        prompt: &str,
        extract: impl FnOnce(&str) -> Option<T>,
        fallback: impl FnOnce() -> T,
    ) -> Answer<T> {
        match self.ask(prompt) {
            Ok(text) => match extract(&text) {
                Some(value) => Answer::model(value),
                None => {
                    warn!(what, "model output could not be parsed, using fallback");
                    Answer::fallback(fallback())
                }
            },
            Err(AiError::Disabled) => Answer::fallback(fallback()),
            Err(e) => {
                warn!(what, error = %e, "AI request failed, using fallback");
                Answer::fallback(fallback())
            }
        }
    }

    /// 3-5 todos that complement the existing ones for the given context
    pub fn suggest_todos(&self, context: &str, existing: &[Todo]) -> Answer<Vec<TodoSuggestion>> {
        let existing: Vec<_> = existing
            .iter()
            .map(|t| json!({ "title": t.title, "priority": t.priority, "category": t.category }))
            .collect();
        let prompt = format!(
            "Context: \"{context}\"\n\
             Existing todos: {existing}\n\n\
             Suggest 3-5 todos that are missing or complement the existing ones. \
             Do not repeat existing todos and vary priorities and categories.\n\n\
             {SUGGESTION_FORMAT}",
            existing = serde_json::Value::Array(existing),
        );

        self.ask_with(
            "suggestions",
            &prompt,
            |text| extract::parse_array(text).map(keep_complete_suggestions),
            || fallback::suggestions(context),
        )
    }

    /// Observations about the board's priorities and categories
    pub fn analyze_productivity(&self, todos: &[Todo]) -> Answer<Vec<Insight>> {
        let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
        let mut priorities: BTreeMap<&str, usize> = BTreeMap::new();
        for todo in todos {
            *categories.entry(todo.category.as_str()).or_default() += 1;
            *priorities.entry(todo.priority.as_str()).or_default() += 1;
        }
        let recent: Vec<_> = todos
            .iter()
            .rev()
            .take(5)
            .rev()
            .map(|t| json!({ "title": t.title, "category": t.category, "priority": t.priority }))
            .collect();

        let prompt = format!(
            "Analyze this todo board.\n\
             Total todos: {total}\n\
             Categories: {categories}\n\
             Priorities: {priorities}\n\
             Recent todos: {recent}\n\n\
             Give 2-4 actionable insights about productivity, organization or patterns.\n\
             Respond with only a JSON array of objects with keys \"type\" \
             (productivity, organization, suggestion or pattern), \"title\", \"description\", \
             \"actionable\" (boolean) and optional \"action\".",
            total = todos.len(),
            categories = json!(categories),
            priorities = json!(priorities),
            recent = serde_json::Value::Array(recent),
        );

        self.ask_with(
            "insights",
            &prompt,
            |text| {
                extract::parse_array::<Insight>(text).map(|items| {
                    items
                        .into_iter()
                        .filter(|i| !i.title.is_empty() && !i.description.is_empty())
                        .collect::<Vec<_>>()
                })
            },
            || fallback::insights(todos),
        )
    }

    /// A more specific, actionable wording of a title; the original on failure
    pub fn improve_title(&self, title: &str, category: Category) -> Answer<String> {
        let prompt = format!(
            "Rewrite this todo title to be specific and actionable, with a clear outcome, \
             concise and fitting the \"{category}\" category.\n\
             Title: \"{title}\"\n\n\
             Respond with only the new title text, without quotes or explanation."
        );

        self.ask_with(
            "improved title",
            &prompt,
            |text| {
                let improved = extract::clean_title(text);
                (improved.chars().count() > 3).then(|| improved.to_string())
            },
            || title.to_string(),
        )
    }

    /// Best category and priority for a title
    pub fn categorize(&self, title: &str) -> Answer<Categorization> {
        let prompt = format!(
            "Pick the best category and priority for this todo: \"{title}\"\n\
             Categories: work, personal, shopping, health, learning, other\n\
             Priorities: low, medium, high\n\n\
             Respond with only a JSON object with keys \"category\", \"priority\" and \"reasoning\"."
        );

        self.ask_with(
            "categorization",
            &prompt,
            extract::parse_object::<Categorization>,
            || fallback::categorization(title),
        )
    }

    /// A set of related todos for a scenario description
    pub fn smart_template(&self, description: &str) -> Answer<Vec<TodoSuggestion>> {
        let prompt = format!(
            "Scenario: \"{description}\"\n\n\
             List 3-5 todos typically needed for this scenario, thorough but not overwhelming.\n\n\
             {SUGGESTION_FORMAT}"
        );

        self.ask_with(
            "smart template",
            &prompt,
            |text| extract::parse_array(text).map(keep_complete_suggestions),
            || fallback::template(description),
        )
    }
}

const SUGGESTION_FORMAT: &str = "Respond with only a JSON array of objects with keys \
    \"title\", \"priority\" (low, medium or high), \"category\" \
    (work, personal, shopping, health, learning or other) and \"reasoning\".";

fn keep_complete_suggestions(items: Vec<TodoSuggestion>) -> Vec<TodoSuggestion> {
    items
        .into_iter()
        .filter(|s| !s.title.trim().is_empty() && !s.reasoning.trim().is_empty())
        .collect()
}
