use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::ai::{AiError, TextGenerator};
use crate::config::AiConfig;

/// `TextGenerator` backed by the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, endpoint: String, timeout: Duration) -> Result<Self, AiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Build a client from config, reading the API key from the configured environment variable
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AiError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            api_key,
            config.model.clone(),
            config.endpoint.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!(model = %self.model, "sending generateContent request");
        let response: GenerateResponse = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        response
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| AiError::ResponseError("response contained no text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported() {
        let config = AiConfig {
            api_key_env: "TODO_CANVAS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..AiConfig::default()
        };
        match GeminiClient::from_config(&config) {
            Err(AiError::MissingApiKey(var)) => assert_eq!(var, "TODO_CANVAS_TEST_KEY_THAT_IS_NEVER_SET"),
            other => panic!("expected missing key error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let client = GeminiClient::new(
            "k".to_string(),
            "gemini-1.5-flash".to_string(),
            "https://example.test/v1beta/".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.url(), "https://example.test/v1beta/models/gemini-1.5-flash:generateContent");
    }

    #[test]
    fn response_text_is_read_from_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":" hello "}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = response.candidates[0].content.as_ref().unwrap().parts[0].text.clone();
        assert_eq!(text.as_deref(), Some(" hello "));
    }
}
