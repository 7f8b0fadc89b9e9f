use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    #[error("Other: {0}")]
    Other(String),
}

/// Thin client for the Gemini `generateContent` REST API. One call per
/// prompt, no retries, bounded timeout. With no real API key configured the
/// client runs in demo mode and returns canned text so the downstream
/// parsing pipeline stays exercisable offline.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let base_url = std::env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url,
            model,
        }
    }

    /// Identifier stamped into result metadata.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn is_demo(&self) -> bool {
        self.api_key == "DEMO_KEY"
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        if self.is_demo() {
            info!("Using demo mode - generating fallback text");
            return Ok(
                "Demo response: this craft carries a long tradition of skilled artisan work."
                    .to_string(),
            );
        }

        info!("Generating text with Gemini API...");

        let payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": 0.7,
                "topK": 40,
                "topP": 0.95,
                "maxOutputTokens": 2048
            }
        });

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(classify_transport_error)?;

        if !status.is_success() {
            error!(
                "❌ Gemini API text generation failed with status {}: {}",
                status, response_text
            );
            return Err(GeminiError::Http(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Other(format!("Failed to parse response: {}", e)))?;

        if let Some(candidate) = parsed.candidates.first() {
            for part in &candidate.content.parts {
                if let Part::Text { text } = part {
                    return Ok(text.trim().to_string());
                }
            }
        }

        Err(GeminiError::Other(
            "No text content found in response".to_string(),
        ))
    }
}

fn classify_transport_error(e: reqwest::Error) -> GeminiError {
    if e.is_timeout() {
        GeminiError::Timeout
    } else {
        GeminiError::Http(e.to_string())
    }
}

// --- Response shape of the generateContent API ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_text_part_from_candidates() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "  hello world  "}]}
            }]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        let text = match &parsed.candidates[0].content.parts[0] {
            Part::Text { text } => text.trim(),
            Part::Other(_) => panic!("expected text part"),
        };
        assert_eq!(text, "hello world");
    }

    #[test]
    fn tolerates_unknown_part_shapes() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"inlineData": {"data": "x"}}, {"text": "after"}]}
            }]
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts.len(), 2);
    }
}
