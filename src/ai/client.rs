//! Gemini REST client
//!
//! One generateContent call per request, 30 second timeout, no retry.
//! Upstream failures are classified so routes can map key, quota and
//! permission problems to distinct statuses.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rejected API key (INVALID_ARGUMENT / "API key" messages)
    #[error("{0}")]
    InvalidKey(String),

    /// Quota exhausted (RESOURCE_EXHAUSTED / "quota" messages)
    #[error("{0}")]
    QuotaExceeded(String),

    #[error("{0}")]
    PermissionDenied(String),

    /// Any other upstream error
    #[error("{message}")]
    Api { status: String, message: String },

    #[error("model returned an empty response")]
    Empty,
}

/// Seam for tests and alternative model backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize, Default)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn classify(code: StatusCode, detail: ApiErrorDetail) -> GeminiError {
    let message = if detail.message.is_empty() {
        format!("Gemini API returned HTTP {}", code.as_u16())
    } else {
        detail.message
    };
    let status = detail.status;

    if status == "INVALID_ARGUMENT"
        || message.contains("API key")
        || message.contains("API_KEY")
        || code == StatusCode::BAD_REQUEST
        || code == StatusCode::UNAUTHORIZED
    {
        GeminiError::InvalidKey(message)
    } else if status == "RESOURCE_EXHAUSTED"
        || message.to_lowercase().contains("quota")
        || code == StatusCode::TOO_MANY_REQUESTS
    {
        GeminiError::QuotaExceeded(message)
    } else if status == "PERMISSION_DENIED" || code == StatusCode::FORBIDDEN {
        GeminiError::PermissionDenied(message)
    } else {
        GeminiError::Api { status, message }
    }
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE, self.model, self.api_key
        );
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "calling Gemini");
        let response = self.http.post(&url).json(&body).send().await?;

        let code = response.status();
        if !code.is_success() {
            let detail = response
                .json::<ApiErrorBody>()
                .await
                .unwrap_or_default()
                .error
                .unwrap_or_default();
            return Err(classify(code, detail));
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.is_empty())
            .ok_or(GeminiError::Empty)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate_content(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(status: &str, message: &str) -> ApiErrorDetail {
        ApiErrorDetail {
            status: status.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_classify_invalid_key() {
        let err = classify(
            StatusCode::BAD_REQUEST,
            detail("INVALID_ARGUMENT", "API key not valid. Please pass a valid API key."),
        );
        assert!(matches!(err, GeminiError::InvalidKey(_)));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_classify_quota() {
        let err = classify(
            StatusCode::TOO_MANY_REQUESTS,
            detail("RESOURCE_EXHAUSTED", "Quota exceeded for quota metric"),
        );
        assert!(matches!(err, GeminiError::QuotaExceeded(_)));
    }

    #[test]
    fn test_classify_permission() {
        let err = classify(
            StatusCode::FORBIDDEN,
            detail("PERMISSION_DENIED", "Caller does not have permission"),
        );
        assert!(matches!(err, GeminiError::PermissionDenied(_)));
    }

    #[test]
    fn test_classify_other_keeps_message() {
        let err = classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            detail("INTERNAL", "backend error"),
        );
        assert_eq!(err.to_string(), "backend error");
    }

    #[test]
    fn test_classify_empty_body_falls_back_to_http_code() {
        let err = classify(StatusCode::SERVICE_UNAVAILABLE, ApiErrorDetail::default());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_response_shape_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text);
        assert_eq!(text.as_deref(), Some("hello"));

        let empty: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(empty.candidates.is_empty());
    }
}
