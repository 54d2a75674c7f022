//! Gemini-backed search, chat and summarization routes
//!
//! These endpoints keep their own `{status, message}` / `{error}` wire
//! shapes, which the frontend consumes directly.
//!
//! - POST /api/patent-search     - Related-patent search
//! - POST /api/research-search   - Related-paper search
//! - POST /api/ipr-chat          - IPR consultant chat
//! - POST /api/summarize-project - Markdown summary of a paper
//! - POST /api/summarize-startup - Narrative summary of a listing
//! - GET  /api/test-gemini       - Connectivity check

use chrono::SecondsFormat;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::ai::{parse_hits, prompt, GeminiError, TextGenerator};
use crate::ai::prompt::{ChatMessage, ProjectDetails, StartupDetails};
use crate::logging::EventType;
use crate::routes::api::{
    authenticate, cors_preflight, error_response, json_response, parse_json_body, BoxBody,
    ErrorResponse, JSON_BODY_LIMIT,
};
use crate::server::AppState;

const AI_PATHS: [&str; 6] = [
    "/api/patent-search",
    "/api/research-search",
    "/api/ipr-chat",
    "/api/summarize-project",
    "/api/summarize-startup",
    "/api/test-gemini",
];

/// Whether `path` belongs to this route family. The server checks this
/// before handing over the request, since handlers consume it.
pub fn is_ai_route(path: &str) -> bool {
    AI_PATHS.contains(&path)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub chat_history: Vec<ChatMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SummarizeProjectRequest {
    pub project: Option<ProjectDetails>,
}

/// Status-keyed error payload used by the search and chat routes
#[derive(Debug, Serialize)]
struct AiStatus {
    status: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatentSearchResponse {
    status: &'static str,
    patents: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResearchSearchResponse {
    status: &'static str,
    papers: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    status: &'static str,
    response: String,
    timestamp: String,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestGeminiResponse {
    status: &'static str,
    message: String,
    api_key_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn ai_error(status: StatusCode, message: impl Into<String>) -> Response<BoxBody> {
    json_response(
        status,
        &AiStatus {
            status: "error",
            message: message.into(),
        },
    )
}

fn unconfigured() -> Response<BoxBody> {
    ai_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Gemini API key is not configured",
    )
}

/// Drop a leading markdown "AI Summary" heading from model output
fn strip_summary_heading(text: &str) -> &str {
    let trimmed = text.trim();
    let after_hashes = trimmed.trim_start_matches('#');
    if after_hashes.len() == trimmed.len() {
        return trimmed;
    }
    let after = after_hashes.trim_start();
    if let Some(head) = after.get(.."AI Summary".len()) {
        if head.eq_ignore_ascii_case("AI Summary") {
            return after["AI Summary".len()..].trim();
        }
    }
    trimmed
}

async fn log_ai_call(state: &AppState, route: &str, user_id: Option<&str>, outcome: &str) {
    if let Some(usage) = &state.usage {
        usage.log_event(EventType::AiCall, route, user_id, outcome).await;
    }
}

/// POST /api/patent-search
async fn handle_patent_search(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user_id = authenticate(&state, &req).ok().map(|c| c.sub);

    let body: SearchRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => return ai_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };
    if body.query.trim().is_empty() {
        return ai_error(StatusCode::BAD_REQUEST, "Search query is required");
    }
    let Some(client) = &state.ai else {
        return unconfigured();
    };

    let text = match client.generate(&prompt::patent_search(&body.query)).await {
        Ok(text) => text,
        Err(e) => {
            error!("Patent search error: {}", e);
            log_ai_call(&state, "/api/patent-search", user_id.as_deref(), "error").await;
            return ai_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    log_ai_call(&state, "/api/patent-search", user_id.as_deref(), "success").await;

    match parse_hits::<serde_json::Value>(&text) {
        Some(patents) => {
            let message = format!("Found {} related patents", patents.len());
            json_response(
                StatusCode::OK,
                &PatentSearchResponse {
                    status: "success",
                    patents,
                    query: Some(body.query),
                    raw_response: None,
                    message,
                },
            )
        }
        None => json_response(
            StatusCode::OK,
            &PatentSearchResponse {
                status: "success",
                patents: Vec::new(),
                query: None,
                raw_response: Some(text),
                message: "Search completed but response format was unexpected".to_string(),
            },
        ),
    }
}

/// POST /api/research-search
async fn handle_research_search(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user_id = authenticate(&state, &req).ok().map(|c| c.sub);

    let body: SearchRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => return ai_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };
    if body.query.trim().is_empty() {
        return ai_error(StatusCode::BAD_REQUEST, "Search query is required");
    }
    let Some(client) = &state.ai else {
        return unconfigured();
    };

    let text = match client.generate(&prompt::research_search(&body.query)).await {
        Ok(text) => text,
        Err(e) => {
            error!("Research search error: {}", e);
            log_ai_call(&state, "/api/research-search", user_id.as_deref(), "error").await;
            return ai_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    log_ai_call(&state, "/api/research-search", user_id.as_deref(), "success").await;

    match parse_hits::<serde_json::Value>(&text) {
        Some(papers) => {
            let message = format!("Found {} related research papers", papers.len());
            json_response(
                StatusCode::OK,
                &ResearchSearchResponse {
                    status: "success",
                    papers,
                    query: Some(body.query),
                    raw_response: None,
                    message,
                },
            )
        }
        None => json_response(
            StatusCode::OK,
            &ResearchSearchResponse {
                status: "success",
                papers: Vec::new(),
                query: None,
                raw_response: Some(text),
                message: "Search completed but response format was unexpected".to_string(),
            },
        ),
    }
}

/// POST /api/ipr-chat
async fn handle_ipr_chat(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user_id = authenticate(&state, &req).ok().map(|c| c.sub);

    let body: ChatRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => return ai_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
    };
    if body.message.trim().is_empty() {
        return ai_error(StatusCode::BAD_REQUEST, "Message is required");
    }
    let Some(client) = &state.ai else {
        return unconfigured();
    };

    match client
        .generate(&prompt::ipr_chat(&body.message, &body.chat_history))
        .await
    {
        Ok(text) => {
            log_ai_call(&state, "/api/ipr-chat", user_id.as_deref(), "success").await;
            json_response(
                StatusCode::OK,
                &ChatResponse {
                    status: "success",
                    response: text.trim().to_string(),
                    timestamp: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                },
            )
        }
        Err(e) => {
            error!("IPR chat error: {}", e);
            log_ai_call(&state, "/api/ipr-chat", user_id.as_deref(), "error").await;
            ai_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// POST /api/summarize-project
async fn handle_summarize_project(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user_id = authenticate(&state, &req).ok().map(|c| c.sub);

    let body: SummarizeProjectRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "VALIDATION",
            )
        }
    };
    let Some(project) = body.project else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Project data is required".to_string(),
                code: None,
            },
        );
    };
    let Some(client) = &state.ai else {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: "Gemini API key not configured".to_string(),
                code: None,
            },
        );
    };

    match client.generate(&prompt::summarize_project(&project)).await {
        Ok(text) => {
            log_ai_call(&state, "/api/summarize-project", user_id.as_deref(), "success").await;
            json_response(
                StatusCode::OK,
                &SummaryResponse {
                    summary: strip_summary_heading(&text).to_string(),
                },
            )
        }
        Err(e) => {
            error!("Error summarizing project: {}", e);
            log_ai_call(&state, "/api/summarize-project", user_id.as_deref(), "error").await;
            let (status, message) = match e {
                GeminiError::InvalidKey(_) => {
                    (StatusCode::UNAUTHORIZED, "Invalid API key configuration")
                }
                GeminiError::QuotaExceeded(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "API quota exceeded. Please try again later.",
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate project summary. Please try again.",
                ),
            };
            json_response(
                status,
                &ErrorResponse {
                    error: message.to_string(),
                    code: None,
                },
            )
        }
    }
}

/// POST /api/summarize-startup
async fn handle_summarize_startup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let user_id = authenticate(&state, &req).ok().map(|c| c.sub);

    let body: StartupDetails = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e),
                "VALIDATION",
            )
        }
    };
    let Some(client) = &state.ai else {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorResponse {
                error: "Gemini API key is not configured. Please add your API key to .env.local"
                    .to_string(),
                code: None,
            },
        );
    };

    if body.name.trim().is_empty() || body.idea_summary.trim().is_empty() {
        return json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse {
                error: "Missing required fields: name and idea_summary".to_string(),
                code: None,
            },
        );
    }

    match client.generate(&prompt::summarize_startup(&body)).await {
        Ok(text) => {
            log_ai_call(&state, "/api/summarize-startup", user_id.as_deref(), "success").await;
            json_response(StatusCode::OK, &SummaryResponse { summary: text })
        }
        Err(e) => {
            error!("Error generating startup summary: {}", e);
            log_ai_call(&state, "/api/summarize-startup", user_id.as_deref(), "error").await;
            let (status, message) = match &e {
                GeminiError::InvalidKey(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid or missing Gemini API key. Please check your API key configuration."
                        .to_string(),
                ),
                GeminiError::QuotaExceeded(_) => (
                    StatusCode::TOO_MANY_REQUESTS,
                    "API quota exceeded. Please try again later.".to_string(),
                ),
                GeminiError::PermissionDenied(_) => (
                    StatusCode::FORBIDDEN,
                    "Permission denied. Please check your API key permissions.".to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("API Error: {}", e),
                ),
            };
            json_response(
                status,
                &ErrorResponse {
                    error: message,
                    code: None,
                },
            )
        }
    }
}

/// GET /api/test-gemini
async fn handle_test_gemini(state: Arc<AppState>) -> Response<BoxBody> {
    let Some(client) = &state.ai else {
        return json_response(
            StatusCode::OK,
            &TestGeminiResponse {
                status: "error",
                message: "Gemini API key is not configured. Please add your API key to .env.local"
                    .to_string(),
                api_key_exists: false,
                test_response: None,
                error: None,
            },
        );
    };

    match client.generate(prompt::TEST_PROMPT).await {
        Ok(text) => {
            info!("Gemini connectivity check passed");
            json_response(
                StatusCode::OK,
                &TestGeminiResponse {
                    status: "success",
                    message: "Gemini API is working correctly".to_string(),
                    api_key_exists: true,
                    test_response: Some(text),
                    error: None,
                },
            )
        }
        Err(e) => {
            error!("Gemini API test error: {}", e);
            json_response(
                StatusCode::OK,
                &TestGeminiResponse {
                    status: "error",
                    message: format!("Gemini API test failed: {}", e),
                    api_key_exists: true,
                    test_response: None,
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

/// Handle AI requests.
///
/// Returns Some(response) if the request was handled, None if not an AI
/// route.
pub async fn handle_ai_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    if !is_ai_route(&path) {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let response = match (method, path.as_str()) {
        (Method::POST, "/api/patent-search") => handle_patent_search(req, state).await,
        (Method::POST, "/api/research-search") => handle_research_search(req, state).await,
        (Method::POST, "/api/ipr-chat") => handle_ipr_chat(req, state).await,
        (Method::POST, "/api/summarize-project") => handle_summarize_project(req, state).await,
        (Method::POST, "/api/summarize-startup") => handle_summarize_startup(req, state).await,
        (Method::GET, "/api/test-gemini") => handle_test_gemini(state).await,
        _ => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_summary_heading() {
        assert_eq!(
            strip_summary_heading("## AI Summary\nThe project explores..."),
            "The project explores..."
        );
        assert_eq!(
            strip_summary_heading("# ai summary Key points follow"),
            "Key points follow"
        );
        assert_eq!(
            strip_summary_heading("## Overview\nNo change here"),
            "## Overview\nNo change here"
        );
        assert_eq!(strip_summary_heading("  plain text  "), "plain text");
    }

    #[test]
    fn test_search_response_shapes() {
        let parsed = PatentSearchResponse {
            status: "success",
            patents: vec![serde_json::json!({"title": "A"})],
            query: Some("drone".to_string()),
            raw_response: None,
            message: "Found 1 related patents".to_string(),
        };
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["query"], "drone");
        assert!(json.get("rawResponse").is_none());

        let fallback = ResearchSearchResponse {
            status: "success",
            papers: Vec::new(),
            query: None,
            raw_response: Some("I cannot answer that".to_string()),
            message: "Search completed but response format was unexpected".to_string(),
        };
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json["rawResponse"], "I cannot answer that");
        assert!(json.get("query").is_none());
        assert_eq!(json["papers"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_chat_request_field_names() {
        let body: ChatRequest = serde_json::from_str(
            r#"{"message": "How do I file?", "chatHistory": [{"role": "user", "content": "hi"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message, "How do I file?");
        assert_eq!(body.chat_history.len(), 1);
    }
}
