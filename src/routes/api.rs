//! Shared plumbing for the HTTP routes
//!
//! Every handler produces CORS'd JSON. Error payloads carry a short
//! machine code next to the human message so clients can branch
//! without string matching.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::{extract_token_from_header, Claims, TokenUse};
use crate::server::AppState;
use crate::types::StartlinkError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Cap for ordinary JSON bodies
pub const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Cap for avatar uploads: 5 MB of image grows by 4/3 under base64,
/// plus the JSON envelope
pub const AVATAR_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Error payload returned by every failing route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Plain acknowledgement for routes with nothing else to say
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap_or_else(|_| {
            let mut fallback = Response::new(full_body(r#"{"error":"Internal error"}"#));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

pub fn error_response(
    status: StatusCode,
    message: impl Into<String>,
    code: &str,
) -> Response<BoxBody> {
    json_response(
        status,
        &ErrorResponse {
            error: message.into(),
            code: Some(code.to_string()),
        },
    )
}

/// 400 with the VALIDATION code used by every field check
pub fn validation_error(message: impl Into<String>) -> Response<BoxBody> {
    error_response(StatusCode::BAD_REQUEST, message, "VALIDATION")
}

pub fn not_found(message: impl Into<String>) -> Response<BoxBody> {
    error_response(StatusCode::NOT_FOUND, message, "NOT_FOUND")
}

pub fn internal_error(message: impl Into<String>) -> Response<BoxBody> {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message, "INTERNAL")
}

/// 503 returned by every route that needs MongoDB while it is down
pub fn db_unavailable() -> Response<BoxBody> {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Database not available",
        "DB_UNAVAILABLE",
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap_or_else(|_| Response::new(empty_body()))
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Collect and deserialize a JSON request body, bounded by `limit`
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
    limit: usize,
) -> Result<T, StartlinkError> {
    let body = req
        .collect()
        .await
        .map_err(|e| StartlinkError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > limit {
        return Err(StartlinkError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| StartlinkError::Http(format!("Invalid JSON: {}", e)))
}

pub fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Require a valid bearer access token; the Err side is the ready 401
/// response. Refresh tokens are only good for /auth/refresh.
pub fn authenticate(
    state: &AppState,
    req: &Request<hyper::body::Incoming>,
) -> Result<Claims, Response<BoxBody>> {
    let token = match extract_token_from_header(get_auth_header(req)) {
        Some(t) => t,
        None => {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "No token provided",
                "UNAUTHORIZED",
            ))
        }
    };

    let result = state.jwt.verify_token(token);
    if !result.valid {
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            result.error.unwrap_or_else(|| "Invalid token".into()),
            "INVALID_TOKEN",
        ));
    }

    match result.claims {
        Some(claims) if claims.token_use == TokenUse::Access => Ok(claims),
        Some(_) => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Refresh tokens cannot be used for API access",
            "INVALID_TOKEN",
        )),
        None => Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            "INVALID_TOKEN",
        )),
    }
}

/// Parse a query string into a key-value map, percent-decoding values
pub fn parse_query_params(query: &str) -> HashMap<String, String> {
    if query.is_empty() {
        return HashMap::new();
    }

    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            Some((key.to_string(), decoded))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("search=quantum%20dots&category=all&year=2024");
        assert_eq!(params.get("search").map(String::as_str), Some("quantum dots"));
        assert_eq!(params.get("category").map(String::as_str), Some("all"));
        assert_eq!(params.get("year").map(String::as_str), Some("2024"));
    }

    #[test]
    fn test_parse_query_params_empty_and_bare_keys() {
        assert!(parse_query_params("").is_empty());

        let params = parse_query_params("flag&search=");
        assert_eq!(params.get("flag").map(String::as_str), Some(""));
        assert_eq!(params.get("search").map(String::as_str), Some(""));
    }

    #[test]
    fn test_error_response_shape() {
        let response = validation_error("Please select your role");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[test]
    fn test_preflight_allows_write_methods() {
        let response = cors_preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let methods = response
            .headers()
            .get("Access-Control-Allow-Methods")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(methods.contains("PUT"));
        assert!(methods.contains("DELETE"));
    }
}
