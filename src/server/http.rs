//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per connection. Route
//! families live in `crate::routes`; their handlers consume the
//! request, so the dispatcher checks each family's path prefix before
//! handing the request over.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::ai::GeminiClient;
use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::ipr::FilingStore;
use crate::logging::UsageLogger;
use crate::routes;
use crate::routes::api::{self, BoxBody};
use crate::types::StartlinkError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// None when MongoDB was unreachable at startup; DB-backed routes
    /// answer 503 until the next restart
    pub mongo: Option<MongoClient>,
    /// In-memory filing tracker, authoritative for /api/ipr. Mirrored
    /// to the `filings` collection when MongoDB is connected.
    pub filings: FilingStore,
    /// Gemini client, present only when an API key is configured
    pub ai: Option<Arc<GeminiClient>>,
    pub jwt: JwtValidator,
    /// JSONL usage log, enabled by --usage-log-path
    pub usage: Option<UsageLogger>,
}

impl AppState {
    pub fn new(
        args: Args,
        mongo: Option<MongoClient>,
        ai: Option<Arc<GeminiClient>>,
        usage: Option<UsageLogger>,
    ) -> Result<Self, StartlinkError> {
        let jwt = JwtValidator::new(
            args.jwt_secret(),
            args.jwt_expiry_seconds,
            args.jwt_refresh_expiry_seconds,
        )?;

        Ok(Self {
            args,
            mongo,
            filings: FilingStore::new(),
            ai,
            jwt,
            usage,
        })
    }
}

/// Serve connections until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), StartlinkError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "StartLink listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - insecure defaults allowed");
    }
    if state.mongo.is_none() {
        warn!("MongoDB not connected - account and listing routes will answer 503");
    }
    if state.ai.is_none() {
        info!("Gemini API key not configured - AI routes will report the missing key");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    if path.starts_with("/auth") {
        return Ok(dispatched(
            routes::handle_auth_request(req, state).await,
            &path,
        ));
    }
    if path.starts_with("/api/users") {
        return Ok(dispatched(
            routes::handle_user_request(req, state).await,
            &path,
        ));
    }
    if path == "/api/startups" || path.starts_with("/api/startups/") {
        return Ok(dispatched(
            routes::handle_startup_request(req, state).await,
            &path,
        ));
    }
    if path == "/api/papers" || path.starts_with("/api/papers/") {
        return Ok(dispatched(
            routes::handle_paper_request(req, state).await,
            &path,
        ));
    }
    if path == "/api/posts" || path.starts_with("/api/posts/") {
        return Ok(dispatched(
            routes::handle_feed_request(req, state).await,
            &path,
        ));
    }
    if path.starts_with("/api/ipr/") {
        return Ok(dispatched(routes::handle_ipr_request(req, state).await, &path));
    }
    if routes::is_ai_route(&path) {
        return Ok(dispatched(routes::handle_ai_request(req, state).await, &path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state),

        // Version info for deployment verification
        (Method::GET, "/api/version") => routes::version_info(),

        // Canonical pick lists for signup and profile forms
        (Method::GET, "/api/domains") => routes::users::domains_list(),
        (Method::GET, "/api/roles") => routes::users::roles_list(),

        // CORS preflight
        (Method::OPTIONS, _) => api::cors_preflight(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// Unwrap a family handler's answer. The prefix gate already matched,
/// so None means the family declined a path inside its own prefix;
/// answer with the standard 404 rather than dropping the request.
fn dispatched(response: Option<Response<BoxBody>>, path: &str) -> Response<BoxBody> {
    response.unwrap_or_else(|| not_found_response(path))
}

fn not_found_response(path: &str) -> Response<BoxBody> {
    api::error_response(
        StatusCode::NOT_FOUND,
        format!("No route for {}", path),
        "NOT_FOUND",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_response_shape() {
        let response = not_found_response("/api/nope");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
    }

    #[test]
    fn test_ai_route_gate() {
        assert!(routes::is_ai_route("/api/patent-search"));
        assert!(routes::is_ai_route("/api/test-gemini"));
        assert!(!routes::is_ai_route("/api/patents"));
        assert!(!routes::is_ai_route("/api/ipr/filings"));
    }
}
