//! Health and version endpoints
//!
//! - /health      - Liveness probe with database state
//! - /api/version - Build information for deployment verification
//!
//! The liveness probe always answers 200 while the process is up; a
//! missing MongoDB connection is reported in the body, not the status
//! code, since the IPR tracker and AI routes keep working without it.

use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::routes::api::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// True whenever the process is serving
    pub healthy: bool,
    /// 'online' when fully operational, 'degraded' without MongoDB
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    /// Operating mode
    pub mode: &'static str,
    /// Node identifier
    pub node_id: String,
    pub db: DbHealth,
    pub ai: AiHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct DbHealth {
    pub connected: bool,
}

#[derive(Serialize)]
pub struct AiHealth {
    pub configured: bool,
}

/// Handle liveness probe (/health)
pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    let db_connected = state.mongo.is_some();
    let ai_configured = state.ai.is_some();

    let status = if db_connected || state.args.dev_mode {
        "online"
    } else {
        "degraded"
    };
    let error = if db_connected {
        None
    } else {
        Some("MongoDB not connected; listing and account routes answer 503".to_string())
    };

    let response = HealthResponse {
        healthy: true,
        status,
        service: "startlink",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        node_id: state.args.node_id.to_string(),
        db: DbHealth {
            connected: db_connected,
        },
        ai: AiHealth {
            configured: ai_configured,
        },
        error,
    };

    json_response(StatusCode::OK, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    pub service: &'static str,
}

/// Handle version endpoint (/api/version)
pub fn version_info() -> Response<BoxBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "startlink",
    };

    json_response(StatusCode::OK, &response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_response_has_build_fields() {
        let json = serde_json::to_value(VersionResponse {
            version: "0.1.0",
            commit: "abc1234",
            commit_full: "abc1234def",
            build_time: "2026-01-01T00:00:00Z",
            service: "startlink",
        })
        .unwrap();
        assert_eq!(json["service"], "startlink");
        assert_eq!(json["commit"], "abc1234");
    }
}
