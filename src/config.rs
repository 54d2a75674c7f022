//! Configuration for StartLink
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

/// Placeholder value shipped in .env templates; treated as "no key configured"
const GEMINI_KEY_PLACEHOLDER: &str = "your_gemini_api_key_here";

/// StartLink - API service for the founder/researcher network
#[derive(Parser, Debug, Clone)]
#[command(name = "startlink")]
#[command(about = "API service connecting startup founders and researchers")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:7410")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "startlink")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Access token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Refresh token expiry in seconds
    #[arg(long, env = "JWT_REFRESH_EXPIRY_SECONDS", default_value = "604800")]
    pub jwt_refresh_expiry_seconds: u64,

    /// Gemini API key for AI search, chat, and summarization (optional)
    #[arg(long, env = "GEMINI_API_KEY")]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for all AI calls
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub gemini_model: String,

    /// Path for JSONL usage event log (disabled when unset)
    #[arg(long, env = "USAGE_LOG_PATH")]
    pub usage_log_path: Option<PathBuf>,

    /// Enable development mode (insecure JWT fallback, start without MongoDB)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "startlink-dev-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Get the configured Gemini API key, treating the .env placeholder as unset
    pub fn gemini_key(&self) -> Option<String> {
        self.gemini_api_key
            .as_deref()
            .filter(|k| !k.is_empty() && *k != GEMINI_KEY_PLACEHOLDER)
            .map(|k| k.to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if self.listen.port() == 0 {
            return Err("LISTEN port must be non-zero".to_string());
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be non-zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["startlink", "--dev-mode"])
    }

    #[test]
    fn test_dev_mode_jwt_fallback() {
        let args = base_args();
        assert_eq!(args.jwt_secret(), "startlink-dev-insecure-secret");
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let args = Args::parse_from(["startlink"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["startlink", "--jwt-secret", "s3cret"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_gemini_placeholder_treated_as_unset() {
        let mut args = base_args();
        args.gemini_api_key = Some("your_gemini_api_key_here".to_string());
        assert!(args.gemini_key().is_none());

        args.gemini_api_key = Some("AIzaReal".to_string());
        assert_eq!(args.gemini_key().as_deref(), Some("AIzaReal"));
    }
}
