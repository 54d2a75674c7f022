//! Usage logging for product analytics
//!
//! Appends one JSON object per line to a log file. The file is the
//! only sink; when no path is configured the logger is simply absent
//! from the application state and nothing is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Usage event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Account created
    Signup,
    /// Successful login
    Login,
    /// Startup or paper listing created
    ListingCreated,
    /// IPR filing created
    FilingCreated,
    /// Filing step checked or unchecked
    StepUpdate,
    /// Gemini-backed route invoked
    AiCall,
}

/// Usage event for analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event type
    pub event_type: EventType,
    /// Node that handled the request
    pub node_id: String,
    /// User identifier (if authenticated)
    pub user_id: Option<String>,
    /// Route that produced the event
    pub route: String,
    /// Short outcome tag ("created", "success", "error", ...)
    pub outcome: String,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl UsageEvent {
    pub fn new(event_type: EventType, node_id: String, route: String, outcome: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            node_id,
            user_id: None,
            route,
            outcome,
            metadata: None,
        }
    }

    /// Set the user ID
    pub fn with_user(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach free-form metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Convert to JSONL line
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Usage logger that writes events to a JSONL file
#[derive(Clone)]
pub struct UsageLogger {
    inner: Arc<Mutex<UsageLoggerInner>>,
    node_id: String,
}

struct UsageLoggerInner {
    writer: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl UsageLogger {
    /// Create a logger with no sink attached yet
    pub fn new(node_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(UsageLoggerInner {
                writer: None,
                path: None,
            })),
            node_id,
        }
    }

    /// Initialize file logging to the specified path
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let writer = BufWriter::new(file);

        let mut inner = self.inner.lock().await;
        inner.writer = Some(writer);
        inner.path = Some(path.clone());

        info!("Usage logging initialized to {}", path.display());
        Ok(())
    }

    /// Log a usage event
    pub async fn log(&self, event: UsageEvent) {
        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize usage event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;

        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write usage event: {}", e);
            }
            // Flush per event; volume is low enough
            if let Err(e) = writer.flush() {
                error!("Failed to flush usage log: {}", e);
            }
        }
    }

    /// Record one event on the given route
    pub async fn log_event(
        &self,
        event_type: EventType,
        route: &str,
        user_id: Option<&str>,
        outcome: &str,
    ) {
        let mut event = UsageEvent::new(
            event_type,
            self.node_id.clone(),
            route.to_string(),
            outcome.to_string(),
        );

        if let Some(uid) = user_id {
            event = event.with_user(uid.to_string());
        }

        self.log(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = UsageEvent::new(
            EventType::Signup,
            "node-1".to_string(),
            "/auth/signup".to_string(),
            "created".to_string(),
        )
        .with_user("user-123".to_string());

        let jsonl = event.to_jsonl().unwrap();
        assert!(jsonl.contains("\"signup\""));
        assert!(jsonl.contains("user-123"));
        assert!(jsonl.contains("/auth/signup"));
        assert!(jsonl.contains("created"));
    }

    #[test]
    fn test_event_type_names() {
        for (event_type, name) in [
            (EventType::Signup, "signup"),
            (EventType::Login, "login"),
            (EventType::ListingCreated, "listing_created"),
            (EventType::FilingCreated, "filing_created"),
            (EventType::StepUpdate, "step_update"),
            (EventType::AiCall, "ai_call"),
        ] {
            let json = serde_json::to_string(&event_type).unwrap();
            assert_eq!(json, format!("\"{}\"", name));
        }
    }

    #[test]
    fn test_metadata_skipped_when_absent() {
        let event = UsageEvent::new(
            EventType::AiCall,
            "node-1".to_string(),
            "/api/ipr-chat".to_string(),
            "success".to_string(),
        );

        let jsonl = event.to_jsonl().unwrap();
        assert!(!jsonl.contains("metadata"));

        let tagged = event.with_metadata(serde_json::json!({"model": "gemini-2.0-flash"}));
        let jsonl = tagged.to_jsonl().unwrap();
        assert!(jsonl.contains("gemini-2.0-flash"));
    }
}
