//! Startup listing schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for startup listings
pub const STARTUP_COLLECTION: &str = "startups";

/// Startup listing stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StartupDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable listing identifier (UUID)
    pub startup_id: String,

    /// Owning user
    pub user_id: String,

    /// Startup name
    pub name: String,

    /// One-paragraph pitch
    pub idea_summary: String,

    /// Funding stage (Idea, MVP, Seed, ...)
    #[serde(default)]
    pub stage: String,

    /// Funding status (Bootstrapped, Raising, Funded, ...)
    #[serde(default)]
    pub funding_status: String,

    /// Company website
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Pitch deck link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_deck_url: Option<String>,

    /// Registration date (ISO date string, as entered by the founder)
    #[serde(default)]
    pub registered_on: String,
}

impl StartupDoc {
    /// Create a new listing owned by `user_id`
    pub fn new(user_id: String, name: String, idea_summary: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            startup_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            name,
            idea_summary,
            stage: String::new(),
            funding_status: String::new(),
            website: None,
            pitch_deck_url: None,
            registered_on: String::new(),
        }
    }
}

impl IntoIndexes for StartupDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "startup_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("startup_id_unique".to_string())
                        .build(),
                ),
            ),
            // Owner lookups for "my startups"
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("startup_user_index".to_string())
                        .build(),
                ),
            ),
            // Listing order: newest registrations first
            (
                doc! { "registered_on": -1 },
                Some(
                    IndexOptions::builder()
                        .name("registered_on_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for StartupDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
