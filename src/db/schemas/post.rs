//! Feed post schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for feed posts
pub const POST_COLLECTION: &str = "posts";

/// Social feed post stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PostDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable post identifier (UUID)
    pub post_id: String,

    /// Authoring user
    pub user_id: String,

    /// Post body
    pub content: String,

    /// Attached media links
    #[serde(default)]
    pub media_urls: Vec<String>,

    /// Post kind (update, milestone, question, ...)
    #[serde(default)]
    pub post_type: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PostDoc {
    /// Create a new post by `user_id`
    pub fn new(user_id: String, content: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            post_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            content,
            media_urls: Vec::new(),
            post_type: String::new(),
            tags: Vec::new(),
        }
    }
}

impl IntoIndexes for PostDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "post_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("post_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("post_user_index".to_string())
                        .build(),
                ),
            ),
            // Feed order
            (
                doc! { "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("post_recent_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PostDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
