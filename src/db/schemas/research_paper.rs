//! Research paper schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for research papers
pub const PAPER_COLLECTION: &str = "research_papers";

/// Research paper stored in MongoDB
///
/// Engagement counters (citations, views, downloads) are incremented with
/// `$inc` updates; lost increments under concurrent races are acceptable,
/// tracking is best-effort.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PaperDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable paper identifier (UUID)
    pub paper_id: String,

    /// Owning user
    pub user_id: String,

    /// Paper title
    pub title: String,

    /// Abstract text
    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Research category (Artificial Intelligence, Blockchain, ...)
    #[serde(default)]
    pub category: String,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Publication year
    #[serde(default)]
    pub year: i32,

    /// Author list
    #[serde(default)]
    pub authors: Vec<String>,

    /// Journal or venue
    #[serde(default)]
    pub journal: String,

    /// Publication types (Journal Article, Conference Paper, ...)
    #[serde(default)]
    pub types: Vec<String>,

    /// Publication status (Published, Under Review, ...)
    #[serde(default)]
    pub status: String,

    /// Whether the paper appears in the public listing
    #[serde(default)]
    pub is_public: bool,

    /// Link to the full PDF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    /// Display name of the submitting author
    #[serde(default)]
    pub author_name: String,

    /// Citation count
    #[serde(default)]
    pub citations: i64,

    /// View count
    #[serde(default)]
    pub views: i64,

    /// Download count
    #[serde(default)]
    pub downloads: i64,
}

impl PaperDoc {
    /// Create a new paper owned by `user_id`
    pub fn new(user_id: String, title: String, abstract_text: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            paper_id: uuid::Uuid::new_v4().to_string(),
            user_id,
            title,
            abstract_text,
            ..Default::default()
        }
    }
}

impl IntoIndexes for PaperDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "paper_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("paper_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("paper_user_index".to_string())
                        .build(),
                ),
            ),
            // Public listing scans filter on is_public, newest first
            (
                doc! { "is_public": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("paper_public_recent_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for PaperDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
