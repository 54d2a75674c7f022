//! Mirrored IPR filing schema
//!
//! The in-process `FilingStore` is authoritative for a running instance;
//! this collection is a write-through mirror kept for durability and
//! inspection. Mirror writes are never retried on failure.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::ipr::Filing;

/// Collection name for mirrored filings
pub const FILING_COLLECTION: &str = "filings";

/// IPR filing mirrored to MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FilingDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// The filing snapshot
    pub filing: Filing,
}

impl FilingDoc {
    pub fn new(filing: Filing) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            filing,
        }
    }
}

impl IntoIndexes for FilingDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "filing.id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("filing_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "filing.userId": 1 },
                Some(
                    IndexOptions::builder()
                        .name("filing_user_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for FilingDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
