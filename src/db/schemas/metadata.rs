//! Document bookkeeping shared by every collection
//!
//! Listings are soft-deleted: `is_deleted` flips on and the document
//! stays in place, so reads must filter on it (the collection wrapper
//! does this automatically).

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Timestamps and deletion state embedded in every document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(default)]
    pub is_deleted: bool,

    /// Set when the document is soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata stamped with the current time
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            is_deleted: false,
            deleted_at: None,
            updated_at: Some(now),
            created_at: Some(now),
        }
    }

    /// Refresh the updated_at stamp
    pub fn touch(&mut self) {
        self.updated_at = Some(DateTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stamps_timestamps() {
        let meta = Metadata::new();
        assert!(!meta.is_deleted);
        assert!(meta.created_at.is_some());
        assert!(meta.updated_at.is_some());
        assert!(meta.deleted_at.is_none());
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let json = serde_json::to_value(Metadata::default()).unwrap();
        assert_eq!(json.get("is_deleted"), Some(&serde_json::json!(false)));
        assert!(json.get("deleted_at").is_none());
        assert!(json.get("created_at").is_none());
    }
}
