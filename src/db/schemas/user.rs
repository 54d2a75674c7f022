//! User document schema
//!
//! Stores account credentials and the founder/researcher profile.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Stable user identifier (UUID)
    pub user_id: String,

    /// Display name
    pub full_name: String,

    /// Login email (unique)
    pub email: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Network role (founder, investor, student, ...)
    pub role: String,

    /// Company, university, or institution
    pub organization: String,

    /// Selected domains of interest
    #[serde(default)]
    pub domain_of_interest: Vec<String>,

    /// LinkedIn profile URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,

    /// Portfolio / GitHub URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,

    /// Short bio (max 200 characters, validated at signup)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    /// Profile picture as a data URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,

    /// Whether the account is active
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl UserDoc {
    /// Create a new user document
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        full_name: String,
        email: String,
        password_hash: String,
        role: String,
        organization: String,
        domain_of_interest: Vec<String>,
        linkedin: Option<String>,
        github: Option<String>,
        bio: Option<String>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id: uuid::Uuid::new_v4().to_string(),
            full_name,
            email,
            password_hash,
            role,
            organization,
            domain_of_interest,
            linkedin,
            github,
            bio,
            profile_pic: None,
            is_active: true,
        }
    }

    /// Wire-safe view without credentials
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            user_id: self.user_id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            organization: self.organization.clone(),
            domain_of_interest: self.domain_of_interest.clone(),
            linkedin: self.linkedin.clone(),
            github: self.github.clone(),
            bio: self.bio.clone(),
            profile_pic: self.profile_pic.clone(),
            created_at: self
                .metadata
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// User profile returned over the API (never includes the password hash)
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PublicUser {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub organization: String,
    pub domain_of_interest: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on email
            (
                doc! { "email": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("email_unique".to_string())
                        .build(),
                ),
            ),
            // Index on user_id for lookups
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("user_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
