//! Permission levels and resource ownership checks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Permission levels for API operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
#[derive(Default)]
pub enum PermissionLevel {
    /// No authentication - public listings and health probes
    #[default]
    Public = 0,
    /// Authenticated user - owns listings, filings, and a profile
    Authenticated = 1,
    /// Admin - may modify any resource
    Admin = 2,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionLevel::Public => write!(f, "PUBLIC"),
            PermissionLevel::Authenticated => write!(f, "AUTHENTICATED"),
            PermissionLevel::Admin => write!(f, "ADMIN"),
        }
    }
}

/// Check whether a caller may modify a resource owned by `owner_id`.
///
/// Owners may modify their own resources; admins may modify anything.
pub fn can_modify_resource(
    caller_id: &str,
    caller_level: PermissionLevel,
    owner_id: &str,
) -> bool {
    if caller_level >= PermissionLevel::Admin {
        return true;
    }
    caller_level >= PermissionLevel::Authenticated && caller_id == owner_id
}
