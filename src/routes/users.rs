//! User profile routes
//!
//! - GET  /api/users/{id}        - Public profile
//! - PUT  /api/users/{id}        - Owner-only profile update
//! - POST /api/users/{id}/avatar - Owner-only profile picture upload
//! - GET  /api/domains           - Canonical domain-of-interest list
//! - GET  /api/roles             - Canonical role list

use base64::{engine::general_purpose, Engine as _};
use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::can_modify_resource;
use crate::db::schemas::{PublicUser, UserDoc, USER_COLLECTION};
use crate::routes::api::{
    authenticate, cors_preflight, db_unavailable, error_response, internal_error, json_response,
    not_found, parse_json_body, validation_error, BoxBody, ErrorResponse, AVATAR_BODY_LIMIT,
    JSON_BODY_LIMIT,
};
use crate::server::AppState;

/// Canonical domains of interest offered at signup
pub const DOMAINS: [&str; 26] = [
    "Artificial Intelligence",
    "Machine Learning",
    "Blockchain",
    "IoT",
    "Cybersecurity",
    "Biotechnology",
    "Healthcare",
    "FinTech",
    "EdTech",
    "AgriTech",
    "CleanTech",
    "Robotics",
    "Data Science",
    "Cloud Computing",
    "Mobile Development",
    "Web Development",
    "DevOps",
    "UI/UX Design",
    "Product Management",
    "Digital Marketing",
    "E-commerce",
    "Gaming",
    "AR/VR",
    "Quantum Computing",
    "Nanotechnology",
    "Renewable Energy",
];

/// Network roles offered at signup
pub const ROLES: [&str; 8] = [
    "founder",
    "co-founder",
    "investor",
    "mentor",
    "developer",
    "designer",
    "student",
    "other",
];

const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// 5 MB cap on the decoded image
const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Envelope for single-user responses
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: &'static [&'static str],
}

/// Profile update; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    pub domains: Option<Vec<String>>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvatarRequest {
    pub file_name: String,
    pub content_type: String,
    /// Base64 image payload, with or without a data-URL prefix
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    pub success: bool,
    pub file_name: String,
    pub user: PublicUser,
}

/// Parsed /api/users/{id}[/avatar] route
#[derive(Debug, PartialEq)]
struct UserRoute<'a> {
    user_id: &'a str,
    avatar: bool,
}

impl<'a> UserRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/users")?;
        let stripped = stripped.strip_prefix('/').unwrap_or(stripped);

        match stripped.split_once('/') {
            None => Some(Self {
                user_id: stripped,
                avatar: false,
            }),
            Some((id, "avatar")) => Some(Self {
                user_id: id,
                avatar: true,
            }),
            Some(_) => None,
        }
    }
}

/// Same per-field rules as signup, applied only to supplied fields
fn validate_update(body: &UpdateProfileRequest) -> Result<(), String> {
    if let Some(full_name) = &body.full_name {
        if full_name.trim().chars().count() < 2 {
            return Err("Full name must be at least 2 characters".into());
        }
    }

    if let Some(role) = &body.role {
        if !ROLES.contains(&role.as_str()) {
            return Err("Please select your role".into());
        }
    }

    if let Some(organization) = &body.organization {
        if organization.trim().is_empty() {
            return Err("Organization/Institute name is required".into());
        }
    }

    if let Some(domains) = &body.domains {
        if domains.is_empty() {
            return Err("Please select at least one domain of interest".into());
        }
        for domain in domains {
            if !DOMAINS.contains(&domain.as_str()) {
                return Err(format!("Unknown domain of interest: {}", domain));
            }
        }
    }

    if let Some(linkedin) = body.linkedin.as_deref().filter(|s| !s.is_empty()) {
        if !linkedin.contains("linkedin.com") {
            return Err("Please enter a valid LinkedIn URL".into());
        }
    }

    if let Some(github) = body.github.as_deref().filter(|s| !s.is_empty()) {
        let after_scheme = github
            .strip_prefix("http://")
            .or_else(|| github.strip_prefix("https://"));
        if !after_scheme.is_some_and(|rest| !rest.is_empty()) {
            return Err("Please enter a valid URL (starting with http:// or https://)".into());
        }
    }

    if let Some(bio) = &body.bio {
        if bio.chars().count() > 200 {
            return Err("Bio must be 200 characters or less".into());
        }
    }

    Ok(())
}

/// Build the `$set` document from supplied fields only, so fields the
/// caller left out keep their stored values. Empty link/bio strings
/// clear the stored value.
fn profile_update_doc(body: &UpdateProfileRequest) -> bson::Document {
    let mut set = doc! { "metadata.updated_at": bson::DateTime::now() };
    if let Some(full_name) = &body.full_name {
        set.insert("full_name", full_name.trim());
    }
    if let Some(role) = &body.role {
        set.insert("role", role);
    }
    if let Some(organization) = &body.organization {
        set.insert("organization", organization.trim());
    }
    if let Some(domains) = &body.domains {
        set.insert("domain_of_interest", domains);
    }
    if let Some(linkedin) = &body.linkedin {
        if linkedin.is_empty() {
            set.insert("linkedin", bson::Bson::Null);
        } else {
            set.insert("linkedin", linkedin);
        }
    }
    if let Some(github) = &body.github {
        if github.is_empty() {
            set.insert("github", bson::Bson::Null);
        } else {
            set.insert("github", github);
        }
    }
    if let Some(bio) = &body.bio {
        if bio.is_empty() {
            set.insert("bio", bson::Bson::Null);
        } else {
            set.insert("bio", bio);
        }
    }
    if let Some(profile_pic) = body.profile_pic.as_deref().filter(|s| !s.is_empty()) {
        set.insert("profile_pic", profile_pic);
    }
    set
}

/// File extension for the stored avatar name: taken from the uploaded
/// file name, falling back to the content-type subtype
fn avatar_extension<'a>(file_name: &'a str, content_type: &'a str) -> &'a str {
    if let Some((_, ext)) = file_name.rsplit_once('.') {
        if !ext.is_empty() {
            return ext;
        }
    }
    content_type.rsplit('/').next().unwrap_or("jpg")
}

/// GET /api/users/{id}
async fn handle_get_user(state: Arc<AppState>, user_id: &str) -> Response<BoxBody> {
    if user_id.is_empty() {
        return validation_error("User ID is required");
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    match collection.find_one(doc! { "user_id": user_id }).await {
        Ok(Some(user)) => json_response(
            StatusCode::OK,
            &UserResponse {
                user: user.to_public(),
            },
        ),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// PUT /api/users/{id}
async fn handle_update_user(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: String,
) -> Response<BoxBody> {
    if user_id.is_empty() {
        return validation_error("User ID is required");
    }

    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only update your own profile",
            "FORBIDDEN",
        );
    }

    let body: UpdateProfileRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: format!("Invalid JSON body: {}", e),
                    code: None,
                },
            )
        }
    };

    if let Err(message) = validate_update(&body) {
        return validation_error(message);
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let set = profile_update_doc(&body);
    let result = collection
        .update_one(doc! { "user_id": &user_id }, doc! { "$set": set })
        .await;
    match result {
        Ok(r) if r.matched_count == 0 => return not_found("User not found"),
        Ok(_) => {}
        Err(e) => return internal_error(format!("Database error: {}", e)),
    }

    match collection.find_one(doc! { "user_id": &user_id }).await {
        Ok(Some(user)) => json_response(
            StatusCode::OK,
            &UserResponse {
                user: user.to_public(),
            },
        ),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// POST /api/users/{id}/avatar
async fn handle_avatar_upload(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    user_id: String,
) -> Response<BoxBody> {
    if user_id.is_empty() {
        return validation_error("User ID is required");
    }

    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only upload your own profile picture",
            "FORBIDDEN",
        );
    }

    let body: AvatarRequest = match parse_json_body(req, AVATAR_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse {
                    error: format!("Invalid JSON body: {}", e),
                    code: None,
                },
            )
        }
    };

    if body.data.is_empty() {
        return validation_error("File and userId are required");
    }
    if !ALLOWED_IMAGE_TYPES.contains(&body.content_type.as_str()) {
        return validation_error("Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.");
    }

    // Accept either bare base64 or a full data URL
    let encoded = body
        .data
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(&body.data);
    let decoded = match general_purpose::STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return validation_error("Invalid image data"),
    };
    if decoded.len() > MAX_AVATAR_BYTES {
        return validation_error("File size must be less than 5MB");
    }

    let millis = chrono::Utc::now().timestamp_millis();
    let ext = avatar_extension(&body.file_name, &body.content_type);
    let file_name = format!("profiles/profile-{}-{}.{}", user_id, millis, ext);

    // The image lives inline on the user document as a data URL; a new
    // upload overwrites whatever was there
    let data_url = format!("data:{};base64,{}", body.content_type, encoded.trim());

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let update = doc! {
        "$set": {
            "profile_pic": &data_url,
            "metadata.updated_at": bson::DateTime::now(),
        }
    };
    match collection.update_one(doc! { "user_id": &user_id }, update).await {
        Ok(r) if r.matched_count == 0 => return not_found("User not found"),
        Ok(_) => {}
        Err(e) => return internal_error(format!("Database error: {}", e)),
    }

    info!(
        "Updated profile picture for {} ({} bytes as {})",
        user_id,
        decoded.len(),
        file_name
    );

    match collection.find_one(doc! { "user_id": &user_id }).await {
        Ok(Some(user)) => json_response(
            StatusCode::OK,
            &AvatarResponse {
                success: true,
                file_name,
                user: user.to_public(),
            },
        ),
        Ok(None) => not_found("User not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// GET /api/domains
pub fn domains_list() -> Response<BoxBody> {
    json_response(StatusCode::OK, &ListResponse { items: &DOMAINS })
}

/// GET /api/roles
pub fn roles_list() -> Response<BoxBody> {
    json_response(StatusCode::OK, &ListResponse { items: &ROLES })
}

/// Handle /api/users/* requests.
///
/// Returns Some(response) if the request was handled, None if not a
/// users route.
pub async fn handle_user_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if !path.starts_with("/api/users") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path).to_string();
    let route = match UserRoute::parse(&path) {
        Some(r) => r,
        None => return Some(not_found("User endpoint not found")),
    };
    let user_id = route.user_id.to_string();

    let response = match (method, route.avatar) {
        (Method::GET, false) => handle_get_user(state, &user_id).await,
        (Method::PUT, false) => handle_update_user(req, state, user_id).await,
        (Method::POST, true) => handle_avatar_upload(req, state, user_id).await,
        _ => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parse() {
        let route = UserRoute::parse("/api/users/user-123").unwrap();
        assert_eq!(route.user_id, "user-123");
        assert!(!route.avatar);

        let route = UserRoute::parse("/api/users/user-123/avatar").unwrap();
        assert_eq!(route.user_id, "user-123");
        assert!(route.avatar);

        // Empty id still parses; the handler answers 400
        let route = UserRoute::parse("/api/users/").unwrap();
        assert_eq!(route.user_id, "");

        assert!(UserRoute::parse("/api/users/user-123/extra/deep").is_none());
    }

    #[test]
    fn test_canonical_lists() {
        assert_eq!(DOMAINS.len(), 26);
        assert!(DOMAINS.contains(&"Quantum Computing"));
        assert_eq!(ROLES.len(), 8);
        assert!(ROLES.contains(&"co-founder"));
    }

    #[test]
    fn test_update_validation_applies_to_present_fields_only() {
        let empty = UpdateProfileRequest::default();
        assert!(validate_update(&empty).is_ok());

        let bad_name = UpdateProfileRequest {
            full_name: Some("A".into()),
            ..Default::default()
        };
        assert_eq!(
            validate_update(&bad_name).unwrap_err(),
            "Full name must be at least 2 characters"
        );

        let clears_links = UpdateProfileRequest {
            linkedin: Some(String::new()),
            github: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_update(&clears_links).is_ok());
    }

    #[test]
    fn test_avatar_extension() {
        assert_eq!(avatar_extension("me.png", "image/png"), "png");
        assert_eq!(avatar_extension("archive.tar.gz", "image/png"), "gz");
        assert_eq!(avatar_extension("noext", "image/webp"), "webp");
        assert_eq!(avatar_extension("", "image/jpeg"), "jpeg");
    }

    #[test]
    fn test_update_doc_leaves_unspecified_fields_alone() {
        let body = UpdateProfileRequest {
            full_name: Some("  Asha Rao ".into()),
            bio: Some(String::new()),
            ..Default::default()
        };

        let set = profile_update_doc(&body);
        assert_eq!(set.get_str("full_name").unwrap(), "Asha Rao");
        assert_eq!(set.get("bio"), Some(&bson::Bson::Null));
        assert!(set.contains_key("metadata.updated_at"));

        // Everything the caller left out stays out of the $set
        for untouched in ["role", "organization", "domain_of_interest", "linkedin", "github", "profile_pic"] {
            assert!(!set.contains_key(untouched), "{} should be absent", untouched);
        }
    }
}
