//! Startup listing routes
//!
//! - GET    /api/startups           - All listings, newest registration first
//! - GET    /api/startups?user_id=X - Listings owned by one user
//! - POST   /api/startups           - Create a listing (auth)
//! - GET    /api/startups/{id}      - Single listing
//! - PUT    /api/startups/{id}      - Owner-only update
//! - DELETE /api/startups/{id}      - Owner-only soft delete

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::can_modify_resource;
use crate::db::schemas::{StartupDoc, STARTUP_COLLECTION};
use crate::logging::EventType;
use crate::routes::api::{
    authenticate, cors_preflight, db_unavailable, error_response, internal_error, json_response,
    not_found, parse_json_body, parse_query_params, validation_error, BoxBody, ErrorResponse,
    SuccessResponse, JSON_BODY_LIMIT,
};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateStartupRequest {
    pub name: String,
    pub idea_summary: String,
    pub stage: String,
    pub funding_status: String,
    pub website: Option<String>,
    pub pitch_deck_url: Option<String>,
    pub registered_on: String,
}

/// Update body; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStartupRequest {
    pub name: Option<String>,
    pub idea_summary: Option<String>,
    pub stage: Option<String>,
    pub funding_status: Option<String>,
    pub website: Option<String>,
    pub pitch_deck_url: Option<String>,
    pub registered_on: Option<String>,
}

/// Startup listing as returned over the API
#[derive(Debug, Serialize)]
pub struct ApiStartup {
    pub startup_id: String,
    pub user_id: String,
    pub name: String,
    pub idea_summary: String,
    pub stage: String,
    pub funding_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_deck_url: Option<String>,
    pub registered_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartupsResponse {
    pub startups: Vec<ApiStartup>,
}

#[derive(Debug, Serialize)]
pub struct StartupResponse {
    pub startup: ApiStartup,
}

fn startup_to_api(doc: &StartupDoc) -> ApiStartup {
    ApiStartup {
        startup_id: doc.startup_id.clone(),
        user_id: doc.user_id.clone(),
        name: doc.name.clone(),
        idea_summary: doc.idea_summary.clone(),
        stage: doc.stage.clone(),
        funding_status: doc.funding_status.clone(),
        website: doc.website.clone(),
        pitch_deck_url: doc.pitch_deck_url.clone(),
        registered_on: doc.registered_on.clone(),
        created_at: doc
            .metadata
            .created_at
            .and_then(|d| d.try_to_rfc3339_string().ok()),
    }
}

/// GET /api/startups
async fn handle_list_startups(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<StartupDoc>(STARTUP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let params = parse_query_params(query);
    let result = match params.get("user_id") {
        Some(user_id) => collection.find_many(doc! { "user_id": user_id }).await,
        None => {
            collection
                .find_many_sorted(doc! {}, Some(doc! { "registered_on": -1 }))
                .await
        }
    };

    match result {
        Ok(docs) => json_response(
            StatusCode::OK,
            &StartupsResponse {
                startups: docs.iter().map(startup_to_api).collect(),
            },
        ),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// POST /api/startups
async fn handle_create_startup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: CreateStartupRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if body.name.trim().is_empty() || body.idea_summary.trim().is_empty() {
        return validation_error("Missing required fields: name and idea_summary");
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<StartupDoc>(STARTUP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let mut startup = StartupDoc::new(
        claims.sub.clone(),
        body.name.trim().to_string(),
        body.idea_summary.trim().to_string(),
    );
    startup.stage = body.stage;
    startup.funding_status = body.funding_status;
    startup.website = body.website.filter(|s| !s.is_empty());
    startup.pitch_deck_url = body.pitch_deck_url.filter(|s| !s.is_empty());
    startup.registered_on = body.registered_on;

    if let Err(e) = collection.insert_one(startup.clone()).await {
        return internal_error(format!("Failed to create startup: {}", e));
    }

    info!("Created startup listing {} for {}", startup.startup_id, claims.sub);

    if let Some(usage) = &state.usage {
        usage
            .log_event(
                EventType::ListingCreated,
                "/api/startups",
                Some(&claims.sub),
                "created",
            )
            .await;
    }

    json_response(
        StatusCode::CREATED,
        &StartupResponse {
            startup: startup_to_api(&startup),
        },
    )
}

/// GET /api/startups/{id}
async fn handle_get_startup(state: Arc<AppState>, startup_id: &str) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<StartupDoc>(STARTUP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    match collection.find_one(doc! { "startup_id": startup_id }).await {
        Ok(Some(startup)) => json_response(
            StatusCode::OK,
            &StartupResponse {
                startup: startup_to_api(&startup),
            },
        ),
        Ok(None) => not_found("Startup not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// PUT /api/startups/{id}
async fn handle_update_startup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    startup_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: UpdateStartupRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return validation_error("Missing required fields: name and idea_summary");
        }
    }
    if let Some(idea_summary) = &body.idea_summary {
        if idea_summary.trim().is_empty() {
            return validation_error("Missing required fields: name and idea_summary");
        }
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<StartupDoc>(STARTUP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let existing = match collection.find_one(doc! { "startup_id": &startup_id }).await {
        Ok(Some(s)) => s,
        Ok(None) => return not_found("Startup not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &existing.user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only update your own startup listings",
            "FORBIDDEN",
        );
    }

    let mut set = doc! { "metadata.updated_at": bson::DateTime::now() };
    if let Some(name) = &body.name {
        set.insert("name", name.trim());
    }
    if let Some(idea_summary) = &body.idea_summary {
        set.insert("idea_summary", idea_summary.trim());
    }
    if let Some(stage) = &body.stage {
        set.insert("stage", stage);
    }
    if let Some(funding_status) = &body.funding_status {
        set.insert("funding_status", funding_status);
    }
    if let Some(website) = &body.website {
        if website.is_empty() {
            set.insert("website", bson::Bson::Null);
        } else {
            set.insert("website", website);
        }
    }
    if let Some(pitch_deck_url) = &body.pitch_deck_url {
        if pitch_deck_url.is_empty() {
            set.insert("pitch_deck_url", bson::Bson::Null);
        } else {
            set.insert("pitch_deck_url", pitch_deck_url);
        }
    }
    if let Some(registered_on) = &body.registered_on {
        set.insert("registered_on", registered_on);
    }

    let result = collection
        .update_one(doc! { "startup_id": &startup_id }, doc! { "$set": set })
        .await;
    if let Err(e) = result {
        return internal_error(format!("Database error: {}", e));
    }

    match collection.find_one(doc! { "startup_id": &startup_id }).await {
        Ok(Some(startup)) => json_response(
            StatusCode::OK,
            &StartupResponse {
                startup: startup_to_api(&startup),
            },
        ),
        Ok(None) => not_found("Startup not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// DELETE /api/startups/{id}
async fn handle_delete_startup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    startup_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<StartupDoc>(STARTUP_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let existing = match collection.find_one(doc! { "startup_id": &startup_id }).await {
        Ok(Some(s)) => s,
        Ok(None) => return not_found("Startup not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &existing.user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only delete your own startup listings",
            "FORBIDDEN",
        );
    }

    if let Err(e) = collection.soft_delete(doc! { "startup_id": &startup_id }).await {
        return internal_error(format!("Database error: {}", e));
    }

    info!("Deleted startup listing {}", startup_id);

    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Startup deleted successfully".to_string(),
        },
    )
}

/// Handle /api/startups/* requests.
///
/// Returns Some(response) if the request was handled, None if not a
/// startups route.
pub async fn handle_startup_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if path != "/api/startups" && !path.starts_with("/api/startups/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let query = req.uri().query().unwrap_or("").to_string();
    let id = path
        .strip_prefix("/api/startups/")
        .map(|rest| rest.to_string());

    let response = match (method, id) {
        (Method::GET, None) => handle_list_startups(state, &query).await,
        (Method::POST, None) => handle_create_startup(req, state).await,
        (Method::GET, Some(id)) => handle_get_startup(state, &id).await,
        (Method::PUT, Some(id)) => handle_update_startup(req, state, id).await,
        (Method::DELETE, Some(id)) => handle_delete_startup(req, state, id).await,
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
    fn test_startup_to_api() {
        let mut doc = StartupDoc::new(
            "user-1".to_string(),
            "Helio".to_string(),
            "Solar microgrids for rural clinics".to_string(),
        );
        doc.registered_on = "2024-03-01".to_string();

        let api = startup_to_api(&doc);
        assert_eq!(api.user_id, "user-1");
        assert_eq!(api.name, "Helio");
        assert_eq!(api.registered_on, "2024-03-01");
        assert!(api.website.is_none());
        assert!(api.created_at.is_some());
    }

    #[test]
    fn test_create_requires_name_and_summary() {
        let body = CreateStartupRequest {
            name: "  ".to_string(),
            idea_summary: "something".to_string(),
            ..Default::default()
        };
        assert!(body.name.trim().is_empty() || body.idea_summary.trim().is_empty());

        let body = CreateStartupRequest {
            name: "Helio".to_string(),
            idea_summary: String::new(),
            ..Default::default()
        };
        assert!(body.name.trim().is_empty() || body.idea_summary.trim().is_empty());
    }
}
