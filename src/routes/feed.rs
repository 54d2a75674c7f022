//! Community feed routes
//!
//! - GET    /api/posts           - Feed, newest first
//! - GET    /api/posts?user_id=X - One user's posts
//! - POST   /api/posts           - Publish a post (auth)
//! - DELETE /api/posts/{id}      - Owner-only delete

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::can_modify_resource;
use crate::db::schemas::{PostDoc, POST_COLLECTION};
use crate::routes::api::{
    authenticate, cors_preflight, db_unavailable, error_response, internal_error, json_response,
    not_found, parse_json_body, parse_query_params, validation_error, BoxBody, ErrorResponse,
    SuccessResponse, JSON_BODY_LIMIT,
};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub content: String,
    pub media_urls: Vec<String>,
    pub post_type: String,
    pub tags: Vec<String>,
}

/// Post as returned over the API
#[derive(Debug, Serialize)]
pub struct ApiPost {
    pub post_id: String,
    pub user_id: String,
    pub content: String,
    pub media_urls: Vec<String>,
    pub post_type: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<ApiPost>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: ApiPost,
}

fn post_to_api(doc: &PostDoc) -> ApiPost {
    ApiPost {
        post_id: doc.post_id.clone(),
        user_id: doc.user_id.clone(),
        content: doc.content.clone(),
        media_urls: doc.media_urls.clone(),
        post_type: doc.post_type.clone(),
        tags: doc.tags.clone(),
        created_at: doc
            .metadata
            .created_at
            .and_then(|d| d.try_to_rfc3339_string().ok()),
    }
}

/// GET /api/posts
async fn handle_list_posts(state: Arc<AppState>, query: &str) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PostDoc>(POST_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let params = parse_query_params(query);
    let filter = match params.get("user_id") {
        Some(user_id) => doc! { "user_id": user_id },
        None => doc! {},
    };

    match collection
        .find_many_sorted(filter, Some(doc! { "metadata.created_at": -1 }))
        .await
    {
        Ok(docs) => json_response(
            StatusCode::OK,
            &PostsResponse {
                posts: docs.iter().map(post_to_api).collect(),
            },
        ),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// POST /api/posts
async fn handle_create_post(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: CreatePostRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if body.content.trim().is_empty() {
        return validation_error("Post content is required");
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PostDoc>(POST_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let mut post = PostDoc::new(claims.sub.clone(), body.content.trim().to_string());
    post.media_urls = body.media_urls;
    post.post_type = body.post_type;
    post.tags = body.tags;

    if let Err(e) = collection.insert_one(post.clone()).await {
        return internal_error(format!("Failed to create post: {}", e));
    }

    info!("Created post {} for {}", post.post_id, claims.sub);

    json_response(
        StatusCode::CREATED,
        &PostResponse {
            post: post_to_api(&post),
        },
    )
}

/// DELETE /api/posts/{id}
async fn handle_delete_post(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    post_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PostDoc>(POST_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let existing = match collection.find_one(doc! { "post_id": &post_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => return not_found("Post not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &existing.user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only delete your own posts",
            "FORBIDDEN",
        );
    }

    if let Err(e) = collection.soft_delete(doc! { "post_id": &post_id }).await {
        return internal_error(format!("Database error: {}", e));
    }

    info!("Deleted post {}", post_id);

    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Post deleted successfully".to_string(),
        },
    )
}

/// Handle /api/posts/* requests.
///
/// Returns Some(response) if the request was handled, None if not a
/// posts route.
pub async fn handle_feed_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if path != "/api/posts" && !path.starts_with("/api/posts/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let query = req.uri().query().unwrap_or("").to_string();
    let id = path.strip_prefix("/api/posts/").map(|rest| rest.to_string());

    let response = match (method, id) {
        (Method::GET, None) => handle_list_posts(state, &query).await,
        (Method::POST, None) => handle_create_post(req, state).await,
        (Method::DELETE, Some(id)) => handle_delete_post(req, state, id).await,
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
    fn test_post_to_api() {
        let mut post = PostDoc::new("user-9".to_string(), "Shipped our beta".to_string());
        post.tags = vec!["milestone".to_string()];

        let api = post_to_api(&post);
        assert_eq!(api.user_id, "user-9");
        assert_eq!(api.content, "Shipped our beta");
        assert_eq!(api.tags, vec!["milestone"]);
        assert!(api.created_at.is_some());
    }

    #[test]
    fn test_content_required() {
        let body = CreatePostRequest {
            content: "   ".to_string(),
            ..Default::default()
        };
        assert!(body.content.trim().is_empty());
    }
}
