//! Research paper routes
//!
//! - GET    /api/papers               - Public papers; supports search,
//!   category, year, sort query params
//! - GET    /api/papers?user_id=X     - One user's papers (private included
//!   for the owner)
//! - POST   /api/papers               - Submit a paper (auth)
//! - GET    /api/papers/{id}          - Single paper
//! - PUT    /api/papers/{id}          - Owner-only update
//! - DELETE /api/papers/{id}          - Owner-only soft delete
//! - POST   /api/papers/{id}/view     - Engagement counter
//! - POST   /api/papers/{id}/download - Engagement counter

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{can_modify_resource, Claims};
use crate::db::schemas::{PaperDoc, PAPER_COLLECTION};
use crate::listings::{matches, sort_papers, ListingFilter, SortKey};
use crate::logging::EventType;
use crate::routes::api::{
    authenticate, cors_preflight, db_unavailable, error_response, internal_error, json_response,
    not_found, parse_json_body, parse_query_params, validation_error, BoxBody, ErrorResponse,
    SuccessResponse, JSON_BODY_LIMIT,
};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreatePaperRequest {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub category: String,
    pub tags: Vec<String>,
    pub year: i32,
    pub authors: Vec<String>,
    pub journal: String,
    pub types: Vec<String>,
    pub status: String,
    pub is_public: bool,
    pub pdf_url: Option<String>,
    pub author_name: String,
}

/// Update body; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePaperRequest {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub year: Option<i32>,
    pub authors: Option<Vec<String>>,
    pub journal: Option<String>,
    pub types: Option<Vec<String>>,
    pub status: Option<String>,
    pub is_public: Option<bool>,
    pub pdf_url: Option<String>,
    pub author_name: Option<String>,
}

/// Paper as returned over the API
#[derive(Debug, Serialize)]
pub struct ApiPaper {
    pub paper_id: String,
    pub user_id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub category: String,
    pub tags: Vec<String>,
    pub year: i32,
    pub authors: Vec<String>,
    pub journal: String,
    pub types: Vec<String>,
    pub status: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub author_name: String,
    pub citations: i64,
    pub views: i64,
    pub downloads: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PapersResponse {
    pub papers: Vec<ApiPaper>,
}

#[derive(Debug, Serialize)]
pub struct PaperResponse {
    pub paper: ApiPaper,
}

fn paper_to_api(doc: &PaperDoc) -> ApiPaper {
    ApiPaper {
        paper_id: doc.paper_id.clone(),
        user_id: doc.user_id.clone(),
        title: doc.title.clone(),
        abstract_text: doc.abstract_text.clone(),
        category: doc.category.clone(),
        tags: doc.tags.clone(),
        year: doc.year,
        authors: doc.authors.clone(),
        journal: doc.journal.clone(),
        types: doc.types.clone(),
        status: doc.status.clone(),
        is_public: doc.is_public,
        pdf_url: doc.pdf_url.clone(),
        author_name: doc.author_name.clone(),
        citations: doc.citations,
        views: doc.views,
        downloads: doc.downloads,
        created_at: doc
            .metadata
            .created_at
            .and_then(|d| d.try_to_rfc3339_string().ok()),
    }
}

/// Engagement counter endpoints under /api/papers/{id}/
#[derive(Debug, Clone, Copy, PartialEq)]
enum CounterKind {
    View,
    Download,
}

impl CounterKind {
    fn field(&self) -> &'static str {
        match self {
            CounterKind::View => "views",
            CounterKind::Download => "downloads",
        }
    }
}

/// Parsed /api/papers[/{id}[/view|/download]] route
#[derive(Debug, PartialEq)]
struct PaperRoute<'a> {
    paper_id: Option<&'a str>,
    counter: Option<CounterKind>,
}

impl<'a> PaperRoute<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let stripped = path.strip_prefix("/api/papers")?;
        if stripped.is_empty() {
            return Some(Self {
                paper_id: None,
                counter: None,
            });
        }
        let stripped = stripped.strip_prefix('/')?;

        match stripped.split_once('/') {
            None => Some(Self {
                paper_id: Some(stripped),
                counter: None,
            }),
            Some((id, "view")) => Some(Self {
                paper_id: Some(id),
                counter: Some(CounterKind::View),
            }),
            Some((id, "download")) => Some(Self {
                paper_id: Some(id),
                counter: Some(CounterKind::Download),
            }),
            Some(_) => None,
        }
    }
}

/// GET /api/papers
///
/// Without `user_id` this is the public listing: `is_public` papers,
/// newest first, narrowed by search/category/year and re-sorted when a
/// `sort` key is given. With `user_id` the owner sees everything they
/// wrote; everyone else sees only that user's public papers.
async fn handle_list_papers(
    state: Arc<AppState>,
    query: &str,
    claims: Option<Claims>,
) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let params = parse_query_params(query);

    let filter = match params.get("user_id") {
        Some(owner) => {
            let is_owner = claims
                .as_ref()
                .is_some_and(|c| can_modify_resource(&c.sub, c.permission_level, owner));
            if is_owner {
                doc! { "user_id": owner }
            } else {
                doc! { "user_id": owner, "is_public": true }
            }
        }
        None => doc! { "is_public": true },
    };

    let mut papers = match collection
        .find_many_sorted(filter, Some(doc! { "metadata.created_at": -1 }))
        .await
    {
        Ok(docs) => docs,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let empty = String::new();
    let listing_filter = ListingFilter::new(
        params.get("search").unwrap_or(&empty),
        params.get("category").unwrap_or(&empty),
        params.get("year").unwrap_or(&empty),
    );
    papers.retain(|paper| matches(paper, &listing_filter));

    if let Some(sort) = params.get("sort") {
        sort_papers(&mut papers, SortKey::parse(sort));
    }

    json_response(
        StatusCode::OK,
        &PapersResponse {
            papers: papers.iter().map(paper_to_api).collect(),
        },
    )
}

/// POST /api/papers
async fn handle_create_paper(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: CreatePaperRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if body.title.trim().is_empty() || body.abstract_text.trim().is_empty() {
        return validation_error("Missing required fields: title and abstract");
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let mut paper = PaperDoc::new(
        claims.sub.clone(),
        body.title.trim().to_string(),
        body.abstract_text.trim().to_string(),
    );
    paper.category = body.category;
    paper.tags = body.tags;
    paper.year = body.year;
    paper.authors = body.authors;
    paper.journal = body.journal;
    paper.types = body.types;
    paper.status = body.status;
    paper.is_public = body.is_public;
    paper.pdf_url = body.pdf_url.filter(|s| !s.is_empty());
    paper.author_name = body.author_name;

    if let Err(e) = collection.insert_one(paper.clone()).await {
        return internal_error(format!("Failed to create paper: {}", e));
    }

    info!("Created paper {} for {}", paper.paper_id, claims.sub);

    if let Some(usage) = &state.usage {
        usage
            .log_event(
                EventType::ListingCreated,
                "/api/papers",
                Some(&claims.sub),
                "created",
            )
            .await;
    }

    json_response(
        StatusCode::CREATED,
        &PaperResponse {
            paper: paper_to_api(&paper),
        },
    )
}

/// GET /api/papers/{id}
///
/// Private papers are visible to their owner only; everyone else gets
/// the same 404 as a missing paper.
async fn handle_get_paper(
    state: Arc<AppState>,
    paper_id: &str,
    claims: Option<Claims>,
) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let paper = match collection.find_one(doc! { "paper_id": paper_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => return not_found("Paper not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    if !paper.is_public {
        let is_owner = claims
            .as_ref()
            .is_some_and(|c| can_modify_resource(&c.sub, c.permission_level, &paper.user_id));
        if !is_owner {
            return not_found("Paper not found");
        }
    }

    json_response(
        StatusCode::OK,
        &PaperResponse {
            paper: paper_to_api(&paper),
        },
    )
}

/// PUT /api/papers/{id}
async fn handle_update_paper(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    paper_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: UpdatePaperRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if let Some(title) = &body.title {
        if title.trim().is_empty() {
            return validation_error("Missing required fields: title and abstract");
        }
    }
    if let Some(abstract_text) = &body.abstract_text {
        if abstract_text.trim().is_empty() {
            return validation_error("Missing required fields: title and abstract");
        }
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let existing = match collection.find_one(doc! { "paper_id": &paper_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => return not_found("Paper not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &existing.user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only update your own papers",
            "FORBIDDEN",
        );
    }

    let mut set = doc! { "metadata.updated_at": bson::DateTime::now() };
    if let Some(title) = &body.title {
        set.insert("title", title.trim());
    }
    if let Some(abstract_text) = &body.abstract_text {
        set.insert("abstract", abstract_text.trim());
    }
    if let Some(category) = &body.category {
        set.insert("category", category);
    }
    if let Some(tags) = &body.tags {
        set.insert("tags", tags);
    }
    if let Some(year) = body.year {
        set.insert("year", year);
    }
    if let Some(authors) = &body.authors {
        set.insert("authors", authors);
    }
    if let Some(journal) = &body.journal {
        set.insert("journal", journal);
    }
    if let Some(types) = &body.types {
        set.insert("types", types);
    }
    if let Some(status) = &body.status {
        set.insert("status", status);
    }
    if let Some(is_public) = body.is_public {
        set.insert("is_public", is_public);
    }
    if let Some(pdf_url) = &body.pdf_url {
        if pdf_url.is_empty() {
            set.insert("pdf_url", bson::Bson::Null);
        } else {
            set.insert("pdf_url", pdf_url);
        }
    }
    if let Some(author_name) = &body.author_name {
        set.insert("author_name", author_name);
    }

    let result = collection
        .update_one(doc! { "paper_id": &paper_id }, doc! { "$set": set })
        .await;
    if let Err(e) = result {
        return internal_error(format!("Database error: {}", e));
    }

    match collection.find_one(doc! { "paper_id": &paper_id }).await {
        Ok(Some(paper)) => json_response(
            StatusCode::OK,
            &PaperResponse {
                paper: paper_to_api(&paper),
            },
        ),
        Ok(None) => not_found("Paper not found"),
        Err(e) => internal_error(format!("Database error: {}", e)),
    }
}

/// DELETE /api/papers/{id}
async fn handle_delete_paper(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    paper_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let existing = match collection.find_one(doc! { "paper_id": &paper_id }).await {
        Ok(Some(p)) => p,
        Ok(None) => return not_found("Paper not found"),
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &existing.user_id) {
        return error_response(
            StatusCode::FORBIDDEN,
            "You can only delete your own papers",
            "FORBIDDEN",
        );
    }

    if let Err(e) = collection.soft_delete(doc! { "paper_id": &paper_id }).await {
        return internal_error(format!("Database error: {}", e));
    }

    info!("Deleted paper {}", paper_id);

    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Paper deleted successfully".to_string(),
        },
    )
}

/// POST /api/papers/{id}/view and /api/papers/{id}/download
///
/// Best-effort engagement tracking: a failed increment is logged and
/// still acknowledged, a missing paper is a 404.
async fn handle_track_counter(
    state: Arc<AppState>,
    paper_id: &str,
    kind: CounterKind,
) -> Response<BoxBody> {
    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<PaperDoc>(PAPER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let update = doc! { "$inc": { kind.field(): 1_i64 } };
    match collection.update_one(doc! { "paper_id": paper_id }, update).await {
        Ok(r) if r.matched_count == 0 => not_found("Paper not found"),
        Ok(_) => json_response(
            StatusCode::OK,
            &SuccessResponse {
                success: true,
                message: format!("Tracked {}", kind.field().trim_end_matches('s')),
            },
        ),
        Err(e) => {
            warn!("Failed to track {} for paper {}: {}", kind.field(), paper_id, e);
            json_response(
                StatusCode::OK,
                &SuccessResponse {
                    success: true,
                    message: format!("Tracked {}", kind.field().trim_end_matches('s')),
                },
            )
        }
    }
}

/// Handle /api/papers/* requests.
///
/// Returns Some(response) if the request was handled, None if not a
/// papers route.
pub async fn handle_paper_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if path != "/api/papers" && !path.starts_with("/api/papers/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let query = req.uri().query().unwrap_or("").to_string();
    let path = path.to_string();
    let route = match PaperRoute::parse(&path) {
        Some(r) => r,
        None => return Some(not_found("Paper endpoint not found")),
    };
    let paper_id = route.paper_id.map(|s| s.to_string());

    let response = match (method, paper_id, route.counter) {
        (Method::GET, None, None) => {
            let claims = authenticate(&state, &req).ok();
            handle_list_papers(state, &query, claims).await
        }
        (Method::POST, None, None) => handle_create_paper(req, state).await,
        (Method::GET, Some(id), None) => {
            let claims = authenticate(&state, &req).ok();
            handle_get_paper(state, &id, claims).await
        }
        (Method::PUT, Some(id), None) => handle_update_paper(req, state, id).await,
        (Method::DELETE, Some(id), None) => handle_delete_paper(req, state, id).await,
        (Method::POST, Some(id), Some(kind)) => handle_track_counter(state, &id, kind).await,
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
        let route = PaperRoute::parse("/api/papers").unwrap();
        assert_eq!(route.paper_id, None);
        assert_eq!(route.counter, None);

        let route = PaperRoute::parse("/api/papers/p-1").unwrap();
        assert_eq!(route.paper_id, Some("p-1"));
        assert_eq!(route.counter, None);

        let route = PaperRoute::parse("/api/papers/p-1/view").unwrap();
        assert_eq!(route.counter, Some(CounterKind::View));

        let route = PaperRoute::parse("/api/papers/p-1/download").unwrap();
        assert_eq!(route.counter, Some(CounterKind::Download));

        assert!(PaperRoute::parse("/api/papers/p-1/share").is_none());
    }

    #[test]
    fn test_counter_fields() {
        assert_eq!(CounterKind::View.field(), "views");
        assert_eq!(CounterKind::Download.field(), "downloads");
    }

    #[test]
    fn test_paper_to_api_renames_abstract() {
        let paper = PaperDoc::new(
            "user-1".to_string(),
            "Edge inference".to_string(),
            "On-device model serving".to_string(),
        );
        let api = paper_to_api(&paper);
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["abstract"], "On-device model serving");
        assert!(json.get("abstract_text").is_none());
        assert_eq!(json["citations"], 0);
    }
}
