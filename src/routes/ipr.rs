//! IPR filing tracker routes
//!
//! Filings are served from the in-process `FilingStore`; MongoDB keeps
//! a write-through mirror that is never read on the request path and
//! never retried on failure.
//!
//! - GET    /api/ipr/filings                       - Caller's filings
//! - POST   /api/ipr/filings                       - Open a filing
//! - GET    /api/ipr/filings/{id}                  - Single filing (owner)
//! - PUT    /api/ipr/filings/{id}/steps/{step_id}  - Check or uncheck a step
//! - PUT    /api/ipr/filings/{id}/status           - Lifecycle state
//! - DELETE /api/ipr/filings/{id}                  - Hard delete
//! - GET    /api/ipr/filings/{id}/expiry           - Patent term end
//! - GET    /api/ipr/steps?type=X                  - Step catalog
//! - GET    /api/ipr/types                         - Supported IPR types
//! - POST   /api/ipr/fees                          - Form-1 fee arithmetic
//! - POST   /api/ipr/draft/validate                - Form-1 draft check

use bson::doc;
use chrono::NaiveDate;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::can_modify_resource;
use crate::db::schemas::{FilingDoc, FILING_COLLECTION};
use crate::ipr::{
    apply_step_update, catalog, excess_fee, expiry_date, is_complete, section_title, total_fee,
    validate_section, ApplicationDraft, Filing, FilingStatus, IprType, SheetCounts,
    StepInfo, TrackerError,
};
use crate::logging::EventType;
use crate::routes::api::{
    authenticate, cors_preflight, error_response, json_response, not_found, parse_json_body,
    parse_query_params, validation_error, BoxBody, ErrorResponse, SuccessResponse,
    JSON_BODY_LIMIT,
};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateFilingRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub ipr_type: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StepUpdateRequest {
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Fee calculator body: the base official fee plus the Form-1 sheet
/// counts, all as raw form strings
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeeRequest {
    pub base_fee: String,
    #[serde(flatten)]
    pub counts: SheetCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeResponse {
    pub extra_fee: u32,
    pub total_fee: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DraftValidateRequest {
    /// 1-based section number; absent = validate the whole draft
    pub section: Option<u32>,
    pub draft: ApplicationDraft,
}

#[derive(Debug, Serialize)]
pub struct DraftValidateResponse {
    pub valid: bool,
    pub errors: Vec<String>,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
pub struct FilingsResponse {
    pub filings: Vec<Filing>,
}

#[derive(Debug, Serialize)]
pub struct FilingResponse {
    pub filing: Filing,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsResponse {
    #[serde(rename = "type")]
    pub ipr_type: &'static str,
    pub steps: &'static [StepInfo],
}

#[derive(Debug, Serialize)]
pub struct TypesResponse {
    pub types: [&'static str; 5],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryResponse {
    pub filing_id: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

/// Parsed /api/ipr/* route
#[derive(Debug, PartialEq)]
enum IprRoute {
    Filings,
    Filing(String),
    FilingStep(String, u32),
    FilingStatus(String),
    FilingExpiry(String),
    Steps,
    Types,
    Fees,
    DraftValidate,
}

impl IprRoute {
    fn parse(path: &str) -> Option<Self> {
        let rest = path.strip_prefix("/api/ipr/")?;
        let segments: Vec<&str> = rest.split('/').collect();

        match segments.as_slice() {
            ["filings"] => Some(IprRoute::Filings),
            ["filings", id] => Some(IprRoute::Filing((*id).to_string())),
            ["filings", id, "status"] => Some(IprRoute::FilingStatus((*id).to_string())),
            ["filings", id, "expiry"] => Some(IprRoute::FilingExpiry((*id).to_string())),
            ["filings", id, "steps", step] => step
                .parse()
                .ok()
                .map(|step_id| IprRoute::FilingStep((*id).to_string(), step_id)),
            ["steps"] => Some(IprRoute::Steps),
            ["types"] => Some(IprRoute::Types),
            ["fees"] => Some(IprRoute::Fees),
            ["draft", "validate"] => Some(IprRoute::DraftValidate),
            _ => None,
        }
    }
}

// =============================================================================
// Mongo mirror
// =============================================================================

async fn mirror_insert(state: &AppState, filing: &Filing) {
    let Some(mongo) = &state.mongo else { return };
    match mongo.collection::<FilingDoc>(FILING_COLLECTION).await {
        Ok(collection) => {
            if let Err(e) = collection.insert_one(FilingDoc::new(filing.clone())).await {
                warn!("Failed to mirror filing {} to MongoDB: {}", filing.id, e);
            }
        }
        Err(e) => warn!("Failed to mirror filing {} to MongoDB: {}", filing.id, e),
    }
}

async fn mirror_update(state: &AppState, filing: &Filing) {
    let Some(mongo) = &state.mongo else { return };
    let snapshot = match bson::to_bson(filing) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize filing {} for mirror: {}", filing.id, e);
            return;
        }
    };
    match mongo.collection::<FilingDoc>(FILING_COLLECTION).await {
        Ok(collection) => {
            let update = doc! {
                "$set": {
                    "filing": snapshot,
                    "metadata.updated_at": bson::DateTime::now(),
                }
            };
            if let Err(e) = collection
                .update_one(doc! { "filing.id": &filing.id }, update)
                .await
            {
                warn!("Failed to mirror filing {} update to MongoDB: {}", filing.id, e);
            }
        }
        Err(e) => warn!("Failed to mirror filing {} update to MongoDB: {}", filing.id, e),
    }
}

async fn mirror_remove(state: &AppState, filing_id: &str) {
    let Some(mongo) = &state.mongo else { return };
    match mongo.collection::<FilingDoc>(FILING_COLLECTION).await {
        Ok(collection) => {
            if let Err(e) = collection.delete_one(doc! { "filing.id": filing_id }).await {
                warn!("Failed to remove mirrored filing {}: {}", filing_id, e);
            }
        }
        Err(e) => warn!("Failed to remove mirrored filing {}: {}", filing_id, e),
    }
}

// =============================================================================
// Filing handlers
// =============================================================================

/// GET /api/ipr/filings
async fn handle_list_filings(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    json_response(
        StatusCode::OK,
        &FilingsResponse {
            filings: state.filings.list_for_user(&claims.sub),
        },
    )
}

/// POST /api/ipr/filings
async fn handle_create_filing(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: CreateFilingRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if body.title.trim().is_empty() || body.ipr_type.trim().is_empty() {
        return validation_error("Missing required fields: title and type");
    }
    let ipr_type = match IprType::parse(body.ipr_type.trim()) {
        Some(t) => t,
        None => return validation_error(format!("Unknown IPR type: {}", body.ipr_type)),
    };

    let start_date = body
        .start_date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let filing = Filing::new(
        claims.sub.clone(),
        body.title.trim().to_string(),
        ipr_type,
        body.description.trim().to_string(),
        start_date,
    );

    state.filings.insert(filing.clone());
    mirror_insert(&state, &filing).await;

    info!("Opened {} filing {} for {}", ipr_type, filing.id, claims.sub);

    if let Some(usage) = &state.usage {
        usage
            .log_event(
                EventType::FilingCreated,
                "/api/ipr/filings",
                Some(&claims.sub),
                "created",
            )
            .await;
    }

    json_response(StatusCode::CREATED, &FilingResponse { filing })
}

/// Fetch a filing and enforce ownership. 404 for missing ids, 403 when
/// someone else's filing is addressed.
fn owned_filing(
    state: &AppState,
    claims: &crate::auth::Claims,
    filing_id: &str,
) -> Result<Filing, Response<BoxBody>> {
    let filing = match state.filings.get(filing_id) {
        Some(f) => f,
        None => return Err(not_found("Filing not found")),
    };
    if !can_modify_resource(&claims.sub, claims.permission_level, &filing.user_id) {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "You can only access your own filings",
            "FORBIDDEN",
        ));
    }
    Ok(filing)
}

/// GET /api/ipr/filings/{id}
async fn handle_get_filing(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    filing_id: &str,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    match owned_filing(&state, &claims, filing_id) {
        Ok(filing) => json_response(StatusCode::OK, &FilingResponse { filing }),
        Err(response) => response,
    }
}

/// PUT /api/ipr/filings/{id}/steps/{step_id}
async fn handle_step_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    filing_id: String,
    step_id: u32,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: StepUpdateRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if let Err(response) = owned_filing(&state, &claims, &filing_id) {
        return response;
    }

    let today = chrono::Utc::now().date_naive();
    let outcome = state.filings.update(&filing_id, |filing| {
        apply_step_update(filing, step_id, body.completed, today)
    });

    let filing = match outcome {
        None => return not_found("Filing not found"),
        Some(Err(TrackerError::UnknownStep(step))) => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("step {} does not exist on this filing", step),
                "UNKNOWN_STEP",
            )
        }
        Some(Err(TrackerError::StepLocked(step))) => {
            return error_response(
                StatusCode::FORBIDDEN,
                format!("step {} is locked until the previous step is completed", step),
                "STEP_LOCKED",
            )
        }
        Some(Ok(filing)) => filing,
    };

    mirror_update(&state, &filing).await;

    if let Some(usage) = &state.usage {
        usage
            .log_event(
                EventType::StepUpdate,
                "/api/ipr/filings",
                Some(&claims.sub),
                if body.completed { "completed" } else { "unchecked" },
            )
            .await;
    }

    json_response(StatusCode::OK, &FilingResponse { filing })
}

/// PUT /api/ipr/filings/{id}/status
async fn handle_status_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    filing_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let body: StatusUpdateRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    let status = match FilingStatus::parse(&body.status) {
        Some(s) => s,
        None => {
            return validation_error("Invalid status. Must be one of: active, completed, rejected")
        }
    };

    if let Err(response) = owned_filing(&state, &claims, &filing_id) {
        return response;
    }

    let today = chrono::Utc::now().date_naive();
    let outcome = state.filings.update(&filing_id, |filing| {
        filing.status = status;
        filing.last_updated = today;
        Ok::<(), std::convert::Infallible>(())
    });

    let filing = match outcome {
        None => return not_found("Filing not found"),
        Some(Err(never)) => match never {},
        Some(Ok(filing)) => filing,
    };

    mirror_update(&state, &filing).await;

    json_response(StatusCode::OK, &FilingResponse { filing })
}

/// DELETE /api/ipr/filings/{id}
async fn handle_delete_filing(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    filing_id: String,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    if let Err(response) = owned_filing(&state, &claims, &filing_id) {
        return response;
    }

    if state.filings.remove(&filing_id).is_none() {
        return not_found("Filing not found");
    }
    mirror_remove(&state, &filing_id).await;

    info!("Deleted filing {}", filing_id);

    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Filing deleted successfully".to_string(),
        },
    )
}

/// GET /api/ipr/filings/{id}/expiry
///
/// Only granted patents have a term to report: non-patent filings are a
/// 400, and a patent stays 404 here until its grant step is checked.
async fn handle_filing_expiry(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    filing_id: &str,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let filing = match owned_filing(&state, &claims, filing_id) {
        Ok(f) => f,
        Err(response) => return response,
    };

    if filing.ipr_type != IprType::Patent {
        return validation_error("Expiry dates are only tracked for patent filings");
    }

    let granted = filing
        .steps
        .iter()
        .find(|s| s.id == 6)
        .map(|s| s.completed)
        .unwrap_or(false);
    if !granted {
        return not_found("Patent has not been granted yet");
    }

    json_response(
        StatusCode::OK,
        &ExpiryResponse {
            filing_id: filing.id.clone(),
            start_date: filing.start_date,
            expiry_date: expiry_date(filing.start_date),
        },
    )
}

// =============================================================================
// Catalog and calculator handlers
// =============================================================================

/// GET /api/ipr/steps?type=X
fn handle_step_catalog(query: &str) -> Response<BoxBody> {
    let params = parse_query_params(query);
    let label = params.get("type").map(String::as_str).unwrap_or("Patent");

    match IprType::parse(label) {
        Some(ipr_type) => json_response(
            StatusCode::OK,
            &StepsResponse {
                ipr_type: ipr_type.as_str(),
                steps: catalog(ipr_type),
            },
        ),
        None => validation_error(format!("Unknown IPR type: {}", label)),
    }
}

/// GET /api/ipr/types
fn handle_types() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &TypesResponse {
            types: IprType::ALL.map(|t| t.as_str()),
        },
    )
}

/// POST /api/ipr/fees
async fn handle_fees(req: Request<hyper::body::Incoming>) -> Response<BoxBody> {
    let body: FeeRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    match total_fee(&body.base_fee, &body.counts) {
        Ok(total) => json_response(
            StatusCode::OK,
            &FeeResponse {
                extra_fee: excess_fee(&body.counts),
                total_fee: total,
            },
        ),
        Err(e) => validation_error(e.to_string()),
    }
}

/// POST /api/ipr/draft/validate
async fn handle_draft_validate(req: Request<hyper::body::Incoming>) -> Response<BoxBody> {
    let body: DraftValidateRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    let errors = match body.section {
        Some(section) => {
            if section_title(section).is_none() {
                return validation_error(format!("Section {} does not exist", section));
            }
            validate_section(&body.draft, section).err().unwrap_or_default()
        }
        None => {
            let mut all = Vec::new();
            for section in 1..=16 {
                if let Err(mut errs) = validate_section(&body.draft, section) {
                    all.append(&mut errs);
                }
            }
            all
        }
    };

    json_response(
        StatusCode::OK,
        &DraftValidateResponse {
            valid: errors.is_empty(),
            errors,
            complete: is_complete(&body.draft),
        },
    )
}

/// Handle /api/ipr/* requests.
///
/// Returns Some(response) if the request was handled, None if not an
/// IPR route.
pub async fn handle_ipr_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method().clone();

    if !path.starts_with("/api/ipr/") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let query = req.uri().query().unwrap_or("").to_string();
    let route = match IprRoute::parse(path) {
        Some(r) => r,
        None => return Some(not_found("IPR endpoint not found")),
    };

    let response = match (method, route) {
        (Method::GET, IprRoute::Filings) => handle_list_filings(req, state).await,
        (Method::POST, IprRoute::Filings) => handle_create_filing(req, state).await,
        (Method::GET, IprRoute::Filing(id)) => handle_get_filing(req, state, &id).await,
        (Method::PUT, IprRoute::FilingStep(id, step)) => {
            handle_step_update(req, state, id, step).await
        }
        (Method::PUT, IprRoute::FilingStatus(id)) => handle_status_update(req, state, id).await,
        (Method::DELETE, IprRoute::Filing(id)) => handle_delete_filing(req, state, id).await,
        (Method::GET, IprRoute::FilingExpiry(id)) => handle_filing_expiry(req, state, &id).await,
        (Method::GET, IprRoute::Steps) => handle_step_catalog(&query),
        (Method::GET, IprRoute::Types) => handle_types(),
        (Method::POST, IprRoute::Fees) => handle_fees(req).await,
        (Method::POST, IprRoute::DraftValidate) => handle_draft_validate(req).await,
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
        assert_eq!(IprRoute::parse("/api/ipr/filings"), Some(IprRoute::Filings));
        assert_eq!(
            IprRoute::parse("/api/ipr/filings/f-1"),
            Some(IprRoute::Filing("f-1".to_string()))
        );
        assert_eq!(
            IprRoute::parse("/api/ipr/filings/f-1/steps/3"),
            Some(IprRoute::FilingStep("f-1".to_string(), 3))
        );
        assert_eq!(
            IprRoute::parse("/api/ipr/filings/f-1/status"),
            Some(IprRoute::FilingStatus("f-1".to_string()))
        );
        assert_eq!(
            IprRoute::parse("/api/ipr/filings/f-1/expiry"),
            Some(IprRoute::FilingExpiry("f-1".to_string()))
        );
        assert_eq!(IprRoute::parse("/api/ipr/steps"), Some(IprRoute::Steps));
        assert_eq!(IprRoute::parse("/api/ipr/types"), Some(IprRoute::Types));
        assert_eq!(IprRoute::parse("/api/ipr/fees"), Some(IprRoute::Fees));
        assert_eq!(
            IprRoute::parse("/api/ipr/draft/validate"),
            Some(IprRoute::DraftValidate)
        );

        assert_eq!(IprRoute::parse("/api/ipr/filings/f-1/steps/three"), None);
        assert_eq!(IprRoute::parse("/api/ipr/unknown"), None);
    }

    #[test]
    fn test_fee_request_accepts_form_field_names() {
        let body: FeeRequest = serde_json::from_str(
            r#"{"baseFee": "1600", "specPages": "35", "claims": "12", "abstract": "8", "drawings": "15"}"#,
        )
        .unwrap();
        assert_eq!(excess_fee(&body.counts), 120);
        assert_eq!(total_fee(&body.base_fee, &body.counts).unwrap(), 1720);
    }

    #[test]
    fn test_draft_validate_shapes() {
        let req: DraftValidateRequest =
            serde_json::from_str(r#"{"section": 1, "draft": {}}"#).unwrap();
        assert_eq!(req.section, Some(1));

        let errors = validate_section(&req.draft, 1).err().unwrap_or_default();
        assert_eq!(errors, vec!["Reference type is required".to_string()]);
        assert!(!is_complete(&req.draft));
    }
}
