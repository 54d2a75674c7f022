//! Account and session routes
//!
//! - POST /auth/signup  - Create an account and get tokens
//! - POST /auth/login   - Authenticate and get tokens
//! - POST /auth/refresh - Exchange a refresh token for a new access token
//! - GET  /auth/me      - Current user from the access token
//! - POST /auth/logout  - Stateless acknowledge (tokens live client-side)

use bson::doc;
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    extract_token_from_header, hash_password, verify_password, PermissionLevel, TokenInput,
};
use crate::db::schemas::{PublicUser, UserDoc, USER_COLLECTION};
use crate::logging::EventType;
use crate::routes::api::{
    authenticate, cors_preflight, db_unavailable, error_response, get_auth_header, internal_error,
    json_response, not_found, parse_json_body, validation_error, BoxBody, ErrorResponse,
    SuccessResponse, JSON_BODY_LIMIT,
};
use crate::routes::users::{UserResponse, DOMAINS, ROLES};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub organization: String,
    pub domains: Vec<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: u64,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub expires_at: u64,
}

/// Same acceptance rule as the signup form:
/// `^[^\s@]+@[^\s@]+\.[^\s@]+$`
fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) || email.matches('@').count() != 1 {
        return false;
    }
    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    if local.is_empty() {
        return false;
    }
    // the domain needs a dot with at least one character on each side
    let chars: Vec<char> = domain.chars().collect();
    chars.len() >= 3 && chars[1..chars.len() - 1].contains(&'.')
}

/// Field checks in form order; the first failure wins
fn validate_signup(body: &SignupRequest) -> Result<(), String> {
    let full_name = body.full_name.trim();
    if full_name.is_empty() {
        return Err("Full name is required".into());
    }
    if full_name.chars().count() < 2 {
        return Err("Full name must be at least 2 characters".into());
    }

    if body.email.is_empty() {
        return Err("Email is required".into());
    }
    if !valid_email(&body.email) {
        return Err("Please enter a valid email address".into());
    }

    if body.password.is_empty() {
        return Err("Password is required".into());
    }
    if body.password.chars().count() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    if body.role.is_empty() || !ROLES.contains(&body.role.as_str()) {
        return Err("Please select your role".into());
    }

    if body.organization.trim().is_empty() {
        return Err("Organization/Institute name is required".into());
    }

    if body.domains.is_empty() {
        return Err("Please select at least one domain of interest".into());
    }
    for domain in &body.domains {
        if !DOMAINS.contains(&domain.as_str()) {
            return Err(format!("Unknown domain of interest: {}", domain));
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

    if let Some(bio) = body.bio.as_deref() {
        if bio.chars().count() > 200 {
            return Err("Bio must be 200 characters or less".into());
        }
    }

    Ok(())
}

/// Issue the access/refresh pair for a stored user
fn auth_success(state: &AppState, user: &UserDoc, status: StatusCode) -> Response<BoxBody> {
    let input = TokenInput {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        permission_level: PermissionLevel::Authenticated,
    };

    let token = match state.jwt.generate_token(input.clone()) {
        Ok(t) => t,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate token: {}", e),
                "TOKEN_ERROR",
            )
        }
    };
    let refresh_token = match state.jwt.generate_refresh_token(input) {
        Ok(t) => t,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate token: {}", e),
                "TOKEN_ERROR",
            )
        }
    };

    let expires_at = state
        .jwt
        .verify_token(&token)
        .claims
        .map(|c| c.exp)
        .unwrap_or(0);

    json_response(
        status,
        &AuthResponse {
            token,
            refresh_token,
            expires_at,
            user: user.to_public(),
        },
    )
}

/// POST /auth/signup
async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: SignupRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if let Err(message) = validate_signup(&body) {
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

    let email = body.email.trim().to_lowercase();

    match collection.find_one(doc! { "email": &email }).await {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::CONFLICT,
                "An account with this email already exists",
                "USER_EXISTS",
            )
        }
        Ok(None) => {}
        Err(e) => return internal_error(format!("Database error: {}", e)),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return internal_error(format!("Failed to hash password: {}", e)),
    };

    let user = UserDoc::new(
        body.full_name.trim().to_string(),
        email.clone(),
        password_hash,
        body.role.clone(),
        body.organization.trim().to_string(),
        body.domains.clone(),
        body.linkedin.clone().filter(|s| !s.is_empty()),
        body.github.clone().filter(|s| !s.is_empty()),
        body.bio.clone().filter(|s| !s.is_empty()),
    );

    if let Err(e) = collection.insert_one(user.clone()).await {
        // Unique email index closes the lookup/insert race
        let error_str = e.to_string();
        if error_str.contains("duplicate key") || error_str.contains("E11000") {
            return error_response(
                StatusCode::CONFLICT,
                "An account with this email already exists",
                "USER_EXISTS",
            );
        }
        return internal_error(format!("Failed to create user: {}", e));
    }

    info!("Registered new user: {}", email);

    if let Some(usage) = &state.usage {
        usage
            .log_event(EventType::Signup, "/auth/signup", Some(&user.user_id), "created")
            .await;
    }

    auth_success(&state, &user, StatusCode::CREATED)
}

/// POST /auth/login
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req, JSON_BODY_LIMIT).await {
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

    if body.email.is_empty() || body.password.is_empty() {
        return validation_error("Missing required fields: email, password");
    }

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let email = body.email.trim().to_lowercase();

    let user = match collection.find_one(doc! { "email": &email }).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!("Login failed - user not found: {}", email);
            // Generic error to prevent account enumeration
            return error_response(
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "INVALID_CREDENTIALS",
            );
        }
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    let password_valid = match verify_password(&body.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            warn!("Password verification error: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication error",
                "AUTH_ERROR",
            );
        }
    };

    if !password_valid {
        warn!("Login failed - invalid password: {}", email);
        return error_response(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            "INVALID_CREDENTIALS",
        );
    }

    if !user.is_active {
        warn!("Login rejected - account deactivated: {}", email);
        return error_response(
            StatusCode::FORBIDDEN,
            "Account is deactivated",
            "FORBIDDEN",
        );
    }

    info!("Login successful: {}", email);

    if let Some(usage) = &state.usage {
        usage
            .log_event(EventType::Login, "/auth/login", Some(&user.user_id), "success")
            .await;
    }

    auth_success(&state, &user, StatusCode::OK)
}

/// POST /auth/refresh
async fn handle_refresh(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let token = match extract_token_from_header(get_auth_header(&req)) {
        Some(t) => t,
        None => {
            return error_response(StatusCode::UNAUTHORIZED, "No token provided", "UNAUTHORIZED")
        }
    };

    let result = state.jwt.verify_refresh_token(token);
    if !result.valid {
        return error_response(
            StatusCode::UNAUTHORIZED,
            result.error.unwrap_or_else(|| "Invalid token".into()),
            "INVALID_TOKEN",
        );
    }

    let claims = match result.claims {
        Some(c) => c,
        None => return error_response(StatusCode::UNAUTHORIZED, "Invalid token", "INVALID_TOKEN"),
    };

    let new_token = match state.jwt.generate_token(TokenInput {
        user_id: claims.sub,
        email: claims.email,
        permission_level: claims.permission_level,
    }) {
        Ok(t) => t,
        Err(e) => {
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate token: {}", e),
                "TOKEN_ERROR",
            )
        }
    };

    let expires_at = state
        .jwt
        .verify_token(&new_token)
        .claims
        .map(|c| c.exp)
        .unwrap_or(0);

    json_response(
        StatusCode::OK,
        &RefreshResponse {
            token: new_token,
            expires_at,
        },
    )
}

/// GET /auth/me
async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let mongo = match &state.mongo {
        Some(m) => m,
        None => return db_unavailable(),
    };
    let collection = match mongo.collection::<UserDoc>(USER_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return internal_error(format!("Database error: {}", e)),
    };

    match collection.find_one(doc! { "user_id": &claims.sub }).await {
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

/// POST /auth/logout
///
/// Tokens are stateless; logout is client-side removal.
async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    _state: Arc<AppState>,
) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &SuccessResponse {
            success: true,
            message: "Logged out successfully".into(),
        },
    )
}

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if the request was handled, None if not an
/// auth route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method, path.as_str()) {
        (&Method::POST, "/auth/signup") => handle_signup(req, state).await,
        (&Method::POST, "/auth/login") => handle_login(req, state).await,
        (&Method::POST, "/auth/refresh") => handle_refresh(req, state).await,
        (&Method::POST, "/auth/logout") => handle_logout(req, state).await,
        (&Method::GET, "/auth/me") => handle_me(req, state).await,

        (_, "/auth/signup")
        | (_, "/auth/login")
        | (_, "/auth/refresh")
        | (_, "/auth/logout")
        | (_, "/auth/me") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse {
                error: "Method not allowed".into(),
                code: None,
            },
        ),

        _ => not_found("Auth endpoint not found"),
    };

    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupRequest {
        SignupRequest {
            full_name: "Asha Rao".into(),
            email: "asha@quantleap.in".into(),
            password: "long-enough-password".into(),
            role: "founder".into(),
            organization: "Quantleap Labs".into(),
            domains: vec!["Artificial Intelligence".into()],
            linkedin: None,
            github: None,
            bio: None,
        }
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(validate_signup(&valid_signup()).is_ok());
    }

    #[test]
    fn test_full_name_rules() {
        let mut body = valid_signup();
        body.full_name = "".into();
        assert_eq!(validate_signup(&body).unwrap_err(), "Full name is required");

        body.full_name = "A".into();
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Full name must be at least 2 characters"
        );
    }

    #[test]
    fn test_email_rules() {
        let mut body = valid_signup();
        body.email = "".into();
        assert_eq!(validate_signup(&body).unwrap_err(), "Email is required");

        for bad in ["plainaddress", "no body", "a@b", "a@b.", "two@@at.com", "spaced @b.com"] {
            body.email = bad.into();
            assert_eq!(
                validate_signup(&body).unwrap_err(),
                "Please enter a valid email address",
                "{}",
                bad
            );
        }

        body.email = "founder@sub.example.co.in".into();
        assert!(validate_signup(&body).is_ok());
    }

    #[test]
    fn test_password_rules() {
        let mut body = valid_signup();
        body.password = "".into();
        assert_eq!(validate_signup(&body).unwrap_err(), "Password is required");

        body.password = "short".into();
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Password must be at least 8 characters"
        );
    }

    #[test]
    fn test_role_and_org_rules() {
        let mut body = valid_signup();
        body.role = "".into();
        assert_eq!(validate_signup(&body).unwrap_err(), "Please select your role");

        body.role = "wizard".into();
        assert_eq!(validate_signup(&body).unwrap_err(), "Please select your role");

        body.role = "student".into();
        body.organization = "  ".into();
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Organization/Institute name is required"
        );
    }

    #[test]
    fn test_domain_rules() {
        let mut body = valid_signup();
        body.domains = vec![];
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Please select at least one domain of interest"
        );

        body.domains = vec!["Astrology".into()];
        assert!(validate_signup(&body)
            .unwrap_err()
            .starts_with("Unknown domain of interest"));
    }

    #[test]
    fn test_link_rules() {
        let mut body = valid_signup();
        body.linkedin = Some("https://example.com/asha".into());
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Please enter a valid LinkedIn URL"
        );

        body.linkedin = Some("https://www.linkedin.com/in/asha".into());
        assert!(validate_signup(&body).is_ok());

        body.github = Some("github.com/asha".into());
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Please enter a valid URL (starting with http:// or https://)"
        );

        body.github = Some("https://github.com/asha".into());
        assert!(validate_signup(&body).is_ok());
    }

    #[test]
    fn test_bio_length_rule() {
        let mut body = valid_signup();
        body.bio = Some("x".repeat(201));
        assert_eq!(
            validate_signup(&body).unwrap_err(),
            "Bio must be 200 characters or less"
        );

        body.bio = Some("x".repeat(200));
        assert!(validate_signup(&body).is_ok());
    }

    #[test]
    fn test_email_regex_edge_cases() {
        assert!(valid_email("a@b.c"));
        assert!(valid_email("first.last@example.com"));
        assert!(!valid_email("a@bc"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("a@.com"));
        assert!(!valid_email("a@com."));
    }
}
