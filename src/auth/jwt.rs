//! JWT token generation and validation
//!
//! HS256 tokens carrying the user identity and permission level. Access
//! tokens are short-lived; refresh tokens carry `token_use = "refresh"`
//! and a longer expiry, and are only accepted by the refresh endpoint.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::permissions::PermissionLevel;
use crate::types::StartlinkError;

/// What a token is good for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier (UUID)
    pub sub: String,
    /// Login email
    pub email: String,
    /// Permission level granted at login
    pub permission_level: PermissionLevel,
    /// Access or refresh
    pub token_use: TokenUse,
    /// Issued-at (seconds since epoch)
    pub iat: u64,
    /// Expiry (seconds since epoch)
    pub exp: u64,
}

/// Input for token generation
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: String,
    pub email: String,
    pub permission_level: PermissionLevel,
}

/// Result of token validation
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

impl TokenValidationResult {
    fn ok(claims: Claims) -> Self {
        Self {
            valid: true,
            claims: Some(claims),
            error: None,
        }
    }

    fn fail(error: String) -> Self {
        Self {
            valid: false,
            claims: None,
            error: Some(error),
        }
    }
}

/// JWT issuer/validator bound to a signing secret
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry_secs: u64,
    refresh_expiry_secs: u64,
}

impl JwtValidator {
    /// Create a validator with the given secret and expiries
    pub fn new(
        secret: String,
        access_expiry_secs: u64,
        refresh_expiry_secs: u64,
    ) -> Result<Self, StartlinkError> {
        if secret.is_empty() {
            return Err(StartlinkError::Config("JWT secret must not be empty".into()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_expiry_secs,
            refresh_expiry_secs,
        })
    }

    /// Generate a short-lived access token
    pub fn generate_token(&self, input: TokenInput) -> Result<String, StartlinkError> {
        self.generate(input, TokenUse::Access, self.access_expiry_secs)
    }

    /// Generate a long-lived refresh token
    pub fn generate_refresh_token(&self, input: TokenInput) -> Result<String, StartlinkError> {
        self.generate(input, TokenUse::Refresh, self.refresh_expiry_secs)
    }

    fn generate(
        &self,
        input: TokenInput,
        token_use: TokenUse,
        expiry_secs: u64,
    ) -> Result<String, StartlinkError> {
        let now = unix_now();
        let claims = Claims {
            sub: input.user_id,
            email: input.email,
            permission_level: input.permission_level,
            token_use,
            iat: now,
            exp: now + expiry_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| StartlinkError::Auth(format!("Failed to generate token: {}", e)))
    }

    /// Verify any token (signature + expiry)
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let validation = Validation::default();

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => TokenValidationResult::ok(data.claims),
            Err(e) => TokenValidationResult::fail(match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => "Token expired".to_string(),
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    "Invalid token signature".to_string()
                }
                _ => format!("Invalid token: {}", e),
            }),
        }
    }

    /// Verify a token and require it to be a refresh token
    pub fn verify_refresh_token(&self, token: &str) -> TokenValidationResult {
        let result = self.verify_token(token);
        match &result.claims {
            Some(claims) if claims.token_use != TokenUse::Refresh => {
                TokenValidationResult::fail("Not a refresh token".to_string())
            }
            _ => result,
        }
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtValidator {
        JwtValidator::new("test-secret".to_string(), 3600, 604800).unwrap()
    }

    fn input() -> TokenInput {
        TokenInput {
            user_id: "user-123".to_string(),
            email: "founder@example.com".to_string(),
            permission_level: PermissionLevel::Authenticated,
        }
    }

    #[test]
    fn test_generate_and_verify_round_trip() {
        let jwt = validator();
        let token = jwt.generate_token(input()).unwrap();

        let result = jwt.verify_token(&token);
        assert!(result.valid);

        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "founder@example.com");
        assert_eq!(claims.token_use, TokenUse::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let jwt = validator();
        let other = JwtValidator::new("other-secret".to_string(), 3600, 604800).unwrap();

        let token = jwt.generate_token(input()).unwrap();
        let result = other.verify_token(&token);
        assert!(!result.valid);
        assert!(result.claims.is_none());
    }

    #[test]
    fn test_refresh_token_required_for_refresh() {
        let jwt = validator();

        let access = jwt.generate_token(input()).unwrap();
        let refresh = jwt.generate_refresh_token(input()).unwrap();

        assert!(!jwt.verify_refresh_token(&access).valid);
        assert!(jwt.verify_refresh_token(&refresh).valid);
        // Refresh tokens still pass plain verification
        assert!(jwt.verify_token(&refresh).valid);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Zero-expiry validator issues already-expired tokens; verification
        // runs with the default 60s leeway disabled via a fresh Validation
        let jwt = JwtValidator::new("test-secret".to_string(), 0, 0).unwrap();
        let token = jwt.generate_token(input()).unwrap();

        let mut validation = Validation::default();
        validation.leeway = 0;
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(None), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtValidator::new(String::new(), 3600, 604800).is_err());
    }
}
