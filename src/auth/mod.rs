//! Authentication and authorization for StartLink
//!
//! Provides:
//! - JWT access/refresh token generation and validation
//! - Permission levels and owner-or-admin authorization checks
//! - Password hashing with Argon2

pub mod jwt;
pub mod password;
pub mod permissions;

pub use jwt::{
    extract_token_from_header, Claims, JwtValidator, TokenInput, TokenUse, TokenValidationResult,
};
pub use password::{hash_password, verify_password};
pub use permissions::{can_modify_resource, PermissionLevel};
