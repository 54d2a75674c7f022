//! StartLink - API service for the founder/researcher network
//!
//! StartLink connects startup founders and researchers: accounts and
//! profiles, startup and research-paper listings, a social feed, an IPR
//! filing tracker with a step-by-step patent wizard, and AI-backed
//! patent/research search via the Gemini API.
//!
//! ## Services
//!
//! - **Auth**: signup/login with argon2 password hashing and JWT sessions
//! - **Listings**: startups, research papers (with filter/sort), feed posts
//! - **IPR**: filing tracker with gated step progression and fee calculation
//! - **AI**: patent search, research search, IPR chat, summarization

pub mod ai;
pub mod auth;
pub mod config;
pub mod db;
pub mod ipr;
pub mod listings;
pub mod logging;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, StartlinkError};
