//! Database schemas for StartLink
//!
//! Defines MongoDB document structures for users, startups, research
//! papers, feed posts, and mirrored IPR filings.

mod filing;
mod metadata;
mod post;
mod research_paper;
mod startup;
mod user;

pub use filing::{FilingDoc, FILING_COLLECTION};
pub use metadata::Metadata;
pub use post::{PostDoc, POST_COLLECTION};
pub use research_paper::{PaperDoc, PAPER_COLLECTION};
pub use startup::{StartupDoc, STARTUP_COLLECTION};
pub use user::{PublicUser, UserDoc, USER_COLLECTION};
