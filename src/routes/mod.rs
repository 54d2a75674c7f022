//! HTTP routes for StartLink

pub mod ai;
pub mod api;
pub mod auth;
pub mod feed;
pub mod health;
pub mod ipr;
pub mod papers;
pub mod startups;
pub mod users;

pub use ai::{handle_ai_request, is_ai_route};
pub use auth::handle_auth_request;
pub use feed::handle_feed_request;
pub use health::{health_check, version_info};
pub use ipr::handle_ipr_request;
pub use papers::handle_paper_request;
pub use startups::handle_startup_request;
pub use users::handle_user_request;
