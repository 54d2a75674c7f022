//! Research library listing filters

pub mod filter;

pub use filter::{matches, sort_papers, ListingFilter, SortKey, CATEGORIES, YEARS};
