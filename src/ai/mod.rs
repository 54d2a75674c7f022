//! Gemini-backed search, chat and summarization
//!
//! The client is optional at runtime: without an API key the AI routes
//! answer with configuration errors instead.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{GeminiClient, GeminiError, TextGenerator};
pub use parse::{extract_json_array, parse_hits};
