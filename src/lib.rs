//! Guardian: a conversational first-aid assistant.
//!
//! The crate turns a chat message (optionally with a photo of the
//! injury) into a grounded model prompt: vision keywords enrich the
//! query, keyword scoring pulls the most relevant first-aid protocols
//! from a curated knowledge base, and the reply's trailing markers are
//! parsed into structured annotations for the front end.

pub mod api;
pub mod config;
pub mod credentials;
pub mod gemini;
pub mod pipeline;
pub mod store;
