pub mod client;

pub use client::{GeminiClient, GenerateContent, MockModelClient, ModelInfo, Part};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("Connection to {0} failed")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Empty response: no candidates returned")]
    NoCandidates,
}
