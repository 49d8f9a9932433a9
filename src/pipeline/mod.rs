pub mod annotations;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod types;
pub mod vision;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Provide a message or an image")]
    EmptyRequest,

    #[error("No API key provided. Enter a Gemini API key or set one in the environment.")]
    NoCredentials,

    #[error("Failed after {attempts} attempts. Errors: {}", .errors.join(", "))]
    Exhausted {
        attempts: usize,
        errors: Vec<String>,
    },
}
