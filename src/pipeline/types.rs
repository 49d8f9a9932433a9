use serde::{Deserialize, Serialize};

/// Who said a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior exchange, supplied by the caller per request. The pipeline
/// only reads the trailing window; it does not own or persist history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

/// Ad hoc attributes of the current case. Absent fields render as "N/A".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientMetadata {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
}

/// An image supplied with a chat request.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A single chat request after boundary validation.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
    pub manual_api_key: Option<String>,
    pub metadata: PatientMetadata,
    pub image: Option<ImageAttachment>,
    pub history_json: String,
}

/// Machine-readable suffix parsed from the model reply: a body-location
/// code from the spot map plus procedure and supply lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    pub spot_id: Option<u32>,
    pub procedure: Vec<String>,
    pub search: Vec<String>,
}

/// Successful pipeline outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub context_used: bool,
    pub annotations: Annotations,
}

/// Parse caller-supplied history JSON. Malformed input degrades to an
/// empty history rather than failing the request.
pub fn parse_history(raw: &str) -> Vec<ConversationTurn> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(turns) => turns,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed history JSON; continuing with empty history");
            Vec::new()
        }
    }
}
