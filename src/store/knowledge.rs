use std::path::Path;

use serde::{Deserialize, Serialize};

use super::StoreError;

/// One first-aid procedure from the curated knowledge base.
///
/// Read-only at request time; the document is edited out-of-band and
/// picked up on the next load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub title: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
}

/// The full protocol set, loaded once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub protocols: Vec<Protocol>,
}

impl KnowledgeBase {
    /// Strict load. Callers that want the fail-soft contract use
    /// [`KnowledgeBase::load_or_default`].
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// A missing or malformed document degrades to an empty protocol set
    /// rather than failing the caller.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(kb) => {
                tracing::info!(
                    protocols = kb.protocols.len(),
                    path = %path.display(),
                    "Knowledge base loaded"
                );
                kb
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Knowledge base unavailable; starting with an empty protocol set"
                );
                Self::default()
            }
        }
    }
}
