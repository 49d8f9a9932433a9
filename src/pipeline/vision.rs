//! Vision enrichment: one model call that turns an injury photo into
//! retrieval keywords.

use crate::gemini::{GenerateContent, Part};

use super::types::ImageAttachment;

/// Instruction for the enrichment call. Keywords only, no prose.
const VISION_PROMPT: &str = "Analyze this medical situation. \
Identify the injury type and any visible tools or items. \
Return 3-5 keywords only.";

/// Ask the model for a short keyword description of the image.
///
/// Failure is never fatal here: the caller proceeds with the unenriched
/// query, so every error collapses to `None`. Uses whichever credential
/// the current orchestrator attempt is using; no rotation of its own.
pub fn extract_keywords<G: GenerateContent + ?Sized>(
    client: &G,
    api_key: &str,
    model: &str,
    image: &ImageAttachment,
) -> Option<String> {
    let parts = [
        Part::text(VISION_PROMPT),
        Part::InlineImage {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        },
    ];

    match client.generate(api_key, model, &parts) {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Vision enrichment failed; continuing without it");
            None
        }
    }
}

/// Append enrichment keywords to the query the way the UI renders them.
pub fn enrich_query(query: &str, keywords: &str) -> String {
    format!("{query} (Visuals: {keywords})")
}
