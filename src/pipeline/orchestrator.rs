//! Full chat pipeline: vision enrichment → retrieval → prompt
//! composition → generation, retried across credentials.
//!
//! Every external call may fail independently: vision failure degrades
//! to the unenriched query, a generation failure rotates to the next
//! credential, and only exhausting every credential surfaces an error.

use crate::credentials::CredentialPool;
use crate::gemini::GenerateContent;
use crate::store::inventory::InventoryStore;
use crate::store::knowledge::KnowledgeBase;

use super::annotations;
use super::prompt;
use super::retrieval::retrieve;
use super::types::{parse_history, ChatOutcome, ChatRequest};
use super::vision;
use super::PipelineError;

pub struct FirstAidPipeline<'a, G: GenerateContent + ?Sized> {
    client: &'a G,
    credentials: &'a CredentialPool,
    knowledge: &'a KnowledgeBase,
    inventory: &'a InventoryStore,
    model: &'a str,
}

impl<'a, G: GenerateContent + ?Sized> FirstAidPipeline<'a, G> {
    pub fn new(
        client: &'a G,
        credentials: &'a CredentialPool,
        knowledge: &'a KnowledgeBase,
        inventory: &'a InventoryStore,
        model: &'a str,
    ) -> Self {
        Self {
            client,
            credentials,
            knowledge,
            inventory,
            model,
        }
    }

    /// Execute the pipeline for one request.
    ///
    /// Attempt order is the manual key (when present) followed by up to
    /// three rotations from the pool. The first successful generation
    /// wins; an empty attempt list fails before any network call.
    pub fn generate(&self, request: &ChatRequest) -> Result<ChatOutcome, PipelineError> {
        if request.message.trim().is_empty() && request.image.is_none() {
            return Err(PipelineError::EmptyRequest);
        }

        let history = parse_history(&request.history_json);

        let attempt_keys = self
            .credentials
            .attempt_keys(request.manual_api_key.as_deref());
        if attempt_keys.is_empty() {
            return Err(PipelineError::NoCredentials);
        }

        // Query-only retrieval, reused by any attempt without enrichment.
        let base_matches = retrieve(&request.message, &self.knowledge.protocols);
        let inventory = self.inventory.snapshot();

        let attempts = attempt_keys.len();
        let mut errors = Vec::new();

        for (index, api_key) in attempt_keys.iter().enumerate() {
            // Each attempt owns its enriched-query copy; enrichment never
            // leaks into the next attempt.
            let enrichment = request
                .image
                .as_ref()
                .and_then(|image| vision::extract_keywords(self.client, api_key, self.model, image));

            let (query, matches) = match enrichment {
                Some(keywords) => {
                    let enriched = vision::enrich_query(&request.message, &keywords);
                    let matches = retrieve(&enriched, &self.knowledge.protocols);
                    (enriched, matches)
                }
                None => (request.message.clone(), base_matches.clone()),
            };

            let parts = prompt::compose(
                &query,
                &history,
                &inventory,
                &matches,
                &request.metadata,
                &request.language,
                request.image.as_ref(),
            );

            match self.client.generate(api_key, self.model, &parts) {
                Ok(raw) => {
                    tracing::info!(
                        attempt = index + 1,
                        matches = matches.len(),
                        "Chat response generated"
                    );
                    return Ok(ChatOutcome {
                        response: annotations::strip_markers(&raw),
                        context_used: !matches.is_empty(),
                        annotations: annotations::parse(&raw),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = index + 1,
                        error = %e,
                        "Generation attempt failed; rotating credential"
                    );
                    errors.push(e.to_string());
                }
            }
        }

        Err(PipelineError::Exhausted { attempts, errors })
    }
}
