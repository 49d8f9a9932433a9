use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::GeminiError;

/// One part of a multimodal request: text or an attached image.
///
/// The composed prompt puts the image last so vision attention binds to
/// the preceding textual context.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Part::InlineImage { .. })
    }
}

/// A model descriptor from the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

/// Model capability boundary: generate text from ordered parts with a
/// caller-supplied credential, plus the model listing used by the
/// offline diagnostic.
pub trait GenerateContent {
    fn generate(&self, api_key: &str, model: &str, parts: &[Part]) -> Result<String, GeminiError>;

    fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, GeminiError>;
}

/// HTTP client for the hosted Gemini REST API.
pub struct GeminiClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// The hosted endpoint with a 2-minute timeout.
    pub fn default_hosted() -> Self {
        Self::new("https://generativelanguage.googleapis.com", 120)
    }

    fn map_send_error(&self, e: reqwest::Error) -> GeminiError {
        if e.is_connect() {
            GeminiError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            GeminiError::Timeout(self.timeout_secs)
        } else {
            GeminiError::Http(e.to_string())
        }
    }
}

// ── Wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireInlineData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    /// Base64-encoded image bytes.
    data: String,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart {
                text: Some(text.clone()),
                inline_data: None,
            },
            Part::InlineImage { mime_type, data } => WirePart {
                text: None,
                inline_data: Some(WireInlineData {
                    mime_type: mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(data),
                }),
            },
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

impl GenerateContent for GeminiClient {
    fn generate(&self, api_key: &str, model: &str, parts: &[Part]) -> Result<String, GeminiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: parts.iter().map(WirePart::from).collect(),
            }],
        };

        // Credential travels in a header, keeping it out of URLs and logs.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| GeminiError::ResponseParsing(e.to_string()))?;

        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::NoCandidates);
        }
        Ok(text)
    }

    fn list_models(&self, api_key: &str) -> Result<Vec<ModelInfo>, GeminiError> {
        let url = format!("{}/v1beta/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ListModelsResponse = response
            .json()
            .map_err(|e| GeminiError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models)
    }
}

// ── Test double ─────────────────────────────────────────────

/// Record of one `generate` call made against the mock.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub api_key: String,
    pub model: String,
    pub part_count: usize,
    pub has_image: bool,
    /// All text parts concatenated, for prompt assertions.
    pub text: String,
}

/// Mock model client with an optional scripted outcome sequence.
///
/// With an empty script every call returns the canned response; with a
/// script, outcomes are consumed in call order (vision call first when
/// an image is attached, then the generation call).
pub struct MockModelClient {
    response: String,
    script: std::sync::Mutex<std::collections::VecDeque<Result<String, String>>>,
    calls: std::sync::Mutex<Vec<MockCall>>,
}

impl MockModelClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            script: std::sync::Mutex::new(std::collections::VecDeque::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(self, outcomes: Vec<Result<&str, &str>>) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            script.extend(
                outcomes
                    .into_iter()
                    .map(|o| o.map(String::from).map_err(String::from)),
            );
        }
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenerateContent for MockModelClient {
    fn generate(&self, api_key: &str, model: &str, parts: &[Part]) -> Result<String, GeminiError> {
        let text = parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineImage { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        self.calls.lock().unwrap().push(MockCall {
            api_key: api_key.to_string(),
            model: model.to_string(),
            part_count: parts.len(),
            has_image: parts.iter().any(Part::is_image),
            text,
        });

        match self.script.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GeminiError::Http(message)),
            None => Ok(self.response.clone()),
        }
    }

    fn list_models(&self, _api_key: &str) -> Result<Vec<ModelInfo>, GeminiError> {
        Ok(vec![ModelInfo {
            name: "models/gemini-flash-latest".to_string(),
            supported_generation_methods: vec!["generateContent".to_string()],
        }])
    }
}
