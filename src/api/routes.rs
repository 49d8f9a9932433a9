//! HTTP surface: the chat endpoint, inventory read/replace, and a
//! health probe. The chat front end is served as static files.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::config;
use crate::credentials::CredentialPool;
use crate::gemini::{GeminiClient, GenerateContent};
use crate::pipeline::orchestrator::FirstAidPipeline;
use crate::pipeline::types::{ChatOutcome, ChatRequest, ImageAttachment, PatientMetadata};
use crate::store::inventory::{Inventory, InventoryStore};
use crate::store::knowledge::KnowledgeBase;

use super::error::ApiError;

/// Uploaded images are capped at 10 MiB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared service state: read-mostly stores plus the rotation pool.
pub struct AppState {
    pub client: Arc<dyn GenerateContent + Send + Sync>,
    pub credentials: CredentialPool,
    pub knowledge: KnowledgeBase,
    pub inventory: InventoryStore,
    pub model: String,
}

impl AppState {
    pub fn new(
        client: Arc<dyn GenerateContent + Send + Sync>,
        credentials: CredentialPool,
        knowledge: KnowledgeBase,
        inventory: InventoryStore,
        model: String,
    ) -> Self {
        Self {
            client,
            credentials,
            knowledge,
            inventory,
            model,
        }
    }

    /// Production state: hosted client, env-discovered credentials,
    /// documents from the data directory.
    pub fn from_config() -> Self {
        Self::new(
            Arc::new(GeminiClient::default_hosted()),
            CredentialPool::from_env(),
            KnowledgeBase::load_or_default(&config::knowledge_base_path()),
            InventoryStore::open(config::inventory_path()),
            config::model_name(),
        )
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", axum::routing::post(chat))
        .route("/api/inventory", get(get_inventory).post(replace_inventory))
        .with_state(state)
        .fallback_service(ServeDir::new(config::static_dir()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}

// ── Handlers ────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    protocols: usize,
    credentials: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        protocols: state.knowledge.protocols.len(),
        credentials: state.credentials.len(),
    })
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    context_used: bool,
    spot_id: Option<u32>,
    procedure: Vec<String>,
    search: Vec<String>,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            response: outcome.response,
            context_used: outcome.context_used,
            spot_id: outcome.annotations.spot_id,
            procedure: outcome.annotations.procedure,
            search: outcome.annotations.search,
        }
    }
}

async fn chat(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = read_chat_request(&mut multipart).await?;

    // The pipeline blocks on the model calls; keep it off the async workers.
    let state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let pipeline = FirstAidPipeline::new(
            state.client.as_ref(),
            &state.credentials,
            &state.knowledge,
            &state.inventory,
            &state.model,
        );
        pipeline.generate(&request)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(outcome.into()))
}

async fn get_inventory(State(state): State<Arc<AppState>>) -> Json<Inventory> {
    Json(state.inventory.snapshot())
}

async fn replace_inventory(
    State(state): State<Arc<AppState>>,
    Json(inventory): Json<Inventory>,
) -> Result<Json<Inventory>, ApiError> {
    state.inventory.replace(inventory.clone())?;
    tracing::info!(
        medicines = inventory.medicines.len(),
        equipment = inventory.equipment.len(),
        "Inventory replaced"
    );
    Ok(Json(inventory))
}

async fn read_chat_request(multipart: &mut Multipart) -> Result<ChatRequest, ApiError> {
    let mut request = ChatRequest {
        message: String::new(),
        language: "English".to_string(),
        manual_api_key: None,
        metadata: PatientMetadata::default(),
        image: None,
        history_json: String::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };

        if name == "image" {
            let mime_type = field
                .content_type()
                .unwrap_or("image/jpeg")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            if !data.is_empty() {
                request.image = Some(ImageAttachment {
                    mime_type,
                    data: data.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "message" => request.message = value,
            "language" => {
                if !value.trim().is_empty() {
                    request.language = value;
                }
            }
            "api_key" => request.manual_api_key = non_blank(value),
            "age" => request.metadata.age = non_blank(value),
            "gender" => request.metadata.gender = non_blank(value),
            "location" => request.metadata.location = non_blank(value),
            "duration" => request.metadata.duration = non_blank(value),
            "history" => request.history_json = value,
            _ => {}
        }
    }

    Ok(request)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::gemini::MockModelClient;

    const ANNOTATED_REPLY: &str = "Apply pressure now.\n\
[SPOT_ID: 14]\n[PROCEDURE: Apply pressure]\n[SEARCH: bandage]";

    fn test_state(keys: Vec<&str>, mock: MockModelClient) -> (Arc<AppState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let knowledge = KnowledgeBase {
            protocols: vec![crate::store::knowledge::Protocol {
                title: "Laceration".to_string(),
                grade_level: "6-8".to_string(),
                keywords: vec!["cut".to_string()],
                steps: vec!["Apply pressure".to_string()],
                red_flags: vec![],
            }],
        };
        let state = AppState::new(
            Arc::new(mock),
            CredentialPool::new(keys.into_iter().map(String::from).collect()),
            knowledge,
            InventoryStore::open(tmp.path().join("inventory.json")),
            "gemini-flash-latest".to_string(),
        );
        (Arc::new(state), tmp)
    }

    fn multipart_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let boundary = "guardian-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(response: axum::http::Response<Body>) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 65536)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_response_shape() {
        let (state, _tmp) = test_state(vec!["k1"], MockModelClient::new(""));
        let app = router(state);

        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["protocols"], 1);
        assert_eq!(json["credentials"], 1);
    }

    #[tokio::test]
    async fn chat_success_returns_text_and_annotations() {
        let (state, _tmp) = test_state(vec!["k1"], MockModelClient::new(ANNOTATED_REPLY));
        let app = router(state);

        let req = multipart_request(
            "/api/chat",
            &[("message", "deep cut on arm"), ("history", "[]")],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["response"], "Apply pressure now.");
        assert_eq!(json["context_used"], true);
        assert_eq!(json["spot_id"], 14);
        assert_eq!(json["search"][0], "bandage");
    }

    #[tokio::test]
    async fn chat_without_message_or_image_is_rejected() {
        let (state, _tmp) = test_state(vec!["k1"], MockModelClient::new(ANNOTATED_REPLY));
        let app = router(state);

        let req = multipart_request("/api/chat", &[("message", "  ")]);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn chat_without_any_credential_returns_503() {
        let mock = MockModelClient::new(ANNOTATED_REPLY);
        let (state, _tmp) = test_state(vec![], mock);
        let app = router(state.clone());

        let req = multipart_request("/api/chat", &[("message", "deep cut on arm")]);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "NO_CREDENTIALS");
    }

    #[tokio::test]
    async fn chat_exhaustion_surfaces_aggregate_error() {
        let mock = MockModelClient::new("")
            .with_script(vec![Err("auth failed"), Err("quota exceeded")]);
        let (state, _tmp) = test_state(vec!["k1", "k2"], mock);
        let app = router(state);

        let req = multipart_request("/api/chat", &[("message", "deep cut on arm")]);
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = response_json(response).await;
        let message = json["error"]["message"].as_str().unwrap();
        assert!(message.contains("2 attempts"));
        assert!(message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn chat_accepts_manual_key_when_pool_empty() {
        let mock = MockModelClient::new(ANNOTATED_REPLY);
        let (state, _tmp) = test_state(vec![], mock);
        let app = router(state);

        let req = multipart_request(
            "/api/chat",
            &[("message", "deep cut on arm"), ("api_key", "AIzaManual")],
        );
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn inventory_starts_empty() {
        let (state, _tmp) = test_state(vec!["k1"], MockModelClient::new(""));
        let app = router(state);

        let req = Request::builder()
            .uri("/api/inventory")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = response_json(response).await;
        assert_eq!(json["medicines"].as_array().unwrap().len(), 0);
        assert_eq!(json["equipment"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn inventory_replace_round_trips() {
        let (state, _tmp) = test_state(vec!["k1"], MockModelClient::new(""));

        let post = Request::builder()
            .method("POST")
            .uri("/api/inventory")
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"medicines":["gauze"],"equipment":[]}"#))
            .unwrap();
        let response = router(state.clone()).oneshot(post).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let get = Request::builder()
            .uri("/api/inventory")
            .body(Body::empty())
            .unwrap();
        let response = router(state).oneshot(get).await.unwrap();
        let json = response_json(response).await;
        assert_eq!(json["medicines"][0], "gauze");
    }
}
