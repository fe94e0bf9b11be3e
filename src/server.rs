//! HTTP surface
//!
//! Thin axum layer over the orchestration actions. Every study and chat
//! route answers `200 OK` with the `ActionResult` envelope, including for
//! malformed requests, so clients only ever branch on `success`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::ai::types::{GenerationOptions, SummaryLength};
use crate::ai::{ChatMessage, CompletionClient, GroqClient, StudyPackage};
use crate::commands::{self, ActionContext, ActionResult, ChatReply};
use crate::config::{Config, ConfigError};
use crate::documents::Upload;
use crate::error::{ExtractionError, StudyError};
use crate::session::{CurrentPackage, StudySession};

/// Headroom above the upload cap for the other multipart fields
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared state behind every handler
pub struct AppState {
    pub client: Arc<dyn CompletionClient>,
    pub context: ActionContext,
    pub session: StudySession,
    pub credential_configured: bool,
}

impl AppState {
    pub fn new(client: Arc<dyn CompletionClient>, context: ActionContext) -> Self {
        let credential_configured = context.api_key.is_some();
        Self {
            client,
            context,
            session: StudySession::new(),
            credential_configured,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client: Arc<dyn CompletionClient> = Arc::new(GroqClient::new(config));
        Self::new(client, ActionContext::from_config(config))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.context.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/study", get(current_study).delete(clear_study))
        .route("/api/study/document", post(study_document))
        .route("/api/study/topic", post(study_topic))
        .route("/api/chat", post(chat_message))
        .route("/api/chat/document", post(chat_document))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: Config) -> Result<(), ServerError> {
    let addr = config.bind;
    let app = router(Arc::new(AppState::from_config(&config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    tracing::info!("StudyAI listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("StudyAI shutting down");
        })
        .await?;

    Ok(())
}

// ============================================================================
// HTTP Handlers
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    credential_configured: bool,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        credential_configured: state.credential_configured,
    })
}

#[derive(Debug, Deserialize)]
struct TopicRequest {
    course: String,
    topic: String,
    #[serde(default)]
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
}

async fn study_topic(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TopicRequest>, JsonRejection>,
) -> Json<ActionResult<StudyPackage>> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return Json(rejected(&state, "from_topic", rejection.body_text())),
    };

    let ticket = state.session.begin();
    let result = commands::from_topic(
        state.client.as_ref(),
        &state.context,
        &request.course,
        &request.topic,
        request.options,
    )
    .await;
    if let Some(package) = &result.data {
        state.session.commit(ticket, package.clone());
    }
    Json(result)
}

async fn study_document(
    State(state): State<Arc<AppState>>,
    form: Result<Multipart, MultipartRejection>,
) -> Json<ActionResult<StudyPackage>> {
    let (upload, options) = match read_document_form(form, state.context.max_upload_bytes).await {
        Ok(parts) => parts,
        Err(e) => return Json(state.context.finish("from_document", Err(e))),
    };

    let ticket = state.session.begin();
    let result = commands::from_document(state.client.as_ref(), &state.context, upload, options).await;
    if let Some(package) = &result.data {
        state.session.commit(ticket, package.clone());
    }
    Json(result)
}

async fn current_study(State(state): State<Arc<AppState>>) -> Json<ActionResult<Option<CurrentPackage>>> {
    Json(ActionResult::ok(state.session.current()))
}

async fn clear_study(State(state): State<Arc<AppState>>) -> Json<ActionResult<bool>> {
    state.session.clear();
    Json(ActionResult::ok(true))
}

async fn chat_message(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ActionResult<ChatReply>> {
    match body {
        Ok(Json(request)) => Json(commands::chat(state.client.as_ref(), &state.context, &request.messages).await),
        Err(rejection) => Json(rejected(&state, "chat", rejection.body_text())),
    }
}

async fn chat_document(
    State(state): State<Arc<AppState>>,
    form: Result<Multipart, MultipartRejection>,
) -> Json<ActionResult<ChatMessage>> {
    match read_document_form(form, state.context.max_upload_bytes).await {
        Ok((upload, _)) => Json(commands::document_context(&state.context, upload).await),
        Err(e) => Json(state.context.finish("document_context", Err(e))),
    }
}

fn rejected<T>(state: &AppState, action: &str, reason: String) -> ActionResult<T> {
    state
        .context
        .finish(action, Err(StudyError::InvalidInput(reason)))
}

/// Map a multipart read failure; hitting the body limit is an oversized upload
fn form_failure(status: StatusCode, detail: String, max_upload_bytes: usize) -> StudyError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return ExtractionError::TooLarge {
            size: None,
            limit: max_upload_bytes,
        }
        .into();
    }
    StudyError::InvalidInput(format!("Invalid upload form: {}", detail))
}

/// Pull the file and generation options out of a multipart form
async fn read_document_form(
    form: Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> Result<(Upload, GenerationOptions), StudyError> {
    let mut multipart =
        form.map_err(|e| StudyError::InvalidInput(format!("Expected a multipart form: {}", e.body_text())))?;
    let form_error = |e: MultipartError| form_failure(e.status(), e.body_text(), max_upload_bytes);

    let mut upload = None;
    let mut options = GenerationOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(form_error)?;
                let mut file = Upload::new(file_name, bytes.to_vec());
                if let Some(content_type) = content_type {
                    file = file.with_content_type(content_type);
                }
                upload = Some(file);
            }
            "customInstructions" => {
                options.custom_instructions = Some(field.text().await.map_err(form_error)?);
            }
            "summaryLength" => {
                let raw = field.text().await.map_err(form_error)?;
                options.summary_length = raw.parse::<SummaryLength>().map_err(|_| {
                    StudyError::InvalidInput(format!(
                        "Unknown summary length {:?}; expected short, medium, long or detailed",
                        raw
                    ))
                })?;
            }
            "chapterByChapter" => {
                let raw = field.text().await.map_err(form_error)?;
                options.chapter_by_chapter = parse_flag(&raw);
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let upload = upload.ok_or_else(|| StudyError::InvalidInput("No file uploaded".to_string()))?;
    Ok((upload, options))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "on" | "yes")
}
