//! JSON-over-HTTP surface for the note repository.
//!
//! | Method | Path          | Success             |
//! |--------|---------------|---------------------|
//! | GET    | `/notes`      | array of notes      |
//! | POST   | `/notes`      | `{"success":true}`  |
//! | PUT    | `/notes/{id}` | `{"success":true}`  |
//! | DELETE | `/notes/{id}` | `{"success":true}`  |
//!
//! Failures answer `{"error": "..."}`.
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::{
    Config, FileSystemNoteRepository, Note, NotePayload, NoteRepository, NotesError, Result,
};

/// Body of every successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub success: bool,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    repository: Arc<dyn NoteRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }
}

/// A failed request: status plus the message sent back in `{error}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(action: &str, err: NotesError) -> Self {
        let status = match err {
            NotesError::InvalidNote { .. } => StatusCode::BAD_REQUEST,
            NotesError::StaticNote { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Failed to {}: {}", action, err);
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            format!("Failed to {}", action)
        } else {
            err.to_string()
        };
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Request body, or the extractor's complaint about it.
type PayloadBody = std::result::Result<Json<NotePayload>, JsonRejection>;

/// Path id, or the extractor's complaint about it.
type IdParam = std::result::Result<Path<i64>, PathRejection>;

/// Unwraps the body so a malformed one still answers `{error}` with 400.
fn read_payload(action: &str, body: PayloadBody) -> std::result::Result<NotePayload, ApiError> {
    body.map(|Json(payload)| payload)
        .map_err(|e| ApiError::new(action, NotesError::invalid_note(e.body_text())))
}

fn note_id(action: &str, id: IdParam) -> std::result::Result<i64, ApiError> {
    id.map(|Path(id)| id).map_err(|e| {
        ApiError::new(
            action,
            NotesError::invalid_note(format!("bad note id: {}", e.body_text())),
        )
    })
}

/// Builds the notes router over `repository`.
pub fn router(repository: Arc<dyn NoteRepository>) -> Router {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/{id}", put(update_note).delete(delete_note))
        .with_state(AppState::new(repository))
}

/// Runs a repository call on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn NoteRepository) -> Result<T> + Send + 'static,
{
    let repository = Arc::clone(&state.repository);
    tokio::task::spawn_blocking(move || op(repository.as_ref())).await?
}

async fn list_notes(State(state): State<AppState>) -> ApiResult<Vec<Note>> {
    blocking(&state, |repo| repo.list_notes())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("fetch notes", e))
}

async fn create_note(State(state): State<AppState>, body: PayloadBody) -> ApiResult<SuccessBody> {
    let payload = read_payload("create note", body)?;
    let note = payload
        .id
        .ok_or_else(|| NotesError::invalid_note("id is required"))
        .and_then(|id| payload.into_note(id))
        .map_err(|e| ApiError::new("create note", e))?;

    info!("POST /notes id={}", note.id);
    blocking(&state, move |repo| repo.create_note(&note))
        .await
        .map_err(|e| ApiError::new("create note", e))?;
    Ok(Json(SuccessBody { success: true }))
}

async fn update_note(
    State(state): State<AppState>,
    id: IdParam,
    body: PayloadBody,
) -> ApiResult<SuccessBody> {
    let id = note_id("update note", id)?;
    let note = read_payload("update note", body)?
        .into_note(id)
        .map_err(|e| ApiError::new("update note", e))?;

    info!("PUT /notes/{}", id);
    blocking(&state, move |repo| repo.update_note(id, &note))
        .await
        .map_err(|e| ApiError::new("update note", e))?;
    Ok(Json(SuccessBody { success: true }))
}

async fn delete_note(State(state): State<AppState>, id: IdParam) -> ApiResult<SuccessBody> {
    let id = note_id("delete note", id)?;
    info!("DELETE /notes/{}", id);
    blocking(&state, move |repo| repo.delete_note(id))
        .await
        .map_err(|e| ApiError::new("delete note", e))?;
    Ok(Json(SuccessBody { success: true }))
}

/// Serves the notes API on `config.bind_address` until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let repository = FileSystemNoteRepository::from_config(config);
    repository.ensure_directory()?;

    let listener = TcpListener::bind(config.bind_address).await?;
    info!(
        "Serving notes from {} on http://{}",
        repository.notes_dir().display(),
        listener.local_addr()?
    );

    axum::serve(listener, router(Arc::new(repository)))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
