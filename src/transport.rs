//! How the client note store reaches persistent storage.
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};

use crate::{ErrorBody, NoteRepository, Note, NotePayload, NotesError, Result};

/// Persistence calls issued by [`crate::NoteStore`].
#[async_trait]
pub trait NoteTransport: Send + Sync {
    /// Fetches the full note collection.
    async fn fetch_notes(&self) -> Result<Vec<Note>>;

    /// Persists a newly created note.
    async fn create_note(&self, note: &Note) -> Result<()>;

    /// Replaces the stored copy of `note`.
    async fn update_note(&self, note: &Note) -> Result<()>;

    /// Removes the note with `id`.
    async fn delete_note(&self, id: i64) -> Result<()>;
}

/// Talks to the notes HTTP API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the prefix the `/notes` routes hang off, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn notes_url(&self) -> String {
        format!("{}/notes", self.base_url)
    }

    fn note_url(&self, id: i64) -> String {
        format!("{}/notes/{}", self.base_url, id)
    }

    /// Turns a non-2xx answer into [`NotesError::Remote`] with the server's message.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        Err(NotesError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl NoteTransport for HttpTransport {
    async fn fetch_notes(&self) -> Result<Vec<Note>> {
        let response = self.client.get(self.notes_url()).send().await?;
        let notes = Self::check(response).await?.json::<Vec<Note>>().await?;
        debug!("Fetched {} notes from {}", notes.len(), self.base_url);
        Ok(notes)
    }

    async fn create_note(&self, note: &Note) -> Result<()> {
        let response = self
            .client
            .post(self.notes_url())
            .json(&NotePayload::from(note))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        let response = self
            .client
            .put(self.note_url(note.id))
            .json(&NotePayload::from(note))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        let response = self.client.delete(self.note_url(id)).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Calls a repository in-process, for single-binary setups and tests.
#[derive(Clone)]
pub struct RepositoryTransport {
    repository: Arc<dyn NoteRepository>,
}

impl RepositoryTransport {
    pub fn new(repository: Arc<dyn NoteRepository>) -> Self {
        Self { repository }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn NoteRepository) -> Result<T> + Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        tokio::task::spawn_blocking(move || op(repository.as_ref())).await?
    }
}

#[async_trait]
impl NoteTransport for RepositoryTransport {
    async fn fetch_notes(&self) -> Result<Vec<Note>> {
        self.run(|repo| repo.list_notes()).await
    }

    async fn create_note(&self, note: &Note) -> Result<()> {
        let note = NotePayload::from(note).into_note(note.id)?;
        self.run(move |repo| repo.create_note(&note)).await
    }

    async fn update_note(&self, note: &Note) -> Result<()> {
        let id = note.id;
        let note = NotePayload::from(note).into_note(id)?;
        self.run(move |repo| repo.update_note(id, &note)).await
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        self.run(move |repo| repo.delete_note(id)).await
    }
}
