//! Client-side note store.
//!
//! The store owns the in-session list of notes. Every mutation is applied to
//! the list first and persisted afterwards in a background task; a failed
//! persistence call is logged and recorded, never rolled back.
//!
//! Persistence tasks are chained per note id: each task waits for the previous
//! task of the same id before it talks to the transport. Edits are debounced
//! per id, so a burst of keystrokes turns into one write carrying the last
//! version. Deleting a note cancels its pending save, and dropping the store
//! cancels every pending save.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::{debug, error, info, warn};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{Config, Note, NoteIdGenerator, NoteTransport};

/// Default quiet period before an edit is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Which persistence call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Load,
    Create,
    Update,
    Delete,
}

/// A persistence call that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Affected note, `None` for a failed load
    pub id: Option<i64>,
    pub operation: SyncOperation,
    pub message: String,
}

enum SyncOp {
    Create(Note),
    Update(Note),
    Delete(i64),
}

impl SyncOp {
    fn id(&self) -> i64 {
        match self {
            SyncOp::Create(note) | SyncOp::Update(note) => note.id,
            SyncOp::Delete(id) => *id,
        }
    }

    fn operation(&self) -> SyncOperation {
        match self {
            SyncOp::Create(_) => SyncOperation::Create,
            SyncOp::Update(_) => SyncOperation::Update,
            SyncOp::Delete(_) => SyncOperation::Delete,
        }
    }
}

/// Last scheduled task for one note id.
struct Tail {
    handle: JoinHandle<()>,
    /// Present while a debounced save may still be waiting out its delay.
    /// Dropping it cancels the save.
    cancel: Option<oneshot::Sender<()>>,
}

type FailureLog = Arc<Mutex<Vec<SyncFailure>>>;

/// In-memory note list with optimistic updates and debounced persistence.
///
/// # Panics
///
/// `add_note`, `update_note`, `toggle_pin` and `delete_note` spawn their
/// persistence task with `tokio::spawn` and panic when called outside a
/// Tokio runtime.
pub struct NoteStore {
    notes: Vec<Note>,
    selected: Option<i64>,
    loading: bool,
    transport: Arc<dyn NoteTransport>,
    ids: NoteIdGenerator,
    debounce: Duration,
    tails: HashMap<i64, Tail>,
    failures: FailureLog,
}

impl NoteStore {
    pub fn new(transport: Arc<dyn NoteTransport>) -> Self {
        Self {
            notes: Vec::new(),
            selected: None,
            loading: true,
            transport,
            ids: NoteIdGenerator::new(),
            debounce: DEFAULT_DEBOUNCE,
            tails: HashMap::new(),
            failures: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Store whose save delay comes from `config.debounce_ms`.
    pub fn from_config(transport: Arc<dyn NoteTransport>, config: &Config) -> Self {
        Self::new(transport).with_debounce(config.debounce())
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Replaces the list with the stored collection.
    ///
    /// On failure the list is left empty and the failure is recorded.
    pub async fn load(&mut self) {
        self.loading = true;
        match self.transport.fetch_notes().await {
            Ok(notes) => {
                info!("Loaded {} notes", notes.len());
                self.notes = notes;
            }
            Err(e) => {
                error!("Error fetching notes: {}", e);
                self.notes.clear();
                record_failure(
                    &self.failures,
                    SyncFailure {
                        id: None,
                        operation: SyncOperation::Load,
                        message: e.to_string(),
                    },
                );
            }
        }
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Pinned notes, in list order.
    pub fn pinned_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| n.is_pinned)
    }

    /// Everything that is not pinned, in list order.
    pub fn other_notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| !n.is_pinned)
    }

    pub fn get(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Selects `id` if it is in the list.
    pub fn select_note(&mut self, id: i64) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Creates an empty note, puts it at the top of the list, selects it and
    /// sends it to storage.
    pub fn add_note(&mut self) -> Note {
        let note = Note::untitled(self.ids.next_id());
        debug!("Adding note {}", note.id);

        self.notes.insert(0, note.clone());
        self.selected = Some(note.id);
        self.schedule(SyncOp::Create(note.clone()), None);
        note
    }

    /// Applies an edit and schedules a debounced save.
    ///
    /// Ignored for static notes and for ids that are not in the list.
    pub fn update_note(&mut self, note: Note) {
        if note.is_static {
            debug!("Ignoring edit of static note {}", note.id);
            return;
        }
        let Some(slot) = self.notes.iter_mut().find(|n| n.id == note.id) else {
            debug!("Ignoring edit of unknown note {}", note.id);
            return;
        };
        if slot.is_static {
            debug!("Ignoring edit of static note {}", note.id);
            return;
        }

        *slot = note.clone();
        self.selected = Some(note.id);

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.schedule(SyncOp::Update(note), Some((cancel_tx, cancel_rx)));
    }

    /// Flips the pinned flag through the regular edit path.
    pub fn toggle_pin(&mut self, id: i64) {
        if let Some(mut note) = self.get(id).cloned() {
            note.is_pinned = !note.is_pinned;
            self.update_note(note);
        }
    }

    /// Removes a note and sends the delete, after cancelling any pending save.
    ///
    /// Ignored for static notes.
    pub fn delete_note(&mut self, id: i64) {
        if self.get(id).is_some_and(|n| n.is_static) {
            debug!("Ignoring delete of static note {}", id);
            return;
        }

        self.notes.retain(|n| n.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.schedule(SyncOp::Delete(id), None);
    }

    /// Drains the recorded persistence failures.
    pub fn take_failures(&self) -> Vec<SyncFailure> {
        match self.failures.lock() {
            Ok(mut failures) => std::mem::take(&mut *failures),
            Err(e) => {
                warn!("Failure log lock poisoned: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of note ids with unfinished persistence work.
    pub fn pending_count(&self) -> usize {
        self.tails
            .values()
            .filter(|tail| !tail.handle.is_finished())
            .count()
    }

    /// Waits until every scheduled task, including debounced saves, has run.
    pub async fn flush(&mut self) {
        for (id, tail) in self.tails.drain() {
            if let Err(e) = tail.handle.await {
                error!("Persistence task for note {} failed: {}", id, e);
            }
        }
    }

    /// Cancels pending saves and waits for writes already under way.
    pub async fn shutdown(&mut self) {
        info!("Shutting down note store");
        for tail in self.tails.values_mut() {
            tail.cancel = None;
        }
        self.flush().await;
    }

    fn schedule(
        &mut self,
        op: SyncOp,
        debounce: Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>,
    ) {
        self.tails.retain(|_, tail| !tail.handle.is_finished());

        let id = op.id();
        // Dropping the old tail's sender cancels a save still in its delay.
        let previous = self.tails.remove(&id).map(|tail| tail.handle);
        let (cancel, gate) = match debounce {
            Some((tx, rx)) => (Some(tx), Some((self.debounce, rx))),
            None => (None, None),
        };

        let handle = tokio::spawn(run_sync(
            Arc::clone(&self.transport),
            Arc::clone(&self.failures),
            previous,
            gate,
            op,
        ));
        self.tails.insert(id, Tail { handle, cancel });
    }
}

async fn run_sync(
    transport: Arc<dyn NoteTransport>,
    failures: FailureLog,
    previous: Option<JoinHandle<()>>,
    gate: Option<(Duration, oneshot::Receiver<()>)>,
    op: SyncOp,
) {
    let proceed = match gate {
        Some((delay, cancelled)) => tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancelled => false,
        },
        None => true,
    };

    // Even a cancelled save waits, so whatever is chained behind it stays ordered.
    if let Some(previous) = previous {
        let _ = previous.await;
    }
    if !proceed {
        debug!("Save of note {} superseded", op.id());
        return;
    }

    let id = op.id();
    let operation = op.operation();
    let result = match &op {
        SyncOp::Create(note) => transport.create_note(note).await,
        SyncOp::Update(note) => transport.update_note(note).await,
        SyncOp::Delete(id) => transport.delete_note(*id).await,
    };

    match result {
        Ok(()) => debug!("{:?} of note {} persisted", operation, id),
        Err(e) => {
            error!("{:?} of note {} failed: {}", operation, id, e);
            record_failure(
                &failures,
                SyncFailure {
                    id: Some(id),
                    operation,
                    message: e.to_string(),
                },
            );
        }
    }
}

fn record_failure(failures: &FailureLog, failure: SyncFailure) {
    if let Ok(mut log) = failures.lock() {
        log.push(failure);
    }
}
