//! Core data structures for notes.
//!
//! A note is keyed by an integer id which doubles as the stem of its backing
//! file name and as a rough creation timestamp.
use std::{
    cmp::Reverse,
    sync::atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{display_timestamp, today_label, NotesError, Result};

/// Title given to notes created from the client store.
pub const NEW_NOTE_TITLE: &str = "Untitled Note";

/// Title used when a stored note or payload carries none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Upper bound on title length, in characters.
pub const MAX_TITLE_CHARS: usize = 512;

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, also the file name stem
    pub id: i64,
    /// Display title
    pub title: String,
    /// Free-form body
    pub content: String,
    /// Human-readable, pre-formatted date string
    pub date: String,
    /// Read-only notes shipped with the app
    #[serde(default)]
    pub is_static: bool,
    /// Pinned notes are listed ahead of the others
    #[serde(default)]
    pub is_pinned: bool,
}

impl Note {
    /// Creates a fresh, editable note the way the notes window does when the
    /// user hits "new note".
    pub fn untitled(id: i64) -> Self {
        Note {
            id,
            title: NEW_NOTE_TITLE.to_string(),
            content: String::new(),
            date: today_label(),
            is_static: false,
            is_pinned: false,
        }
    }
}

/// Body of a create or update request.
///
/// Every field is optional on the wire; missing ones fall back to defaults
/// when the payload is turned into a [`Note`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Accepted for compatibility, never persisted as `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

impl NotePayload {
    /// Builds the note that gets written for `id`.
    ///
    /// The write path never produces static notes.
    pub fn into_note(self, id: i64) -> Result<Note> {
        validate_id(id)?;
        let title = self.title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(NotesError::invalid_note(format!(
                "title exceeds {} characters",
                MAX_TITLE_CHARS
            )));
        }

        Ok(Note {
            id,
            title,
            content: self.content,
            date: self.date.unwrap_or_else(display_timestamp),
            is_static: false,
            is_pinned: self.is_pinned.unwrap_or(false),
        })
    }
}

impl From<&Note> for NotePayload {
    fn from(note: &Note) -> Self {
        NotePayload {
            id: Some(note.id),
            title: Some(note.title.clone()),
            content: note.content.clone(),
            date: Some(note.date.clone()),
            is_static: Some(note.is_static),
            is_pinned: Some(note.is_pinned),
        }
    }
}

/// Rejects ids that cannot name a note file.
pub fn validate_id(id: i64) -> Result<()> {
    if id <= 0 {
        return Err(NotesError::invalid_note(format!(
            "id must be positive, got {}",
            id
        )));
    }
    Ok(())
}

/// Orders notes for display: pinned first, then most recently created.
pub fn sort_for_listing(notes: &mut [Note]) {
    notes.sort_by_key(|note| (Reverse(note.is_pinned), Reverse(note.id)));
}

/// Hands out millisecond-timestamp ids that never repeat within one generator.
///
/// Two notes created in the same millisecond get consecutive ids instead of
/// colliding. Separate processes can still collide.
#[derive(Debug, Default)]
pub struct NoteIdGenerator {
    last: AtomicI64,
}

impl NoteIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id, at least the current Unix time in milliseconds.
    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: i64, pinned: bool) -> Note {
        Note {
            id,
            title: format!("note {}", id),
            content: String::new(),
            date: "d".to_string(),
            is_static: false,
            is_pinned: pinned,
        }
    }

    #[test]
    fn test_sort_pinned_first_then_descending_id() {
        let mut notes = vec![note(1, false), note(5, true), note(3, false), note(2, true)];
        sort_for_listing(&mut notes);
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 2, 3, 1]);
    }

    #[test]
    fn test_json_field_names_are_camel_case() {
        let value = serde_json::to_value(note(100, true)).unwrap();
        assert_eq!(value["id"], 100);
        assert_eq!(value["isPinned"], true);
        assert_eq!(value["isStatic"], false);
        assert!(value.get("is_pinned").is_none());
    }

    #[test]
    fn test_missing_flags_default_to_false() {
        let parsed: Note =
            serde_json::from_str(r#"{"id":7,"title":"t","content":"c","date":"d"}"#).unwrap();
        assert!(!parsed.is_static);
        assert!(!parsed.is_pinned);
    }

    #[test]
    fn test_payload_defaults() {
        let note = NotePayload::default().into_note(42).unwrap();
        assert_eq!(note.id, 42);
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.content, "");
        assert!(!note.date.is_empty());
        assert!(!note.is_pinned);
    }

    #[test]
    fn test_payload_never_persists_static() {
        let payload = NotePayload {
            is_static: Some(true),
            ..Default::default()
        };
        assert!(!payload.into_note(1).unwrap().is_static);
    }

    #[test]
    fn test_payload_rejects_bad_id_and_long_title() {
        assert!(matches!(
            NotePayload::default().into_note(0),
            Err(NotesError::InvalidNote { .. })
        ));
        let payload = NotePayload {
            title: Some("x".repeat(MAX_TITLE_CHARS + 1)),
            ..Default::default()
        };
        assert!(matches!(
            payload.into_note(1),
            Err(NotesError::InvalidNote { .. })
        ));
    }

    #[test]
    fn test_id_generator_is_strictly_increasing() {
        let ids = NoteIdGenerator::new();
        let mut previous = ids.next_id();
        for _ in 0..1000 {
            let id = ids.next_id();
            assert!(id > previous);
            previous = id;
        }
        assert!(previous >= Utc::now().timestamp_millis() - 60_000);
    }

    #[test]
    fn test_untitled_note_is_editable_and_unpinned() {
        let note = Note::untitled(9);
        assert_eq!(note.title, NEW_NOTE_TITLE);
        assert!(note.date.starts_with("Today at "));
        assert!(!note.is_static);
        assert!(!note.is_pinned);
    }
}
