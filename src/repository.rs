//! Flat-file note repository.
//!
//! One file per note, named `{id}.{ext}`, holding a front matter header and the
//! raw body. Listing rescans the directory every time; there is no index.
//! Writes are last-writer-wins with no locking or version checks.
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{
    load_note_from_file, note_file_name, render_note_file, sort_for_listing, validate_id, Config,
    NotesError, Note, Result,
};

/// Persistence operations keyed by note id.
pub trait NoteRepository: Send + Sync {
    /// Every stored note, pinned first, then by descending id.
    fn list_notes(&self) -> Result<Vec<Note>>;

    /// A single note, `None` when no file exists for `id`.
    fn get_note(&self, id: i64) -> Result<Option<Note>>;

    /// Writes `note` under its own id, replacing any existing file.
    fn create_note(&self, note: &Note) -> Result<()>;

    /// Replaces the file for `id` with `note`. Creates it if absent.
    fn update_note(&self, id: i64, note: &Note) -> Result<()>;

    /// Removes the file for `id`. Absence is not an error.
    fn delete_note(&self, id: i64) -> Result<()>;
}

/// Stores notes as front-matter text files in a single directory.
#[derive(Debug, Clone)]
pub struct FileSystemNoteRepository {
    notes_dir: PathBuf,
    extension: String,
}

impl FileSystemNoteRepository {
    pub fn new(notes_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.notes_dir.clone(), config.note_extension.clone())
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Creates the notes directory if it does not exist yet.
    pub fn ensure_directory(&self) -> Result<()> {
        if !self.notes_dir.exists() {
            debug!(
                "Notes directory does not exist, creating: {}",
                self.notes_dir.display()
            );
            fs::create_dir_all(&self.notes_dir).map_err(|e| {
                error!("Failed to create notes directory: {}", e);
                NotesError::DirectoryError {
                    path: self.notes_dir.clone(),
                }
            })?;
        }
        Ok(())
    }

    fn note_path(&self, id: i64) -> PathBuf {
        self.notes_dir.join(note_file_name(id, &self.extension))
    }

    fn is_note_file(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    /// Refuses to touch a file whose header marks it static.
    ///
    /// A file that no longer parses is not protected; overwriting it is how
    /// a broken note gets repaired.
    fn ensure_writable(&self, id: i64, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        match load_note_from_file(path) {
            Ok(existing) if existing.is_static => {
                warn!("Rejected write to static note {}", id);
                Err(NotesError::StaticNote { id })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Overwriting unreadable note file {}: {}", path.display(), e);
                Ok(())
            }
        }
    }

    fn write_note(&self, id: i64, note: &Note) -> Result<()> {
        validate_id(id)?;
        let path = self.note_path(id);
        self.ensure_writable(id, &path)?;
        self.ensure_directory()?;

        let mut stored = note.clone();
        stored.id = id;
        let rendered = render_note_file(&stored)?;

        // Temp file in the same directory so the final rename stays on one filesystem.
        let mut temp_file = NamedTempFile::new_in(&self.notes_dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotesError::Io(e)
        })?;

        trace!("Writing note {} to temporary file", id);
        temp_file.write_all(rendered.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NotesError::Io(e)
        })?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NotesError::Io(e.error)
        })?;

        debug!("Note {} written to {}", id, path.display());
        Ok(())
    }
}

impl NoteRepository for FileSystemNoteRepository {
    fn list_notes(&self) -> Result<Vec<Note>> {
        if !self.notes_dir.exists() {
            self.ensure_directory()?;
            info!("Created notes directory: {}", self.notes_dir.display());
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        let mut skipped = 0usize;

        for entry in WalkDir::new(&self.notes_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !self.is_note_file(path) {
                continue;
            }
            match load_note_from_file(path) {
                Ok(note) => notes.push(note),
                Err(e) => {
                    warn!("Skipping note file {}: {}", path.display(), e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            error!("Encountered {} unreadable note files while listing", skipped);
        }

        sort_for_listing(&mut notes);
        debug!("Listed {} notes", notes.len());
        Ok(notes)
    }

    fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let path = self.note_path(id);
        if !path.exists() {
            return Ok(None);
        }
        load_note_from_file(&path).map(Some)
    }

    fn create_note(&self, note: &Note) -> Result<()> {
        info!("Creating note: {}", note.id);
        self.write_note(note.id, note)
    }

    fn update_note(&self, id: i64, note: &Note) -> Result<()> {
        info!("Updating note: {}", id);
        self.write_note(id, note)
    }

    fn delete_note(&self, id: i64) -> Result<()> {
        info!("Deleting note: {}", id);
        let path = self.note_path(id);
        self.ensure_writable(id, &path)?;

        match fs::remove_file(&path) {
            Ok(()) => debug!("Note file deleted: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Note {} has no file on disk, nothing to delete", id)
            }
            Err(e) => {
                error!("Failed to delete note file {}: {}", path.display(), e);
                return Err(NotesError::Io(e));
            }
        }
        Ok(())
    }
}
