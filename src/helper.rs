use std::{fs, path::Path};

use chrono::Local;
use log::{error, trace};

use crate::{parse_note_file, NotesError, Note, Result};

/// Current local time in the long form used for note dates, e.g. `1/2/2025, 3:04:05 PM`.
pub fn display_timestamp() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Date label given to freshly created notes, e.g. `Today at 03:04 PM`.
pub fn today_label() -> String {
    format!("Today at {}", Local::now().format("%I:%M %p"))
}

/// File name for a note id with the given extension.
pub fn note_file_name(id: i64, extension: &str) -> String {
    format!("{}.{}", id, extension)
}

/// Extracts the note id from a file name stem.
///
/// The stem is the authority for the id, whatever the header says.
pub fn note_id_from_path(path: &Path) -> Result<i64> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NotesError::InvalidFormat {
            message: format!("{} has no usable file name", path.display()),
        })?;

    // The stem must be spelled exactly as `note_file_name` writes it.
    match stem.parse::<i64>() {
        Ok(id) if stem == id.to_string() => Ok(id),
        _ => Err(NotesError::InvalidFormat {
            message: format!("{} is not named after a numeric note id", path.display()),
        }),
    }
}

/// Helper method to load a single note from file
pub fn load_note_from_file(path: &Path) -> Result<Note> {
    trace!("Loading note from file: {}", path.display());
    let id = note_id_from_path(path)?;
    let raw = fs::read_to_string(path).map_err(|e| {
        error!("Failed to open note file {}: {}", path.display(), e);
        NotesError::Io(e)
    })?;

    parse_note_file(id, &raw)
}
