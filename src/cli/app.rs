//! CLI module for the desknotes application
//!
//! This module handles the command-line interface: serving the HTTP API and
//! a few direct operations on the notes directory.
use std::io::Write;

use log::info;

use crate::{
    display_timestamp, serve, Commands, Config, FileSystemNoteRepository, NoteIdGenerator,
    NoteRepository, Note, NotesError, Result,
};

/// CLI Application handler - processes CLI commands against the note repository
pub struct App {
    /// The note storage backend
    repository: FileSystemNoteRepository,

    /// Application configuration
    config: Config,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Create a new CLI application with the given config
    pub fn new(config: Config, verbose: bool) -> Self {
        Self {
            repository: FileSystemNoteRepository::from_config(&config),
            config,
            verbose,
        }
    }

    /// Run the CLI application with the given command, writing output to `out`
    pub async fn run<W: Write>(&self, command: Commands, out: &mut W) -> Result<()> {
        match command {
            Commands::Serve { .. } => serve(&self.config).await?,
            Commands::List { json } => self.list_notes(json, out)?,
            Commands::Create {
                title,
                content,
                pin,
            } => self.create_note(title, content, pin, out)?,
            Commands::Pin { id, off } => self.set_pinned(id, !off, out)?,
            Commands::Delete { id } => self.delete_note(id, out)?,
        }
        Ok(())
    }

    fn list_notes<W: Write>(&self, json: bool, out: &mut W) -> Result<()> {
        let notes = self.repository.list_notes()?;

        if json {
            serde_json::to_writer_pretty(&mut *out, &notes)?;
            writeln!(out)?;
            return Ok(());
        }

        if notes.is_empty() {
            writeln!(out, "No notes in {}", self.repository.notes_dir().display())?;
            return Ok(());
        }

        for note in &notes {
            let mut flags = String::new();
            if note.is_pinned {
                flags.push_str(" [pinned]");
            }
            if note.is_static {
                flags.push_str(" [static]");
            }
            writeln!(out, "{}  {}{}", note.id, note.title, flags)?;
            if self.verbose {
                writeln!(out, "    {}", note.date)?;
                writeln!(out, "    {}", preview(&note.content, 60))?;
            }
        }
        Ok(())
    }

    fn create_note<W: Write>(
        &self,
        title: String,
        content: String,
        pin: bool,
        out: &mut W,
    ) -> Result<()> {
        let note = Note {
            id: NoteIdGenerator::new().next_id(),
            title,
            content,
            date: display_timestamp(),
            is_static: false,
            is_pinned: pin,
        };
        self.repository.create_note(&note)?;

        info!("Created note {}", note.id);
        writeln!(out, "Created note {}", note.id)?;
        Ok(())
    }

    fn set_pinned<W: Write>(&self, id: i64, pinned: bool, out: &mut W) -> Result<()> {
        let mut note = self
            .repository
            .get_note(id)?
            .ok_or_else(|| NotesError::invalid_note(format!("note {} does not exist", id)))?;
        if note.is_static {
            return Err(NotesError::StaticNote { id });
        }

        note.is_pinned = pinned;
        self.repository.update_note(id, &note)?;
        writeln!(
            out,
            "{} note {}",
            if pinned { "Pinned" } else { "Unpinned" },
            id
        )?;
        Ok(())
    }

    fn delete_note<W: Write>(&self, id: i64, out: &mut W) -> Result<()> {
        self.repository.delete_note(id)?;
        writeln!(out, "Deleted note {}", id)?;
        Ok(())
    }
}

/// First line of `content`, cut to `max_len` characters.
fn preview(content: &str, max_len: usize) -> String {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_app() -> (App, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            notes_dir: temp_dir.path().join("notes"),
            ..Config::default()
        };
        (App::new(config, false), temp_dir)
    }

    async fn run(app: &App, command: Commands) -> String {
        let mut out = Vec::new();
        app.run(command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_create_pin_list_delete() {
        let (app, _temp_dir) = create_test_app();

        let created = run(
            &app,
            Commands::Create {
                title: "Groceries".to_string(),
                content: "milk".to_string(),
                pin: false,
            },
        )
        .await;
        let id: i64 = created.trim().rsplit(' ').next().unwrap().parse().unwrap();

        run(&app, Commands::Pin { id, off: false }).await;
        let listing = run(&app, Commands::List { json: false }).await;
        assert!(listing.contains("Groceries [pinned]"));

        let json = run(&app, Commands::List { json: true }).await;
        let notes: Vec<Note> = serde_json::from_str(&json).unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].is_pinned);

        run(&app, Commands::Delete { id }).await;
        let listing = run(&app, Commands::List { json: false }).await;
        assert!(listing.starts_with("No notes in"));
    }

    #[tokio::test]
    async fn test_pin_missing_note_fails() {
        let (app, _temp_dir) = create_test_app();
        let mut out = Vec::new();
        let result = app.run(Commands::Pin { id: 5, off: false }, &mut out).await;
        assert!(matches!(result, Err(NotesError::InvalidNote { .. })));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short\nsecond line", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd...");
        assert_eq!(preview("", 4), "");
    }
}
