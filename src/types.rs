//! Shared result and command types.
use std::net::SocketAddr;

use clap::Subcommand;

use crate::NotesError;

/// A specialized Result type for desknotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Available subcommands for the desknotes application
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Serve the notes HTTP API
    Serve {
        /// Address to listen on, overrides the configuration
        #[clap(short, long)]
        bind: Option<SocketAddr>,
    },

    /// List stored notes, pinned first
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Create a new note
    Create {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: String,

        /// Content of the note
        #[clap(short, long, default_value = "")]
        content: String,

        /// Pin the note
        #[clap(short, long)]
        pin: bool,
    },

    /// Pin or unpin a note
    Pin {
        /// ID of the note
        id: i64,

        /// Unpin instead of pinning
        #[clap(long)]
        off: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: i64,
    },
}
