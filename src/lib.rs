//! Notes backend for a browser-based desktop shell.
//!
//! The library holds both halves of the notes feature: a flat-file repository
//! served over JSON/HTTP, and the client-side store that edits notes
//! optimistically and persists them with debounced writes.

mod cli;
mod config;
mod errors;
mod frontmatter;
mod helper;
mod note;
mod repository;
mod server;
mod store;
mod transport;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use frontmatter::*;
pub use helper::*;
pub use note::*;
pub use repository::*;
pub use server::*;
pub use store::*;
pub use transport::*;
pub use types::*;
