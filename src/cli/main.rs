use std::path::PathBuf;

use clap::Parser;

use crate::{Commands, Config, Result};

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "Notes backend for the desktop shell: flat-file storage behind a JSON API"
)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Path to the notes directory
    #[clap(long, value_parser)]
    pub notes_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the desknotes application
    #[clap(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration after file, environment and command-line layers.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = &self.notes_dir {
            config.notes_dir = dir.clone();
        }
        if let Commands::Serve { bind: Some(bind) } = &self.command {
            config.bind_address = *bind;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "desknotes",
            "--notes-dir",
            "/tmp/notes",
            "serve",
            "--bind",
            "127.0.0.1:4000",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.notes_dir, PathBuf::from("/tmp/notes"));
        assert_eq!(config.bind_address.port(), 4000);
    }

    #[test]
    fn test_parse_create() {
        let cli =
            Cli::try_parse_from(["desknotes", "create", "-T", "Groceries", "--pin"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Create {
                title: "Groceries".to_string(),
                content: String::new(),
                pin: true,
            }
        );
    }

    #[test]
    fn test_delete_requires_numeric_id() {
        assert!(Cli::try_parse_from(["desknotes", "delete", "abc"]).is_err());
    }
}
