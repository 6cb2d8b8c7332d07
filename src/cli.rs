//! Command-line interface definition for Chatpane
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the interactive chat window, one-shot sends,
//! and session management.

use clap::{Parser, Subcommand};

/// Chatpane - chat with a hosted AI model from the terminal
///
/// Conversations are kept as sessions and persisted locally between runs.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatpane")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the provider from config (openai, ollama)
    #[arg(short, long, global = true)]
    pub provider: Option<String>,

    /// Override the model identifier from config
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Override the session storage file path
    #[arg(long, global = true)]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatpane
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive chat window
    Chat {
        /// Session to open (full id or 8-char prefix); defaults to the first session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the reply
    Send {
        /// Message text
        message: String,

        /// Session to append to; a new session is created when omitted
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Manage stored chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List stored sessions
    List,

    /// Print the messages of a session
    Show {
        /// Session id (full id or 8-char prefix)
        id: String,
    },

    /// Delete a session and its messages
    Delete {
        /// Session id (full id or 8-char prefix)
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            provider: None,
            model: None,
            storage_path: None,
            command: Commands::Chat { session: None },
        }
    }
}
