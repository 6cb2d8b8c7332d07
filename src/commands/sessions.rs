//! Session management command handler

use crate::cli::SessionCommand;
use crate::commands::print_transcript;
use crate::config::Config;
use crate::error::{ChatpaneError, Result};
use crate::session::SessionStore;
use crate::storage::open_store;
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Handle session management commands
pub fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let storage = Arc::new(open_store(&config.storage)?);
    let mut store = SessionStore::load(storage);

    match command {
        SessionCommand::List => {
            if store.sessions().is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "#".bold(),
                "ID".bold(),
                "Chat".bold(),
                "Messages".bold(),
                "Last Message".bold()
            ]);

            for (idx, session) in store.sessions().iter().enumerate() {
                let last = session
                    .messages
                    .last()
                    .map(|m| m.timestamp.clone())
                    .unwrap_or_else(|| "-".to_string());

                table.add_row(prettytable::row![
                    idx + 1,
                    session.short_id().cyan(),
                    session.display_id,
                    session.messages.len(),
                    last
                ]);
            }

            println!("\nChat Sessions:");
            table.printstd();
            println!();
            println!(
                "Use {} to open a session.",
                "chatpane chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id } => {
            let resolved = resolve(&store, &id)?;
            store.load_messages_for(&resolved)?;
            if let Some(session) = store.get(&resolved) {
                println!("{}\n", session.display_id.bold());
            }
            print_transcript(store.messages_for(&resolved));
        }
        SessionCommand::Delete { id } => {
            let resolved = resolve(&store, &id)?;
            store.delete_session(&resolved)?;
            println!("{}", format!("Deleted chat session {}", resolved).green());
        }
    }

    Ok(())
}

fn resolve(store: &SessionStore, id: &str) -> Result<String> {
    store.resolve_id(id).ok_or_else(|| {
        ChatpaneError::Storage(format!("No unique chat session matches '{}'", id)).into()
    })
}
