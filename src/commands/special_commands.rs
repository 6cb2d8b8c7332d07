//! Special commands parser for the interactive chat window
//!
//! Special commands are prefixed with `/`. Command names are
//! case-insensitive; arguments (session ids, emoji) are kept as typed.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed in the chat window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new, empty chat session
    NewChat,

    /// Show the chat list
    ListChats,

    /// Switch to a session by list number or id prefix
    Switch(String),

    /// Delete a session by list number or id prefix
    Delete(String),

    /// Append an emoji to the draft of the next message
    Emoji(String),

    /// Display help information
    Help,

    /// Leave the chat window
    Back,

    /// Exit the program
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse user input into a special command
///
/// # Examples
///
/// ```
/// use chatpane::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new").unwrap(), SpecialCommand::NewChat);
/// assert_eq!(
///     parse_special_command("/switch 2").unwrap(),
///     SpecialCommand::Switch("2".to_string())
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim().to_string()),
        None => (lower.clone(), String::new()),
    };

    let require_arg = |command: &str, usage: &str| {
        if arg.is_empty() {
            Err(CommandError::MissingArgument {
                command: command.to_string(),
                usage: usage.to_string(),
            })
        } else {
            Ok(arg.clone())
        }
    };

    match name.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/list" | "/chats" => Ok(SpecialCommand::ListChats),
        "/switch" | "/open" => require_arg("/switch", "/switch <number|id>").map(SpecialCommand::Switch),
        "/delete" | "/rm" => require_arg("/delete", "/delete <number|id>").map(SpecialCommand::Delete),
        "/emoji" => require_arg("/emoji", "/emoji <emoji>").map(SpecialCommand::Emoji),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/back" => Ok(SpecialCommand::Back),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the special command reference
pub fn print_help() {
    println!(
        r#"
Chat Window Commands
====================

SESSIONS:
  /new              - Start a new chat
  /list             - Show the chat list (active chat marked with *)
  /switch <n|id>    - Open chat number n from /list, or by id prefix
  /delete <n|id>    - Delete a chat and its messages

INPUT:
  /emoji <emoji>    - Add an emoji to the next message draft

OTHER:
  /help             - Show this help
  /back             - Leave the chat window
  /exit             - Exit (also: exit, quit, Ctrl-D)

Anything else is sent to the model. Sending a message with no open chat
starts a new one.
"#
    );
}
