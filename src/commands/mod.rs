/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`    : Interactive chat window
- `send`    : One non-interactive turn
- `sessions`: List, show and delete stored sessions

The handlers only wire configuration into the library components
(storage, session store, provider, exchange, window) and print results.
*/

use crate::config::Config;
use crate::error::Result;
use crate::exchange::MessageExchange;
use crate::providers::{create_provider, ChatOptions};
use crate::render::{html_to_terminal, HtmlRenderer};
use crate::session::{Message, MessageKind, SessionStore};
use crate::storage::open_store;
use crate::window::{ChatWindow, SessionHost};
use colored::Colorize;
use std::sync::Arc;

// Special commands parser for the chat window
pub mod special_commands;

// Session management commands
pub mod sessions;

/// Build a chat window backed by the configured storage and provider
fn build_window(config: &Config) -> Result<ChatWindow<SessionHost>> {
    let storage = Arc::new(open_store(&config.storage)?);
    let store = SessionStore::load(storage).into_shared();
    let provider = create_provider(&config.provider)?;

    tracing::info!(
        "Using provider {} with model {}",
        provider.name(),
        config.chat.model
    );

    let exchange = MessageExchange::new(
        store.clone(),
        provider,
        Arc::new(HtmlRenderer::new()),
        ChatOptions::new(config.chat.model.clone()),
    );
    Ok(ChatWindow::new(exchange, SessionHost::new(store)))
}

/// Print one message for the terminal
pub fn print_message(message: &Message) {
    match message.kind {
        MessageKind::Prompt => {
            println!("{} {}", "You".cyan().bold(), message.timestamp.dimmed());
            println!("{}\n", message.text);
        }
        MessageKind::Response => {
            println!("{} {}", "AI".green().bold(), message.timestamp.dimmed());
            let text = html_to_terminal(&message.text);
            if message.error {
                println!("{}\n", text.red());
            } else {
                println!("{}\n", text);
            }
        }
    }
}

/// Print a whole message log
pub fn print_transcript(messages: &[Message]) {
    if messages.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for message in messages {
        print_message(message);
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat window.
    //!
    //! Opens the requested (or first) session, prints its transcript and
    //! runs a readline loop. Lines starting with `/` are window commands;
    //! anything else is submitted through the [`ChatWindow`].

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::error::ChatpaneError;
    use crate::exchange::SendOutcome;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start the interactive chat window
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `session` - Optional session id or 8-char prefix to open
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat window");

        let mut window = build_window(&config)?;
        open_initial_session(&mut window, session.as_deref())?;

        print_welcome_banner(&config);
        print_active_chat(&window)?;

        let mut rl = DefaultEditor::new()?;

        loop {
            if window.host().is_closed() {
                break;
            }

            let prompt = format!("{} ", ">".cyan().bold());
            let draft = window.input().to_string();
            if !draft.is_empty() {
                println!("{} {}", "Draft:".dimmed(), draft);
            }

            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    if handle_line(&mut window, trimmed, &draft).await == LineControl::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Whether the chat loop keeps reading input
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum LineControl {
        Continue,
        Exit,
    }

    /// Handle one input line
    ///
    /// Errors from commands and sends are reported and the window stays
    /// open; only `/exit` ends the loop.
    async fn handle_line(
        window: &mut ChatWindow<SessionHost>,
        line: &str,
        draft: &str,
    ) -> LineControl {
        let command = match parse_special_command(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.to_string().yellow());
                return LineControl::Continue;
            }
        };

        let result = match command {
            SpecialCommand::Exit => return LineControl::Exit,
            SpecialCommand::None => {
                // The emoji draft prefixes the typed text.
                window.set_input(format!("{}{}", draft, line));
                submit_and_print(window).await
            }
            command => run_special_command(window, command),
        };

        if let Err(e) = result {
            tracing::error!("Chat command failed: {}", e);
            println!("{}", format!("Error: {}", e).red());
        }
        LineControl::Continue
    }

    fn run_special_command(
        window: &mut ChatWindow<SessionHost>,
        command: SpecialCommand,
    ) -> Result<()> {
        match command {
            SpecialCommand::NewChat => {
                window.new_chat();
                print_active_chat(window)?;
            }
            SpecialCommand::ListChats => print_chat_list(window)?,
            SpecialCommand::Switch(target) => match resolve_target(window, &target)? {
                Some(id) => {
                    window.select_chat(&id)?;
                    print_active_chat(window)?;
                }
                None => println!("{}", format!("No chat matches '{}'", target).yellow()),
            },
            SpecialCommand::Delete(target) => match resolve_target(window, &target)? {
                Some(id) => {
                    window.delete_chat(&id)?;
                    println!("{}", "Chat deleted.".green());
                    print_active_chat(window)?;
                }
                None => println!("{}", format!("No chat matches '{}'", target).yellow()),
            },
            SpecialCommand::Emoji(emoji) => {
                window.toggle_emoji_picker();
                window.append_emoji(&emoji);
                window.focus_input();
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Back => window.go_back(),
            SpecialCommand::Exit | SpecialCommand::None => {}
        }
        Ok(())
    }

    fn open_initial_session(
        window: &mut ChatWindow<SessionHost>,
        session: Option<&str>,
    ) -> Result<()> {
        let target = match session {
            Some(requested) => Some(resolve_target(window, requested)?.ok_or_else(|| {
                ChatpaneError::Storage(format!("No unique chat session matches '{}'", requested))
            })?),
            None => window.sessions()?.first().map(|s| s.id.clone()),
        };

        if let Some(id) = target {
            window.select_chat(&id)?;
        }
        Ok(())
    }

    /// Resolve a 1-based list number or an id prefix
    fn resolve_target(window: &ChatWindow<SessionHost>, target: &str) -> Result<Option<String>> {
        let sessions = window.sessions()?;
        if let Ok(number) = target.parse::<usize>() {
            if number >= 1 && number <= sessions.len() {
                return Ok(Some(sessions[number - 1].id.clone()));
            }
        }
        Ok(crate::session::lock_store(window.store())?.resolve_id(target))
    }

    async fn submit_and_print(window: &mut ChatWindow<SessionHost>) -> Result<()> {
        if window.active_id()?.is_some() {
            println!("{}", "Typing...".dimmed());
        }
        let mut outcome = window.submit().await?;

        if let SendOutcome::SessionRequested { seed } = &outcome {
            if window.active_id()?.is_none() {
                println!("{}", "Could not start a new chat.".red());
                return Ok(());
            }
            print_active_chat(window)?;
            println!("{}", "Typing...".dimmed());
            outcome = window.send(seed).await?;
        }

        match outcome {
            SendOutcome::Answered { session_id } | SendOutcome::Failed { session_id, .. } => {
                let store = crate::session::lock_store(window.store())?;
                if let Some(reply) = store.messages_for(&session_id).last() {
                    print_message(reply);
                }
            }
            SendOutcome::Ignored | SendOutcome::SessionRequested { .. } => {}
        }
        Ok(())
    }

    fn print_chat_list(window: &mut ChatWindow<SessionHost>) -> Result<()> {
        window.show_chat_list();
        let sessions = window.sessions()?;
        let active = window.active_id()?;

        println!("\n{}", "Chat List".bold());
        if sessions.is_empty() {
            println!("{}", "  (no chats yet)".dimmed());
        }
        for (idx, session) in sessions.iter().enumerate() {
            let marker = if active.as_deref() == Some(session.id.as_str()) {
                "*".green().bold()
            } else {
                " ".normal()
            };
            println!(
                "{} {:>2}. {}  {}",
                marker,
                idx + 1,
                session.display_id,
                session.short_id().dimmed()
            );
        }
        println!();
        window.hide_chat_list();
        Ok(())
    }

    fn print_active_chat(window: &ChatWindow<SessionHost>) -> Result<()> {
        let active = window.active_id()?;
        let label = active.as_deref().and_then(|id| {
            window
                .sessions()
                .ok()?
                .into_iter()
                .find(|s| s.id == id)
                .map(|s| s.display_id)
        });

        match label {
            Some(label) => {
                println!("\n{}\n", label.bold());
                print_transcript(&window.messages()?);
            }
            None => println!(
                "\n{}\n",
                "No chat open. Your first message starts a new one.".dimmed()
            ),
        }
        Ok(())
    }

    fn print_welcome_banner(config: &Config) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Chat with AI                             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!(
            "Provider: {}   Model: {}",
            config.provider.provider_type.cyan(),
            config.chat.model.cyan()
        );
        println!("Type '/help' for available commands, 'exit' to quit");
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::test_utils::{FlakyStore, ScriptedProvider};

        fn flaky_window(replies: Vec<&str>) -> (ChatWindow<SessionHost>, Arc<FlakyStore>) {
            let storage = Arc::new(FlakyStore::default());
            let store = SessionStore::load(storage.clone()).into_shared();
            let exchange = MessageExchange::new(
                store.clone(),
                Arc::new(ScriptedProvider::new(replies)),
                Arc::new(HtmlRenderer::new()),
                ChatOptions::new("gpt-4.1-nano"),
            );
            (ChatWindow::new(exchange, SessionHost::new(store)), storage)
        }

        #[tokio::test]
        async fn test_storage_failure_on_delete_keeps_window_open() {
            let (mut window, storage) = flaky_window(vec![]);
            window.new_chat();
            storage.fail_writes(true);

            let control = handle_line(&mut window, "/delete 1", "").await;

            assert_eq!(control, LineControl::Continue);
            assert_eq!(window.sessions().unwrap().len(), 1);
            assert!(!window.host().is_closed());
        }

        #[tokio::test]
        async fn test_storage_failure_on_send_keeps_window_open() {
            let (mut window, storage) = flaky_window(vec!["4"]);
            window.new_chat();
            storage.fail_writes(true);

            let control = handle_line(&mut window, "2+2?", "").await;

            assert_eq!(control, LineControl::Continue);
            assert!(window.messages().unwrap().is_empty());

            storage.fail_writes(false);
            handle_line(&mut window, "2+2?", "").await;
            assert_eq!(window.messages().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_emoji_draft_prefixes_message() {
            let (mut window, _storage) = flaky_window(vec!["hi"]);
            window.new_chat();

            handle_line(&mut window, "/emoji 👋", "").await;
            assert_eq!(window.input(), "👋");

            let draft = window.input().to_string();
            handle_line(&mut window, "hello", &draft).await;
            assert_eq!(window.messages().unwrap()[0].text, "👋hello");
            assert_eq!(window.input(), "");
        }

        #[tokio::test]
        async fn test_exit_and_back() {
            let (mut window, _storage) = flaky_window(vec![]);
            assert_eq!(handle_line(&mut window, "/exit", "").await, LineControl::Exit);
            assert_eq!(handle_line(&mut window, "/back", "").await, LineControl::Continue);
            assert!(window.host().is_closed());
        }
    }
}

// One-shot send handler
pub mod send {
    //! Non-interactive single turn.

    use super::*;
    use crate::error::ChatpaneError;
    use crate::exchange::SendOutcome;
    use crate::session::lock_store;

    /// Send `message` and print the reply
    ///
    /// Appends to `session` when given, otherwise starts a new session.
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be found, storage fails, or the
    /// provider fails (the failure is still recorded in the session log)
    pub async fn run_send(config: Config, message: String, session: Option<String>) -> Result<()> {
        let mut window = build_window(&config)?;

        if let Some(requested) = session {
            let resolved = lock_store(window.store())?
                .resolve_id(&requested)
                .ok_or_else(|| {
                    ChatpaneError::Storage(format!(
                        "No unique chat session matches '{}'",
                        requested
                    ))
                })?;
            window.select_chat(&resolved)?;
        }

        window.set_input(message);
        let mut outcome = window.submit().await?;
        if let SendOutcome::SessionRequested { seed } = &outcome {
            outcome = window.send(seed).await?;
        }

        match outcome {
            SendOutcome::Answered { session_id } => {
                let store = lock_store(window.store())?;
                if let Some(reply) = store.messages_for(&session_id).last() {
                    println!("{}", html_to_terminal(&reply.text));
                }
                tracing::info!("Reply stored in session {}", session_id);
                Ok(())
            }
            SendOutcome::Failed { error, .. } => Err(ChatpaneError::Provider(error).into()),
            SendOutcome::Ignored => {
                Err(ChatpaneError::Config("Message cannot be empty".to_string()).into())
            }
            SendOutcome::SessionRequested { .. } => Err(ChatpaneError::Storage(
                "Could not create a chat session".to_string(),
            )
            .into()),
        }
    }
}
