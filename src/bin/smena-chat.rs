//! Interactive terminal chat for the sMeNa.Tv assistant.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage against the default backend
//! smena-chat
//!
//! # Point at a local backend and start in turbo mode
//! smena-chat --base-url http://localhost:9000/ --mode turbo
//!
//! # Disable colors (useful for piping output)
//! smena-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/login <name>` - Authenticate (anonymous chat works without it)
//! - `/mode <name>` - Switch conversational mode
//! - `/status` - Show backend capability status
//! - `/export [file]` - Export the transcript
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use smena::chat::{ChatArgs, ChatCommand, ChatConfig, help_text, parse_command};
use smena::types::{ChatMode, User};
use smena::{
    Authenticator, Dispatcher, HistoryStore, SendOutcome, Smena, StatusPoller, export,
};

const DEFAULT_EXPORT_FILE: &str = "smena-chat.txt";

struct Printer {
    use_color: bool,
}

impl Printer {
    fn info(&self, message: &str) {
        if self.use_color {
            println!("\x1b[2m{message}\x1b[0m");
        } else {
            println!("{message}");
        }
    }

    fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("\x1b[31m{message}\x1b[0m");
        } else {
            eprintln!("{message}");
        }
    }

    fn reply(&self, message: &smena::Message) {
        let body = if message.is_image() {
            "[image received; use /saveimage <file> to keep it]"
        } else {
            message.text.as_str()
        };
        if self.use_color {
            println!("\x1b[36mАссистент:\x1b[0m {body}");
        } else {
            println!("Ассистент: {body}");
        }
    }
}

/// Main entry point for the smena-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("smena-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let printer = Printer {
        use_color: config.use_color,
    };

    let mut client = Smena::with_options(config.base_url.clone(), Some(config.timeout))?;
    let auth = Authenticator::new(&config.token_file);
    let mut user: Option<User> = auth.restore(&mut client).await;

    let poller = StatusPoller::spawn(client.clone());
    let store = HistoryStore::new(&config.history_file);
    let mut dispatcher = Dispatcher::with_timeout(client, store, config.timeout);
    let mut mode = config.mode.clone();

    let mut rl = DefaultEditor::new()?;

    println!("sMeNa.Tv chat (mode: {mode})");
    match &user {
        Some(user) => println!("Logged in as {} {}", user.username, user.emoji),
        None => println!("Anonymous session. /login <name> to authenticate."),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("Ты: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Пока!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Login(name) => {
                            match auth.login(dispatcher.client_mut(), &name).await {
                                Ok(logged_in) => {
                                    printer.info(&format!(
                                        "Logged in as {} {}",
                                        logged_in.username, logged_in.emoji
                                    ));
                                    user = Some(logged_in);
                                    match dispatcher.merge_remote_history().await {
                                        Ok(added) if added > 0 => printer.info(&format!(
                                            "Merged {added} messages from your saved dialogs."
                                        )),
                                        Ok(_) => {}
                                        Err(err) => printer
                                            .info(&format!("Could not fetch saved dialogs: {err}")),
                                    }
                                }
                                Err(err) => printer.error(&err.to_string()),
                            }
                        }
                        ChatCommand::Logout => {
                            auth.logout(dispatcher.client_mut());
                            user = None;
                            printer.info("Logged out. Session is anonymous again.");
                        }
                        ChatCommand::Status => {
                            let status = poller.latest();
                            printer.info(&format!(
                                "Status: {} (checked {})",
                                status.tier().label(),
                                status.checked_at
                            ));
                            for remote in ChatMode::REMOTE {
                                let mark = if status.supports(&remote) { "+" } else { "-" };
                                printer.info(&format!("  {mark} {remote}"));
                            }
                        }
                        ChatCommand::Mode(name) => match name.parse::<ChatMode>() {
                            Ok(selected) => {
                                let status = poller.latest();
                                if status.supports(&selected) {
                                    printer.info(&format!("Mode switched to {selected}"));
                                    mode = selected;
                                } else {
                                    printer.error(&format!(
                                        "Mode {selected} is not available right now ({})",
                                        status.tier().label()
                                    ));
                                }
                            }
                            Err(err) => printer.error(&err),
                        },
                        ChatCommand::Export(path) => {
                            let path = path.unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
                            match export::export_to_file(&path, dispatcher.messages(), user.as_ref())
                            {
                                Ok(()) => printer.info(&format!("Transcript saved to {path}")),
                                Err(err) => printer.error(&err.to_string()),
                            }
                        }
                        ChatCommand::SaveImage(path) => {
                            let image = dispatcher
                                .messages()
                                .iter()
                                .rev()
                                .find(|m| m.is_image())
                                .map(|m| m.text.clone());
                            match image {
                                Some(payload) => match export::save_image(&path, &payload) {
                                    Ok(()) => printer.info(&format!("Image saved to {path}")),
                                    Err(err) => printer.error(&err.to_string()),
                                },
                                None => printer.error("No image reply in this session yet."),
                            }
                        }
                        ChatCommand::Clear => {
                            dispatcher.clear();
                            printer.info("Conversation cleared.");
                        }
                        ChatCommand::Stats => {
                            let status = poller.latest();
                            println!("    Session statistics:");
                            println!("      Messages: {}", dispatcher.message_count());
                            println!("      Mode: {mode}");
                            println!("      Backend: {}", status.tier().label());
                            match &user {
                                Some(user) => println!(
                                    "      User: {} ({})",
                                    user.username,
                                    if user.role.is_empty() {
                                        "viewer"
                                    } else {
                                        &user.role
                                    }
                                ),
                                None => println!("      User: anonymous"),
                            }
                            println!("      History file: {}", config.history_file.display());
                        }
                        ChatCommand::Invalid(message) => {
                            printer.error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - dispatch it.
                match dispatcher.send(line, mode.clone()).await {
                    SendOutcome::Sent => {
                        if let Some(reply) = dispatcher.last_message() {
                            printer.reply(reply);
                        }
                    }
                    SendOutcome::ExportRequested => {
                        match export::export_to_file(
                            DEFAULT_EXPORT_FILE,
                            dispatcher.messages(),
                            user.as_ref(),
                        ) {
                            Ok(()) => printer
                                .info(&format!("Transcript saved to {DEFAULT_EXPORT_FILE}")),
                            Err(err) => printer.error(&err.to_string()),
                        }
                    }
                    SendOutcome::RejectedBusy => {
                        printer.info("Still waiting for the previous reply.");
                    }
                    SendOutcome::RejectedEmpty => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nПока!");
                break;
            }
            Err(err) => {
                printer.error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    poller.shutdown();
    Ok(())
}
