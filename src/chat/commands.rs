//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the session without dispatching a message.

/// A parsed chat command.
///
/// These commands control the session and never reach the backend's chat
/// endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Log in with a username.
    Login(String),

    /// End the authenticated session.
    Logout,

    /// Show the latest capability snapshot.
    Status,

    /// Switch the conversational mode.
    Mode(String),

    /// Export the transcript, optionally to a specific file.
    Export(Option<String>),

    /// Save the last image reply to a file.
    SaveImage(String),

    /// Clear the conversation history.
    Clear,

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be dispatched as a regular message.
///
/// # Examples
///
/// ```
/// # use smena::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/mode turbo").is_some());
/// assert!(parse_command("Привет!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" => match argument {
            Some(name) => ChatCommand::Login(name.to_string()),
            None => ChatCommand::Invalid("/login requires a username".to_string()),
        },
        "logout" => ChatCommand::Logout,
        "status" => ChatCommand::Status,
        "mode" => match argument {
            Some(mode) => ChatCommand::Mode(mode.to_string()),
            None => ChatCommand::Invalid("/mode requires a mode name".to_string()),
        },
        "export" => ChatCommand::Export(argument.map(|s| s.to_string())),
        "saveimage" => match argument {
            Some(path) => ChatCommand::SaveImage(path.to_string()),
            None => ChatCommand::Invalid("/saveimage requires a file path".to_string()),
        },
        "clear" => ChatCommand::Clear,
        "stats" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /login <name>          Log in (anonymous chat works without it)
  /logout                Log out and forget the stored token
  /status                Show backend capability status
  /mode <name>           Switch mode: fast, turbo, ultra, creative, image, local
  /export [file]         Export the transcript (default: smena-chat.txt)
  /saveimage <file>      Save the last image reply to a file
  /clear                 Clear conversation history
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_login() {
        assert_eq!(
            parse_command("/login lera"),
            Some(ChatCommand::Login("lera".to_string()))
        );
        assert_eq!(
            parse_command("/login"),
            Some(ChatCommand::Invalid("/login requires a username".to_string()))
        );
    }

    #[test]
    fn parse_mode() {
        assert_eq!(
            parse_command("/mode turbo"),
            Some(ChatCommand::Mode("turbo".to_string()))
        );
        assert_eq!(
            parse_command("/MODE   creative  "),
            Some(ChatCommand::Mode("creative".to_string()))
        );
        assert!(matches!(
            parse_command("/mode"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_export_with_and_without_path() {
        assert_eq!(parse_command("/export"), Some(ChatCommand::Export(None)));
        assert_eq!(
            parse_command("/export chat.txt"),
            Some(ChatCommand::Export(Some("chat.txt".to_string())))
        );
    }

    #[test]
    fn parse_saveimage() {
        assert_eq!(
            parse_command("/saveimage out.png"),
            Some(ChatCommand::SaveImage("out.png".to_string()))
        );
        assert!(matches!(
            parse_command("/saveimage"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_session_controls() {
        assert_eq!(parse_command("/logout"), Some(ChatCommand::Logout));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Status));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("frobnicate")
        ));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Привет!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/login"));
        assert!(help.contains("/mode"));
        assert!(help.contains("/export"));
    }
}
