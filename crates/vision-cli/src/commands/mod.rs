//! Slash commands for interactive mode

use std::path::PathBuf;

/// Result of parsing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Queue an image file for the next message
    Attach(PathBuf),
    /// Show the queued attachments
    ListAttachments,
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse a slash command. Returns `None` for plain chat input.
pub fn execute_command(input: &str) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let (command, args) = match rest.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (rest, ""),
    };
    let command = command.to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "attach" | "a" | "image" | "i" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /attach <path-to-image>".to_string())
            } else {
                CommandResult::Attach(expand_home(unquote(args)))
            }
        }

        "attachments" | "ls" => CommandResult::ListAttachments,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

/// Strip one pair of matching surrounding quotes (paths pasted from a file manager)
fn unquote(arg: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = arg
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            return inner;
        }
    }
    arg
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Describe the queued attachments
pub fn attachments_message(names: &[&str]) -> String {
    if names.is_empty() {
        return "No attachments queued.".to_string();
    }
    let mut out = format!("{} attachment(s) queued for the next message:", names.len());
    for (i, name) in names.iter().enumerate() {
        out.push_str(&format!("\n  {}. {}", i + 1, name));
    }
    out
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?          Show this help message
  /attach, /a <path>     Attach an image (png, jpg, jpeg, gif, webp) to the next message
  /attachments, /ls      List queued attachments
  /quit, /exit, /q       Exit vision

Anything else is sent to the backend along with queued attachments.

Examples:
  /attach ~/Pictures/cat.png
  What breed is this cat?"#
        .to_string()
}
