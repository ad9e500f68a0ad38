//! Plain-terminal rendering of a send cycle

use std::io::{self, Write};

use tokio::sync::broadcast::{self, error::RecvError};
use vision_chat::ChatEvent;

/// Turns accumulated reply text into incremental terminal output
#[derive(Debug, Default)]
pub struct StreamPrinter {
    /// Reply text already written
    printed: String,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output for a new accumulated text.
    ///
    /// Usually just the new suffix. If the text no longer extends what was
    /// printed, it is written again in full on a fresh line.
    pub fn update(&mut self, text: &str) -> String {
        let out = match text.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{}", text),
        };
        self.printed = text.to_string();
        out
    }

    /// Output for an event, or `None` if the event prints nothing
    pub fn event(&mut self, event: &ChatEvent) -> Option<String> {
        match event {
            ChatEvent::Partial { text } => Some(self.update(text)),
            ChatEvent::GeneratingImage { text } => {
                let lead = if self.printed.is_empty() { "" } else { "\n" };
                Some(format!("{}[{}]\n", lead, text))
            }
            ChatEvent::MessageEnd { message } => {
                let mut out = self.update(&message.content);
                out.push('\n');
                Some(out)
            }
            ChatEvent::CycleEnd { committed: false } if !self.printed.is_empty() => {
                self.printed.clear();
                Some("\n".to_string())
            }
            _ => None,
        }
    }
}

/// Print a cycle's events to stdout until it ends.
///
/// Errors are left to the caller, which gets them from `send`.
pub async fn print_cycle(mut rx: broadcast::Receiver<ChatEvent>) {
    let mut printer = StreamPrinter::new();
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Some(out) = printer.event(&event) {
                    let mut stdout = io::stdout().lock();
                    let _ = stdout.write_all(out.as_bytes());
                    let _ = stdout.flush();
                }
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Printer lagged behind chat events");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
