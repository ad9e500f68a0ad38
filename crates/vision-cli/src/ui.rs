//! TUI implementation for vision

use std::path::PathBuf;
use std::time::Instant;

use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use tokio::sync::broadcast::error::TryRecvError;
use vision_chat::{ChatController, ChatEvent};
use vision_tui::{
    Theme,
    input::{Action, event_to_action},
    widgets::{
        AttachmentBar, ChatMessage, InputBox, MessageList, Spinner,
        message_list::calculate_message_height,
    },
};

use crate::commands::{CommandResult, attachments_message, execute_command};

/// Lines scrolled per mouse wheel step
const WHEEL_STEP: usize = 3;

/// What the run loop must do after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Start a send cycle with this text
    Send(String),
    /// Read and queue an image file
    Attach(PathBuf),
    Quit,
}

/// What the status bar shows while a cycle runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Waiting,
    Streaming,
    GeneratingImage,
}

impl Activity {
    fn label(self) -> &'static str {
        match self {
            Activity::Waiting => "Waiting for response...",
            Activity::Streaming => "Receiving...",
            Activity::GeneratingImage => "Generating image...",
        }
    }
}

/// TUI application state
pub struct TuiState {
    messages: Vec<ChatMessage>,
    input: InputBox,
    /// Lines scrolled from the top; `usize::MAX` follows the bottom
    scroll: usize,
    /// Height of the message area at the last render
    viewport_height: usize,
    /// Largest useful scroll offset at the last render
    scroll_clamp: usize,
    /// Set while a send cycle is in flight
    activity: Option<Activity>,
    last_error: Option<String>,
    /// Names of attachments queued for the next message
    attachment_names: Vec<String>,
    api_url: String,
    theme: Theme,
    spinner_start: Instant,
}

impl TuiState {
    pub fn new(api_url: impl Into<String>) -> Self {
        let input = InputBox::new()
            .with_placeholder("Type a message, or /attach <image>...")
            .with_busy_placeholder("Waiting for the reply...");

        Self {
            messages: vec![],
            input,
            scroll: 0,
            viewport_height: 0,
            scroll_clamp: 0,
            activity: None,
            last_error: None,
            attachment_names: vec![],
            api_url: api_url.into(),
            theme: Theme::dark(),
            spinner_start: Instant::now(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_some()
    }

    /// Replace the attachment bar contents
    pub fn set_attachments(&mut self, names: Vec<String>) {
        self.attachment_names = names;
    }

    pub fn handle_chat_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::CycleStart { message } => {
                self.activity = Some(Activity::Waiting);
                self.spinner_start = Instant::now();
                self.last_error = None;
                self.attachment_names.clear();
                self.input.set_enabled(false);
                self.messages
                    .push(ChatMessage::user(message.content.clone(), message.image_count()));
                self.messages.push(ChatMessage::assistant_streaming(""));
                self.scroll_to_bottom();
            }
            ChatEvent::Partial { text } => {
                self.activity = Some(Activity::Streaming);
                self.set_streaming(ChatMessage::assistant_streaming(text));
            }
            ChatEvent::GeneratingImage { text } => {
                self.activity = Some(Activity::GeneratingImage);
                self.set_streaming(ChatMessage::assistant_placeholder(text));
            }
            ChatEvent::MessageEnd { message } => {
                self.drop_streaming();
                self.messages.push(ChatMessage::assistant(message.content));
                self.scroll_to_bottom();
            }
            ChatEvent::Error { message } => {
                self.drop_streaming();
                self.last_error = Some(message);
            }
            ChatEvent::CycleEnd { .. } => self.finish_cycle(),
        }
    }

    /// Leave the in-flight state. Safe to call more than once.
    pub fn finish_cycle(&mut self) {
        self.drop_streaming();
        self.activity = None;
        self.input.set_enabled(true);
    }

    /// Record a failure for the status bar
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    /// Show local output in the message list
    pub fn show_notice(&mut self, content: &str) {
        self.messages.push(ChatMessage::notice(content));
        self.scroll_to_bottom();
    }

    fn set_streaming(&mut self, entry: ChatMessage) {
        match self.messages.last_mut() {
            Some(last) if last.is_streaming => *last = entry,
            _ => self.messages.push(entry),
        }
        self.scroll_to_bottom();
    }

    fn drop_streaming(&mut self) {
        if self.messages.last().is_some_and(|m| m.is_streaming) {
            self.messages.pop();
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Resolved against the content height during render
        self.scroll = usize::MAX;
    }

    fn scroll_up(&mut self, lines: usize) {
        if self.scroll == usize::MAX {
            self.scroll = self.scroll_clamp;
        }
        self.scroll = self.scroll.saturating_sub(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        if self.scroll != usize::MAX {
            self.scroll = self.scroll.saturating_add(lines);
        }
    }

    /// Handle an input action, returning work for the run loop
    pub fn handle_action(&mut self, action: Action) -> Option<UiRequest> {
        let page = self.viewport_height.max(1);
        match action {
            Action::Quit => return Some(UiRequest::Quit),
            Action::PageUp => self.scroll_up(page),
            Action::PageDown => self.scroll_down(page),
            Action::ScrollUp => self.scroll_up(WHEEL_STEP),
            Action::ScrollDown => self.scroll_down(WHEEL_STEP),
            Action::Submit => {
                if self.is_busy() {
                    return None;
                }
                let text = self.input.submit()?;
                return self.handle_input(text);
            }
            other => {
                self.input.handle_action(&other);
            }
        }
        None
    }

    fn handle_input(&mut self, text: String) -> Option<UiRequest> {
        let Some(command) = execute_command(&text) else {
            return Some(UiRequest::Send(text));
        };

        match command {
            CommandResult::Attach(path) => return Some(UiRequest::Attach(path)),
            CommandResult::ListAttachments => {
                let names: Vec<&str> = self.attachment_names.iter().map(String::as_str).collect();
                let message = attachments_message(&names);
                self.show_notice(&message);
            }
            CommandResult::Message(message) => self.show_notice(&message),
            CommandResult::Exit => return Some(UiRequest::Quit),
            CommandResult::Unknown(cmd) => self.show_notice(&format!(
                "Unknown command: /{}\nType /help for available commands.",
                cmd
            )),
        }
        None
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let bar_height = AttachmentBar::height(&self.attachment_names);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(bar_height),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.render_messages(frame, chunks[0]);
        frame.render_widget(AttachmentBar::new(&self.attachment_names, &self.theme), chunks[1]);
        self.input.render(chunks[2], frame.buffer_mut(), &self.theme);
        self.render_status(frame, chunks[3]);
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(" vision ");

        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.viewport_height = inner.height as usize;

        if inner.height == 0 || self.messages.is_empty() {
            let welcome = Paragraph::new(vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled("  vision", self.theme.accent_bold()),
                    Span::styled(" - chat with text and images", self.theme.dim_style()),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    format!("  Backend: {}", self.api_url),
                    self.theme.dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "  /attach <path> queues an image for your next message.",
                    self.theme.dim_style(),
                )),
                Line::from(Span::styled(
                    "  /help lists all commands.",
                    self.theme.dim_style(),
                )),
            ]);
            frame.render_widget(welcome, inner);
            return;
        }

        // Leave a column for the scrollbar
        let text_area = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };
        let content_height =
            calculate_message_height(&self.messages, &self.theme, text_area.width as usize);
        self.scroll_clamp = content_height.saturating_sub(text_area.height as usize);
        self.scroll = self.scroll.min(self.scroll_clamp);

        frame.render_widget(
            MessageList::new(&self.messages, &self.theme).scroll(self.scroll),
            text_area,
        );

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(content_height)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        if let Some(activity) = self.activity {
            let spinner = Spinner::new(activity.label(), &self.theme)
                .with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let left = match &self.last_error {
            Some(error) => Span::styled(format!("Error: {}", error), self.theme.error_style()),
            None => Span::styled(format!("Ready │ {}", self.api_url), self.theme.dim_style()),
        };
        let right = "Enter: send │ /help │ Esc: quit";

        let left_width = left.width();
        let right_width = right.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                left,
                Span::raw(" ".repeat(spacing)),
                Span::styled(right, self.theme.dim_style()),
            ])
        } else {
            Line::from(left)
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Run the TUI application
pub async fn run_tui(controller: &mut ChatController, api_url: &str) -> anyhow::Result<()> {
    use crossterm::{
        event::{DisableMouseCapture, EnableMouseCapture},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use ratatui::{Terminal, backend::CrosstermBackend};
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = TuiState::new(api_url);
    state.set_attachments(owned_names(controller));

    let mut chat_rx = controller.subscribe();
    let mut event_stream = EventStream::new();

    // Tick interval for animations (80ms for smooth spinner)
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(80));

    let mut pending_send: Option<String> = None;

    let result: anyhow::Result<()> = 'outer: loop {
        if let Some(content) = pending_send.take() {
            {
                let mut send_future = std::pin::pin!(controller.send(&content));

                // Poll the cycle alongside terminal input until it completes
                loop {
                    terminal.draw(|frame| state.render(frame))?;

                    tokio::select! {
                        biased;

                        result = &mut send_future => {
                            if let Err(e) = result {
                                state.show_error(e.to_string());
                            }
                            break;
                        }

                        event = chat_rx.recv() => {
                            if let Ok(chat_event) = event {
                                state.handle_chat_event(chat_event);
                            }
                        }

                        event = event_stream.next() => {
                            match event {
                                Some(Ok(event)) => {
                                    if let Some(action) = event_to_action(event) {
                                        // Submit is a no-op while busy
                                        if state.handle_action(action) == Some(UiRequest::Quit) {
                                            break 'outer Ok(());
                                        }
                                    }
                                }
                                Some(Err(e)) => break 'outer Err(anyhow::anyhow!("Event error: {}", e)),
                                None => break 'outer Ok(()),
                            }
                        }

                        _ = tick_interval.tick() => {}
                    }
                }
            }

            loop {
                match chat_rx.try_recv() {
                    Ok(chat_event) => state.handle_chat_event(chat_event),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            state.finish_cycle();
            state.set_attachments(owned_names(controller));
            continue;
        }

        terminal.draw(|frame| state.render(frame))?;

        tokio::select! {
            event = event_stream.next() => {
                match event {
                    Some(Ok(event)) => {
                        let Some(action) = event_to_action(event) else { continue };
                        match state.handle_action(action) {
                            Some(UiRequest::Send(text)) => pending_send = Some(text),
                            Some(UiRequest::Attach(path)) => {
                                match controller.attach_file(&path).await {
                                    Ok(name) => state.show_notice(&format!("Attached {}", name)),
                                    Err(e) => {
                                        tracing::warn!(path = %path.display(), error = %e, "Attach failed");
                                        state.show_error(e.to_string());
                                    }
                                }
                                state.set_attachments(owned_names(controller));
                            }
                            Some(UiRequest::Quit) => break Ok(()),
                            None => {}
                        }
                    }
                    Some(Err(e)) => break Err(anyhow::anyhow!("Event error: {}", e)),
                    None => break Ok(()),
                }
            }

            // Tick for animations
            _ = tick_interval.tick() => {}
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn owned_names(controller: &ChatController) -> Vec<String> {
    controller
        .attachments()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};
    use vision_ai::Message;

    fn typed(state: &mut TuiState, text: &str) {
        for c in text.chars() {
            state.handle_action(Action::Char(c));
        }
    }

    fn screen(state: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|frame| state.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_submit_returns_send_and_clears_input() {
        let mut state = TuiState::new("http://localhost");
        typed(&mut state, "hello");
        assert_eq!(
            state.handle_action(Action::Submit),
            Some(UiRequest::Send("hello".into()))
        );
        assert_eq!(state.input.content(), "");
    }

    #[test]
    fn test_blank_submit_ignored() {
        let mut state = TuiState::new("http://localhost");
        typed(&mut state, "   ");
        assert_eq!(state.handle_action(Action::Submit), None);
    }

    #[test]
    fn test_submit_disabled_while_busy() {
        let mut state = TuiState::new("http://localhost");
        state.handle_chat_event(ChatEvent::CycleStart {
            message: Message::user("first"),
        });
        typed(&mut state, "second");

        assert_eq!(state.handle_action(Action::Submit), None);
        assert_eq!(state.input.content(), "second");
    }

    #[test]
    fn test_attach_command_requests_attach() {
        let mut state = TuiState::new("http://localhost");
        typed(&mut state, "/attach cat.png");
        assert_eq!(
            state.handle_action(Action::Submit),
            Some(UiRequest::Attach(PathBuf::from("cat.png")))
        );
    }

    #[test]
    fn test_successful_cycle() {
        let mut state = TuiState::new("http://localhost");
        state.set_attachments(vec!["cat.png".into()]);

        state.handle_chat_event(ChatEvent::CycleStart {
            message: Message::user_with_images("what?", vec!["AAAA".into()]),
        });
        assert!(state.attachment_names.is_empty());
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].image_count, 1);

        state.handle_chat_event(ChatEvent::Partial { text: "A c".into() });
        state.handle_chat_event(ChatEvent::Partial { text: "A cat".into() });
        assert_eq!(state.messages[1], ChatMessage::assistant_streaming("A cat"));

        state.handle_chat_event(ChatEvent::MessageEnd {
            message: Message::assistant("A cat."),
        });
        state.handle_chat_event(ChatEvent::CycleEnd { committed: true });

        assert!(!state.is_busy());
        assert_eq!(state.messages.last(), Some(&ChatMessage::assistant("A cat.")));
        assert!(state.input.is_enabled());
    }

    #[test]
    fn test_failed_cycle_keeps_user_message_and_shows_error() {
        let mut state = TuiState::new("http://localhost");
        state.handle_chat_event(ChatEvent::CycleStart {
            message: Message::user("hi"),
        });
        state.handle_chat_event(ChatEvent::Partial { text: "par".into() });
        state.handle_chat_event(ChatEvent::Error {
            message: "connection reset".into(),
        });
        state.handle_chat_event(ChatEvent::CycleEnd { committed: false });

        assert_eq!(state.messages, vec![ChatMessage::user("hi", 0)]);
        assert!(screen(&mut state).contains("Error: connection reset"));
    }

    #[test]
    fn test_generating_image_placeholder_rendered() {
        let mut state = TuiState::new("http://localhost");
        state.handle_chat_event(ChatEvent::CycleStart {
            message: Message::user("draw"),
        });
        state.handle_chat_event(ChatEvent::GeneratingImage {
            text: "Generating image...".into(),
        });

        assert!(state.messages[1].is_placeholder);
        assert!(screen(&mut state).contains("Generating image..."));
    }

    #[test]
    fn test_list_attachments_notice() {
        let mut state = TuiState::new("http://localhost");
        state.set_attachments(vec!["a.png".into()]);
        typed(&mut state, "/attachments");
        assert_eq!(state.handle_action(Action::Submit), None);

        let notice = state.messages.last().unwrap();
        assert!(notice.content.contains("1. a.png"));
    }

    #[test]
    fn test_attachment_bar_rendered() {
        let mut state = TuiState::new("http://localhost");
        state.set_attachments(vec!["cat.png".into(), "dog.jpg".into()]);
        assert!(screen(&mut state).contains("cat.png, dog.jpg"));
    }

    #[test]
    fn test_scroll_up_leaves_bottom() {
        let mut state = TuiState::new("http://localhost");
        for i in 0..20 {
            state.show_notice(&format!("line {}", i));
        }
        screen(&mut state);
        let bottom = state.scroll;
        assert!(bottom > 0);

        state.handle_action(Action::ScrollUp);
        assert_eq!(state.scroll, bottom - WHEEL_STEP);

        state.handle_action(Action::PageDown);
        screen(&mut state);
        assert_eq!(state.scroll, bottom);
    }
}
