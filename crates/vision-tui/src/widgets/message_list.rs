//! Message list widget for displaying the conversation

use crate::theme::Theme;
use crate::widgets::markdown::render_markdown;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Who a displayed entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    /// Local output such as command results; never sent to the backend
    Notice,
}

/// A single entry in the message list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Number of images attached to the message
    pub image_count: usize,
    /// Whether this is the in-progress assistant reply
    pub is_streaming: bool,
    /// Content is a status placeholder (e.g. while an image is generated)
    pub is_placeholder: bool,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            image_count: 0,
            is_streaming: false,
            is_placeholder: false,
        }
    }

    pub fn user(content: impl Into<String>, image_count: usize) -> Self {
        Self {
            image_count,
            ..Self::new(MessageRole::User, content)
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// The reply currently streaming in
    pub fn assistant_streaming(content: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::new(MessageRole::Assistant, content)
        }
    }

    /// A placeholder shown instead of reply text
    pub fn assistant_placeholder(content: impl Into<String>) -> Self {
        Self {
            is_placeholder: true,
            ..Self::assistant_streaming(content)
        }
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Notice, content)
    }
}

/// Marker line for attached images
pub fn image_marker(count: usize) -> String {
    if count == 1 {
        "[1 image attached]".to_string()
    } else {
        format!("[{} images attached]", count)
    }
}

/// Render one entry into lines that fit `width`
pub fn render_message(msg: &ChatMessage, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (role_text, role_style, prefix) = match msg.role {
        MessageRole::User => ("You", theme.accent_bold(), "▶ "),
        MessageRole::Assistant => ("Assistant", theme.assistant_bold(), "◀ "),
        MessageRole::Notice => ("vision", theme.dim_style(), "● "),
    };

    let header = if msg.is_streaming {
        format!("{}{} ▌", prefix, role_text)
    } else {
        format!("{}{}", prefix, role_text)
    };
    lines.push(Line::from(Span::styled(header, role_style)));

    let content_width = width.saturating_sub(2).max(1);
    let indent = |line: Line<'static>| {
        let mut spans = vec![Span::raw("  ")];
        spans.extend(line.spans);
        Line::from(spans)
    };

    if msg.image_count > 0 {
        lines.push(indent(Line::from(Span::styled(
            image_marker(msg.image_count),
            theme.image_style(),
        ))));
    }

    match msg.role {
        MessageRole::Assistant if msg.is_placeholder => {
            lines.push(indent(Line::from(Span::styled(
                msg.content.clone(),
                theme.image_style(),
            ))));
        }
        MessageRole::Assistant if msg.is_streaming && msg.content.is_empty() => {
            lines.push(indent(Line::from(Span::styled("…", theme.dim_style()))));
        }
        MessageRole::Assistant => {
            lines.extend(
                render_markdown(&msg.content, theme, content_width)
                    .into_iter()
                    .map(indent),
            );
        }
        MessageRole::User | MessageRole::Notice => {
            let style = if msg.role == MessageRole::Notice {
                theme.dim_style()
            } else {
                theme.base_style()
            };
            for line in msg.content.lines() {
                for wrapped in textwrap::wrap(line, content_width) {
                    lines.push(indent(Line::from(Span::styled(wrapped.into_owned(), style))));
                }
            }
        }
    }

    lines.push(Line::default());
    lines
}

/// Total rendered height of the messages at `width`
pub fn calculate_message_height(messages: &[ChatMessage], theme: &Theme, width: usize) -> usize {
    messages
        .iter()
        .map(|m| render_message(m, theme, width).len())
        .sum()
}

/// Widget for displaying a list of chat messages
pub struct MessageList<'a> {
    messages: &'a [ChatMessage],
    theme: &'a Theme,
    scroll: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(messages: &'a [ChatMessage], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            scroll: 0,
        }
    }

    /// Number of lines skipped from the top
    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for MessageList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let width = area.width as usize;
        let visible: Vec<Line> = self
            .messages
            .iter()
            .flat_map(|m| render_message(m, self.theme, width))
            .skip(self.scroll)
            .take(area.height as usize)
            .collect();

        Paragraph::new(visible).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_user_message_with_images_shows_marker() {
        let theme = Theme::dark();
        let lines = render_message(&ChatMessage::user("what is this?", 2), &theme, 40);
        assert_eq!(
            text(&lines),
            vec!["▶ You", "  [2 images attached]", "  what is this?", ""]
        );
    }

    #[test]
    fn test_single_image_marker() {
        assert_eq!(image_marker(1), "[1 image attached]");
    }

    #[test]
    fn test_streaming_placeholder() {
        let theme = Theme::dark();
        let msg = ChatMessage::assistant_placeholder("Generating image...");
        let lines = render_message(&msg, &theme, 40);
        assert_eq!(
            text(&lines),
            vec!["◀ Assistant ▌", "  Generating image...", ""]
        );
    }

    #[test]
    fn test_height_matches_render() {
        let theme = Theme::dark();
        let messages = vec![
            ChatMessage::user("a fairly long question that wraps", 0),
            ChatMessage::assistant("# Title\n\nSome **bold** reply text."),
        ];
        let rendered: usize = messages
            .iter()
            .map(|m| render_message(m, &theme, 12).len())
            .sum();
        assert_eq!(calculate_message_height(&messages, &theme, 12), rendered);
        assert!(rendered > 6);
    }

    #[test]
    fn test_widget_renders_scrolled_window() {
        let theme = Theme::dark();
        let messages = vec![ChatMessage::user("one", 0), ChatMessage::user("two", 0)];
        let area = Rect::new(0, 0, 20, 2);
        let mut buf = Buffer::empty(area);

        MessageList::new(&messages, &theme)
            .scroll(3)
            .render(area, &mut buf);

        let row: String = (0u16..5)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert_eq!(row, "▶ You");
    }
}
