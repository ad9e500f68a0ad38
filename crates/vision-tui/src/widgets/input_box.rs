//! Single-line prompt input

use crate::input::Action;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Single-line text input for the prompt
#[derive(Debug)]
pub struct InputBox {
    chars: Vec<char>,
    /// Cursor position as a char index
    cursor: usize,
    placeholder: String,
    busy_placeholder: String,
    /// False while a send cycle is in flight
    enabled: bool,
}

impl Default for InputBox {
    fn default() -> Self {
        Self {
            chars: Vec::new(),
            cursor: 0,
            placeholder: String::new(),
            busy_placeholder: String::new(),
            enabled: true,
        }
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder shown when the input is empty
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Placeholder shown while submission is disabled
    pub fn with_busy_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.busy_placeholder = placeholder.into();
        self
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn set_content(&mut self, content: &str) {
        self.chars = content.chars().collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Whether the input is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.chars.iter().all(|c| c.is_whitespace())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether Enter would submit right now
    pub fn can_submit(&self) -> bool {
        self.enabled && !self.is_blank()
    }

    /// Take the content for submission, leaving the input empty.
    ///
    /// Returns `None` and keeps the content when submission isn't allowed.
    pub fn submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        let text = self.content();
        self.clear();
        Some(text)
    }

    /// Apply an editing action. Returns true if the content or cursor changed.
    pub fn handle_action(&mut self, action: &Action) -> bool {
        match action {
            Action::Char(c) => {
                self.insert(*c);
                true
            }
            Action::Paste(text) => {
                for c in text.chars() {
                    match c {
                        '\r' => {}
                        '\n' => self.insert(' '),
                        c => self.insert(c),
                    }
                }
                true
            }
            Action::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                self.chars.remove(self.cursor);
                true
            }
            Action::Delete if self.cursor < self.chars.len() => {
                self.chars.remove(self.cursor);
                true
            }
            Action::Left if self.cursor > 0 => {
                self.cursor -= 1;
                true
            }
            Action::Right if self.cursor < self.chars.len() => {
                self.cursor += 1;
                true
            }
            Action::Home => {
                self.cursor = 0;
                true
            }
            Action::End => {
                self.cursor = self.chars.len();
                true
            }
            Action::ClearLine => {
                self.clear();
                true
            }
            Action::DeleteWord => {
                let end = self.cursor;
                let mut start = end;
                while start > 0 && self.chars[start - 1] == ' ' {
                    start -= 1;
                }
                while start > 0 && self.chars[start - 1] != ' ' {
                    start -= 1;
                }
                self.chars.drain(start..end);
                self.cursor = start;
                end != start
            }
            _ => false,
        }
    }

    fn insert(&mut self, c: char) {
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
    }

    fn width_of(chars: &[char]) -> usize {
        chars.iter().map(|c| c.width().unwrap_or(0)).sum()
    }

    /// First visible char index so the cursor stays inside `visible` columns
    fn scroll_start(&self, visible: usize) -> usize {
        let mut start = 0;
        while start < self.cursor && Self::width_of(&self.chars[start..self.cursor]) >= visible {
            start += 1;
        }
        start
    }

    /// Render the input box
    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if self.enabled {
                theme.accent_style()
            } else {
                theme.border_style()
            });

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let visible = inner.width as usize;
        let start = self.scroll_start(visible);

        let (text, style) = if self.chars.is_empty() {
            let placeholder = if self.enabled {
                &self.placeholder
            } else {
                &self.busy_placeholder
            };
            (placeholder.clone(), theme.dim_style())
        } else {
            let mut shown = String::new();
            let mut used = 0;
            for c in &self.chars[start..] {
                let w = c.width().unwrap_or(0);
                if used + w > visible {
                    break;
                }
                shown.push(*c);
                used += w;
            }
            (shown, theme.base_style())
        };

        Paragraph::new(text).style(style).render(inner, buf);

        if self.enabled {
            let cursor_x = Self::width_of(&self.chars[start..self.cursor]);
            if cursor_x < visible {
                if let Some(cell) = buf.cell_mut((inner.x + cursor_x as u16, inner.y)) {
                    cell.set_style(Style::default().bg(theme.accent));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_action(&Action::Char(c));
        }
        input
    }

    #[test]
    fn test_submit_takes_content() {
        let mut input = typed("hello");
        assert_eq!(input.submit(), Some("hello".to_string()));
        assert_eq!(input.content(), "");
    }

    #[test]
    fn test_blank_input_does_not_submit() {
        let mut input = typed("   ");
        assert!(input.is_blank());
        assert_eq!(input.submit(), None);
        assert_eq!(input.content(), "   ");
    }

    #[test]
    fn test_disabled_input_keeps_content() {
        let mut input = typed("wait");
        input.set_enabled(false);
        assert_eq!(input.submit(), None);
        assert_eq!(input.content(), "wait");
    }

    #[test]
    fn test_editing_multibyte() {
        let mut input = typed("héllo");
        input.handle_action(&Action::Left);
        input.handle_action(&Action::Backspace);
        assert_eq!(input.content(), "hélo");
        input.handle_action(&Action::Home);
        input.handle_action(&Action::Delete);
        assert_eq!(input.content(), "élo");
    }

    #[test]
    fn test_delete_word() {
        let mut input = typed("describe this image  ");
        input.handle_action(&Action::DeleteWord);
        assert_eq!(input.content(), "describe this ");
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let mut input = InputBox::new();
        input.handle_action(&Action::Paste("a\r\nb".into()));
        assert_eq!(input.content(), "a b");
    }

    #[test]
    fn test_scroll_keeps_cursor_visible() {
        let input = typed("abcdefghij");
        assert_eq!(input.scroll_start(4), 7);
        assert_eq!(input.scroll_start(20), 0);
    }
}
