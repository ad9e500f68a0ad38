//! Pending attachment names shown above the input

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

/// One-line bar listing attachments queued for the next message
pub struct AttachmentBar<'a> {
    names: &'a [String],
    theme: &'a Theme,
}

impl<'a> AttachmentBar<'a> {
    pub fn new(names: &'a [String], theme: &'a Theme) -> Self {
        Self { names, theme }
    }

    /// Rows needed: one when anything is attached, otherwise none
    pub fn height(names: &[String]) -> u16 {
        if names.is_empty() { 0 } else { 1 }
    }

    fn line(&self) -> Line<'static> {
        let mut spans = vec![Span::styled("📎 ", self.theme.image_style())];
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(", ", self.theme.dim_style()));
            }
            spans.push(Span::styled(name.clone(), self.theme.base_style()));
        }
        Line::from(spans)
    }
}

impl Widget for AttachmentBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.names.is_empty() || area.height == 0 {
            return;
        }
        buf.set_line(area.x, area.y, &self.line(), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_depends_on_names() {
        assert_eq!(AttachmentBar::height(&[]), 0);
        assert_eq!(AttachmentBar::height(&["a.png".to_string()]), 1);
    }

    #[test]
    fn test_line_lists_names_in_order() {
        let theme = Theme::dark();
        let names = vec!["cat.png".to_string(), "dog.jpg".to_string()];
        let line = AttachmentBar::new(&names, &theme).line();
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "📎 cat.png, dog.jpg");
    }
}
