//! Markdown rendering for assistant replies

use crate::theme::Theme;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Render markdown into styled lines no wider than `width`.
///
/// Images can't be drawn in the terminal, so they are replaced by a marker
/// carrying their alt text.
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(theme, width.max(1));
    for event in Parser::new(text) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer<'t> {
    theme: &'t Theme,
    width: usize,
    lines: Vec<Line<'static>>,
    pending: Vec<Span<'static>>,
    styles: Vec<Style>,
    code_block: Option<String>,
    /// Alt text being collected for an image
    image_alt: Option<String>,
    list_depth: usize,
}

impl<'t> Renderer<'t> {
    fn new(theme: &'t Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            pending: Vec::new(),
            styles: vec![theme.base_style()],
            code_block: None,
            image_alt: None,
            list_depth: 0,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, f: impl FnOnce(Style) -> Style) {
        let style = f(self.style());
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        if self.styles.len() > 1 {
            self.styles.pop();
        }
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.pending);
        self.lines.extend(wrap_spans(spans, self.width));
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code_block.as_mut() {
                    code.push_str(&text);
                } else if let Some(alt) = self.image_alt.as_mut() {
                    alt.push_str(&text);
                } else {
                    let style = self.style();
                    self.pending.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                let style = self.theme.code_style().add_modifier(Modifier::BOLD);
                self.pending.push(Span::styled(format!("`{}`", code), style));
            }
            Event::SoftBreak => self.pending.push(Span::styled(" ", self.style())),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width),
                    self.theme.dim_style(),
                )));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.flush(),
            Tag::Heading { level, .. } => {
                self.flush();
                let modifier = match level {
                    HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
                    HeadingLevel::H2 => Modifier::BOLD,
                    _ => Modifier::empty(),
                };
                let style = self.theme.accent_style().add_modifier(modifier);
                self.styles.push(style);
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::List(_) => {
                self.flush();
                self.list_depth += 1;
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.pending
                    .push(Span::styled(format!("{}• ", indent), self.theme.dim_style()));
            }
            Tag::Emphasis => self.push_style(|s| s.add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(|s| s.add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(|s| s.add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { .. } => {
                let link = self.theme.link;
                self.push_style(|s| s.fg(link).add_modifier(Modifier::UNDERLINED));
            }
            Tag::Image { .. } => self.image_alt = Some(String::new()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                self.blank();
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.pop_style();
            }
            TagEnd::CodeBlock => {
                let code = self.code_block.take().unwrap_or_default();
                let style = self.theme.code_style().add_modifier(Modifier::DIM);
                let room = self.width.saturating_sub(2).max(1);
                for code_line in code.lines() {
                    self.lines.push(Line::from(Span::styled(
                        format!("  {}", truncate(code_line, room)),
                        style,
                    )));
                }
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.blank();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style()
            }
            TagEnd::Image => {
                let alt = self.image_alt.take().unwrap_or_default();
                let marker = if alt.trim().is_empty() {
                    "[image]".to_string()
                } else {
                    format!("[image: {}]", alt.trim())
                };
                self.pending.push(Span::styled(marker, self.theme.image_style()));
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Cut `text` to `width` columns, marking the cut with an ellipsis
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Word-wrap styled spans into lines of at most `width` columns
fn wrap_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in spans {
        let style = span.style;
        for word in split_keep_spaces(&span.content) {
            let w = word.width();
            if used + w > width && used > 0 {
                lines.push(Line::from(std::mem::take(&mut line)));
                used = 0;
                if word.trim().is_empty() {
                    continue;
                }
            }
            if w > width {
                // A single word longer than the line: hard-break it
                for chunk in textwrap::wrap(word, width) {
                    if used > 0 {
                        lines.push(Line::from(std::mem::take(&mut line)));
                    }
                    used = chunk.width();
                    line.push(Span::styled(chunk.into_owned(), style));
                }
                continue;
            }
            used += w;
            line.push(Span::styled(word.to_string(), style));
        }
    }

    if !line.is_empty() {
        lines.push(Line::from(line));
    }
    lines
}

/// Split into words and runs of spaces, keeping both
fn split_keep_spaces(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in text.char_indices() {
        let space = c == ' ';
        if in_space.is_some_and(|s| s != space) {
            parts.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_simple_text() {
        let theme = Theme::dark();
        let lines = render_markdown("Hello, world!", &theme, 80);
        assert_eq!(plain(&lines), vec!["Hello, world!"]);
    }

    #[test]
    fn test_wraps_to_width() {
        let theme = Theme::dark();
        let lines = render_markdown("one two three four", &theme, 9);
        assert!(lines.iter().all(|l| l.width() <= 9));
        assert_eq!(plain(&lines), vec!["one two ", "three ", "four"]);
    }

    #[test]
    fn test_image_becomes_marker() {
        let theme = Theme::dark();
        let lines = render_markdown("![a red cat](data:image/png;base64,AAAA)", &theme, 80);
        assert_eq!(plain(&lines), vec!["[image: a red cat]"]);
    }

    #[test]
    fn test_code_block_truncates_unicode_safely() {
        let theme = Theme::dark();
        let md = "```\nlet s = \"ééééééééééééééééééé\";\n```";
        let lines = render_markdown(md, &theme, 12);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].width() <= 12);
    }

    #[test]
    fn test_list_items_get_bullets() {
        let theme = Theme::dark();
        let lines = render_markdown("- a\n- b", &theme, 80);
        assert_eq!(plain(&lines), vec!["• a", "• b"]);
    }

    #[test]
    fn test_nested_styles_restore() {
        let theme = Theme::dark();
        let lines = render_markdown("**bold *both*** plain", &theme, 80);
        let last = lines[0].spans.last().unwrap();
        assert_eq!(last.content.as_ref(), "plain");
        assert_eq!(last.style, theme.base_style());
    }
}
