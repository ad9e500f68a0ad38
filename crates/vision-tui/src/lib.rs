//! vision-tui: Terminal UI components for the vision chat client
//!
//! Widgets built on ratatui and crossterm: the message list with markdown
//! replies, the attachment bar, the prompt input and a spinner.

pub mod input;
pub mod theme;
pub mod widgets;

pub use theme::Theme;
