//! Terminal styling helpers

use owo_colors::{OwoColorize, Stream::Stdout, Style};
use std::fmt::Display;

/// Check mark used in summaries
pub const CHECK: &str = "✓";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// Bold, for headings
    fn emphasis(&self) -> String {
        self.if_supports_color(Stdout, |t| t.style(Style::new().bold()))
            .to_string()
    }

    /// Cyan, for names and numbers
    fn accent(&self) -> String {
        self.if_supports_color(Stdout, |t| t.style(Style::new().cyan()))
            .to_string()
    }

    /// Green, for success
    fn success(&self) -> String {
        self.if_supports_color(Stdout, |t| t.style(Style::new().green()))
            .to_string()
    }

    /// Red, for failures
    fn error(&self) -> String {
        self.if_supports_color(Stdout, |t| t.style(Style::new().red().bold()))
            .to_string()
    }

    /// Dimmed, for secondary text
    fn muted(&self) -> String {
        self.if_supports_color(Stdout, |t| t.style(Style::new().dimmed()))
            .to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Styled cross
pub fn cross() -> String {
    "✗".error()
}

/// Styled arrow for list items
pub fn arrow() -> String {
    "→".muted()
}
