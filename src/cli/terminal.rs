//! Colour for the CLI's console output.
//!
//! Colour is only applied when stdout supports it, so piped output stays
//! plain.

use owo_colors::{OwoColorize, Style, colors::css};

fn colour_enabled() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Roles a line of console output can play.
pub trait Paint {
    /// Something was written to the library (green).
    fn saved(&self) -> String;
    /// Content is missing or cannot be saved (amber).
    fn caution(&self) -> String;
    /// Ids, headings and other secondary text (dimmed).
    fn muted(&self) -> String;
}

impl<S: AsRef<str> + ?Sized> Paint for S {
    fn saved(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Green>())
    }

    fn caution(&self) -> String {
        paint(self.as_ref(), Style::new().fg::<css::Orange>())
    }

    fn muted(&self) -> String {
        paint(self.as_ref(), Style::new().dimmed())
    }
}

fn paint(text: &str, style: Style) -> String {
    if colour_enabled() {
        text.style(style).to_string()
    } else {
        text.to_owned()
    }
}
