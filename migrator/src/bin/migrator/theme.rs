//! Terminal palette shared by status lines, tables and help text.

use colored::Color;

/// Kind of status line; picks its icon and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
    /// Verbose-only detail
    Detail,
    /// One phase of a running script
    Progress,
    /// Script was not run because it already executed
    Skipped,
}

impl Tone {
    pub const fn icon(self) -> &'static str {
        match self {
            Tone::Success => "✓",
            Tone::Error => "✗",
            Tone::Warning => "⚠",
            Tone::Info => "ℹ",
            Tone::Detail => ARROW,
            Tone::Progress => "⟳",
            Tone::Skipped => "↷",
        }
    }

    pub const fn color(self) -> Color {
        match self {
            Tone::Success => Color::Green,
            Tone::Error => Color::Red,
            Tone::Warning | Tone::Skipped => Color::Yellow,
            Tone::Info => Color::Blue,
            Tone::Detail => MUTED,
            Tone::Progress => Color::Cyan,
        }
    }
}

pub const HEADING: Color = Color::BrightBlue;
pub const SECTION: Color = Color::Cyan;
pub const COMMAND: Color = Color::Magenta;
pub const MUTED: Color = Color::BrightBlack;
pub const KEY: Color = Color::BrightCyan;
pub const VALUE: Color = Color::White;

pub const ARROW: &str = "→";
pub const BULLET: &str = "•";
