//! ANSI coloring for help and failure reports.
//!
//! Each argument kind has its own color so the same argument reads the
//! same way in the help screen and in an error table.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::io::IsTerminal;

use crate::argument::ArgumentKind;
use crate::options::ColorMode;

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const WHITE: &str = "\x1b[37m";
pub const GRAY: &str = "\x1b[90m";

pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

/// Resolve a color mode against the terminal (reports go to stderr).
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stderr().is_terminal(),
    }
}

/// The color of an argument kind.
pub fn kind_color(kind: ArgumentKind) -> &'static str {
    match kind {
        ArgumentKind::Named => YELLOW,
        ArgumentKind::Positional => CYAN,
        ArgumentKind::Flag => GREEN,
        ArgumentKind::Transfer => WHITE,
        ArgumentKind::Overflow | ArgumentKind::Env => MAGENTA,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Errors, required markers
    pub fn error(&self, s: &str) -> String {
        self.wrap(s, RED)
    }

    /// Offending tokens
    pub fn warn(&self, s: &str) -> String {
        self.wrap(s, YELLOW)
    }

    /// "Did you mean?"
    pub fn ok(&self, s: &str) -> String {
        self.wrap(s, GREEN)
    }

    /// Commands with an action
    pub fn command(&self, s: &str) -> String {
        self.wrap(s, CYAN)
    }

    /// Commands without an action (menus)
    pub fn menu(&self, s: &str) -> String {
        self.wrap(s, BLUE)
    }

    /// Section titles and current values
    pub fn topic(&self, s: &str) -> String {
        self.wrap(s, GRAY)
    }

    pub fn header(&self, s: &str) -> String {
        self.wrap(s, BOLD)
    }

    pub fn kind(&self, s: &str, kind: ArgumentKind) -> String {
        self.wrap(s, kind_color(kind))
    }

    pub fn wrap(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}
