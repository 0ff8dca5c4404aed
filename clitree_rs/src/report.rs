//! Text for failure reports: argument labels, aligned tables, not-found.
//!
//! Argument labels use the usual notation:
//!
//! | kind | label |
//! |---|---|
//! | required positional | `<name>` |
//! | optional positional | `[name]` |
//! | named, flag | `--name`, `-n` |
//! | overflow, transfer | `{...name}` |
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use crate::argument::{Argument, ArgumentKind, AssignmentState};
use crate::assign::UnknownName;
use crate::colors::Painter;

/// Label one of an argument's names.
pub fn argument_label(arg: &Argument, name: &str) -> String {
    let name = name.trim();
    match arg.kind() {
        ArgumentKind::Positional if arg.is_required() => format!("<{name}>"),
        ArgumentKind::Positional => format!("[{name}]"),
        ArgumentKind::Named | ArgumentKind::Flag if name.chars().count() > 1 => {
            format!("--{name}")
        }
        ArgumentKind::Named | ArgumentKind::Flag => format!("-{name}"),
        ArgumentKind::Overflow | ArgumentKind::Transfer => format!("{{...{name}}}"),
        ArgumentKind::Env => name.to_string(),
    }
}

/// Colored label of the canonical name.
pub fn painted_label(arg: &Argument, painter: &Painter) -> String {
    painter.kind(&argument_label(arg, arg.canonical_name()), arg.kind())
}

/// Colored labels of every printable name, joined by `" | "`.
pub fn painted_aliases(arg: &Argument, painter: &Painter) -> String {
    arg.names()
        .into_iter()
        .map(|name| painter.kind(&argument_label(arg, name), arg.kind()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Display width, skipping ANSI escape sequences.
pub fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in text.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}

/// Align rows into columns separated by two spaces.
///
/// The last column is never padded. Multi-line cells are not wrapped.
pub fn render_columns(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(visible_width(cell));
        }
    }

    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 && widths[i - 1] > 0 {
                    line.push_str("  ");
                }
                line.push_str(cell);
                if i + 1 < row.len() {
                    let pad = widths[i].saturating_sub(visible_width(cell));
                    line.push_str(&" ".repeat(pad));
                }
            }
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Table of errored and missing required arguments.
pub fn argument_errors_table(errored: &[&Argument], painter: &Painter) -> String {
    let rows: Vec<Vec<String>> = errored
        .iter()
        .map(|arg| {
            let reason = match arg.state() {
                AssignmentState::Errored(message) => message.clone(),
                _ => painter.warn("required"),
            };
            vec![String::new(), painted_aliases(arg, painter), reason]
        })
        .collect();
    format!(
        "{}\n{}",
        painter.error("Invalid or missing arguments"),
        render_columns(&rows)
    )
}

/// Table of unclaimed positional values and unknown flags.
pub fn unknown_tokens_table(
    overflow: &[String],
    unknown: &[UnknownName],
    painter: &Painter,
) -> String {
    let rows: Vec<Vec<String>> = overflow
        .iter()
        .map(|token| {
            vec![
                String::new(),
                painter.warn(token),
                "Unexpected positional value".to_string(),
            ]
        })
        .chain(unknown.iter().map(|u| {
            vec![
                String::new(),
                painter.warn(&u.token),
                "Unknown flag or argument".to_string(),
            ]
        }))
        .collect();
    format!(
        "{}\n{}",
        painter.error("Unrecognized command sequence"),
        render_columns(&rows)
    )
}

/// `Command '<words>' not found.` plus the best suggestion, if any.
pub fn not_found_text(
    program: &str,
    words: &str,
    suggestion: Option<&str>,
    show_error: bool,
    painter: &Painter,
) -> String {
    let mut lines = Vec::new();
    if show_error {
        lines.push(format!("Command '{}' not found.", painter.ok(words)));
    }
    if let Some(suggestion) = suggestion {
        lines.push(painter.ok("Did you mean?"));
        let invocation = [program.trim(), suggestion]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("  {}", painter.command(&invocation)));
    }
    lines.join("\n")
}
