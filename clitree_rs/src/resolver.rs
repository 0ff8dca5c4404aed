//! Command resolution: which registered command does an argv invoke?
//!
//! Nothing in an argv marks where the command path ends and argument values
//! begin. A word right after a flag may be that flag's value, or it may
//! continue the path. The resolver therefore enumerates every reading:
//!
//! ```text
//!   do something -t regular x
//!   ├── do something regular x      (regular continues the path)
//!   └── do something x              (regular is the value of -t)
//! ```
//!
//! and collects every prefix of every reading. The longest prefix that is a
//! registered command wins.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::HashSet;

use crate::argv::{is_command_word, is_flag_shaped};
use crate::command::{CommandSpec, CommandTable, is_ancestor};

/// Default cap on the number of path readings kept during enumeration.
pub const DEFAULT_MAX_COMMAND_VARIANTS: usize = 4096;

/// A resolved command with its working copies.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Normalized command path
    pub path: String,
    /// Path words in order (empty for the root)
    pub words: Vec<String>,
    /// The command template, cloned for this invocation
    pub command: CommandSpec,
    /// Registered strict ancestors, in table order
    pub ancestors: Vec<(String, CommandSpec)>,
    /// Tokens not consumed as path words, in original order
    pub residual: Vec<String>,
}

/// Every command path an argv could spell, longest first.
///
/// Always includes the root (`""`). Each flag-shaped token forks the set of
/// readings: one where the next word continues the path and one where it is
/// skipped. Forking stops once `max_variants` readings exist; readings past
/// the cap only take the continuing branch.
pub fn possible_commands(argv: &[String], max_variants: usize) -> Vec<String> {
    let mut notations: Vec<Vec<&str>> = vec![Vec::new()];
    let mut last_was_flag = false;
    let mut capped = false;

    for token in argv {
        if is_flag_shaped(token) {
            last_was_flag = true;
            continue;
        }
        if !is_command_word(token) {
            last_was_flag = false;
            continue;
        }

        let skipped = if last_was_flag && notations.len() * 2 <= max_variants {
            Some(notations.clone())
        } else {
            if last_was_flag && !capped {
                capped = true;
                tracing::warn!(
                    "command path enumeration capped at {} variants ({} tokens)",
                    max_variants,
                    argv.len()
                );
            }
            None
        };

        for notation in notations.iter_mut() {
            notation.push(token.trim());
        }
        if let Some(skipped) = skipped {
            notations.extend(skipped);
        }
        last_was_flag = false;
    }

    let mut seen = HashSet::new();
    let mut possibles = Vec::new();
    for notation in &notations {
        for len in 0..=notation.len() {
            let candidate = notation[..len].join(" ");
            if seen.insert(candidate.clone()) {
                possibles.push(candidate);
            }
        }
    }

    possibles.sort_by(|a, b| b.len().cmp(&a.len()));
    possibles
}

/// Remove the path words (in order, first occurrence each) from the argv.
pub fn residual_tokens(argv: &[String], words: &[String]) -> Vec<String> {
    let mut expected = words.iter().peekable();
    let mut residual = Vec::new();
    for token in argv {
        if expected.peek().is_some_and(|w| w.as_str() == token.trim()) {
            expected.next();
            continue;
        }
        residual.push(token.clone());
    }
    residual
}

/// Resolve an argv against the table.
///
/// Picks the registered path with the most words; equal word counts fall
/// back to the longer text, then to registration order. Returns `None` when
/// no reading is registered (only possible without a root command).
pub fn resolve(table: &CommandTable, argv: &[String], max_variants: usize) -> Option<Resolution> {
    let best = possible_commands(argv, max_variants)
        .into_iter()
        .filter_map(|candidate| {
            table
                .index_of(&candidate)
                .map(|index| (candidate, index))
        })
        .min_by(|(a, ai), (b, bi)| {
            word_count(b)
                .cmp(&word_count(a))
                .then(b.len().cmp(&a.len()))
                .then(ai.cmp(bi))
        })?;

    let (path, _) = best;
    let command = table.get(&path).ok().flatten()?.clone();
    let words: Vec<String> = path.split_whitespace().map(String::from).collect();
    let ancestors = table
        .iter()
        .filter(|(p, _)| is_ancestor(p, &path))
        .map(|(p, c)| (p.to_string(), c.clone()))
        .collect();
    let residual = residual_tokens(argv, &words);

    tracing::debug!(
        command = %path,
        residual = ?residual,
        "resolved command"
    );

    Some(Resolution {
        path,
        words,
        command,
        ancestors,
        residual,
    })
}

fn word_count(path: &str) -> usize {
    path.split_whitespace().count()
}
