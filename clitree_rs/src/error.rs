//! Error types for clitree.
//!
//! Two categories live here:
//! - [`CliError`]: raised immediately (programmer errors, configured throws,
//!   action failures). These abort the call that produced them.
//! - [`ArgumentIssue`]: collected while validating one invocation and
//!   reported in aggregate, so a user sees every problem at once.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use serde::Serialize;
use thiserror::Error;

use crate::argument::ArgumentKind;

/// Errors returned by registration, lookup and parsing calls.
#[derive(Debug, Error)]
pub enum CliError {
    /// A registered or looked-up command path contains disallowed characters.
    #[error(
        "invalid characters in command '{command}': a command may only contain \
         letters, numbers, underscores, spaces and dashes"
    )]
    InvalidCommandText { command: String },

    /// No registered command matches the input, and the parse options ask
    /// for this to be raised instead of reported.
    #[error("command not found, args: {argv:?}")]
    CommandNotFound { argv: Vec<String> },

    /// An object-derived argument descriptor could not be read.
    #[error("invalid argument descriptor for '{field}': {reason}")]
    InvalidDescriptor { field: String, reason: String },

    /// Configuration file could not be parsed.
    #[error("failed to load parse options from {path}: {reason}")]
    Config { path: String, reason: String },

    /// The command action failed. Propagated untouched.
    #[error(transparent)]
    Action(anyhow::Error),
}

/// A validation problem found while binding one invocation.
///
/// Issues are never thrown; the orchestrator gathers all of them and hands
/// them back inside a failure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ArgumentIssue {
    /// A value transform rejected its input; the previous value was kept.
    #[error("{name}: {message}")]
    ParseError {
        field: String,
        name: String,
        kind: ArgumentKind,
        message: String,
    },

    /// A required argument never received a value.
    #[error("{name}: required")]
    RequiredMissing {
        field: String,
        name: String,
        kind: ArgumentKind,
    },

    /// A flag-shaped token matched no named or flag argument.
    #[error("{token}: unknown flag or argument")]
    UnknownToken { token: String, name: String },

    /// A positional token had no positional or overflow argument to land in.
    #[error("{token}: unexpected positional value")]
    UnexpectedPositional { token: String },
}
