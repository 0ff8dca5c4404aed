//! Lifecycle observers.
//!
//! Call points, in parse order:
//!
//! ```text
//!   set/on/new ──► command_added
//!   parse ──► pre_parse ──► (resolve, reset, assign, validate)
//!         ──► help            when help is rendered
//!         ──► parsed          when validation passed
//!         ──► invoke          right before the action runs
//! ```
//!
//! Every method has an empty default, so observers only implement what
//! they care about.

use std::fmt;

use crate::parsed::ParsedArgs;

pub trait CliObserver: Send + Sync {
    /// A command was registered or replaced.
    fn command_added(&self, _path: &str) {}

    /// A parse is about to resolve `argv`.
    fn pre_parse(&self, _argv: &[String]) {}

    /// Arguments were bound and validated.
    fn parsed(&self, _args: &ParsedArgs) {}

    /// The action of `args.command` is about to run.
    fn invoke(&self, _args: &ParsedArgs) {}

    /// Help for `command` was rendered.
    fn help(&self, _command: &str, _text: &str) {}
}

/// Observer that logs every call point through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CliObserver for TracingObserver {
    fn command_added(&self, path: &str) {
        tracing::debug!(command = %path, "command added");
    }

    fn pre_parse(&self, argv: &[String]) {
        tracing::debug!(?argv, "pre parse");
    }

    fn parsed(&self, args: &ParsedArgs) {
        tracing::debug!(command = %args.command, fields = args.values.len(), "parsed");
    }

    fn invoke(&self, args: &ParsedArgs) {
        tracing::info!(command = %args.command, "invoking");
    }

    fn help(&self, command: &str, _text: &str) {
        tracing::debug!(command = %command, "help shown");
    }
}

impl fmt::Debug for dyn CliObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CliObserver(..)")
    }
}
