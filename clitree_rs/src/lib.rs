//! # clitree
//!
//! **Declarative command trees** - register commands as multi-word paths,
//! describe their arguments, and let clitree resolve, bind and invoke.
//!
//! ## Features
//!
//! - **Longest-match resolution** - `do something regular -t x` finds
//!   `do something regular` even when argument values look like words
//! - **Three value sources** - defaults, environment variables and command
//!   line tokens, merged per argument with a clear precedence
//! - **Every argument kind** - named, flag, positional, environment-only,
//!   overflow (`{...rest}`) and transfer (everything after `--`)
//! - **Aggregate reports** - every invalid, missing or unknown argument in
//!   one table, plus "did you mean?" for mistyped commands
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clitree::{Argument, Cli, CommandSpec, ParseOptions};
//!
//! # async fn run() -> Result<(), clitree::CliError> {
//! let cli = Cli::new("app");
//! cli.set(
//!     "greet",
//!     CommandSpec::new()
//!         .argument(Argument::positional("who"))
//!         .argument(Argument::flag("loud").alias("l"))
//!         .run(|args| {
//!             println!("hello {}", args.get_str("who").unwrap_or_default());
//!             Ok(())
//!         }),
//! )?;
//!
//! let outcome = cli.parse("greet world -l", &ParseOptions::default()).await?;
//! outcome.emit();
//! # Ok(())
//! # }
//! ```
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

// ============================================================================
// Engine
// ============================================================================

/// Arguments and their reset/assign state machine.
pub mod argument;

/// Token assignment: residual tokens onto a command's arguments.
pub mod assign;

/// Command descriptors, path normalization and the command table.
pub mod command;

/// Which registered command an argv invokes.
pub mod resolver;

/// "Did you mean?" suggestions.
pub mod suggest;

/// The command tree handle and the parse orchestrator.
pub mod cli;

// ============================================================================
// Supporting modules
// ============================================================================

pub mod argv;
pub mod colors;
pub mod descriptor;
pub mod environment;
pub mod error;
pub mod help;
pub mod hooks;
pub mod logging;
pub mod options;
pub mod parsed;
pub mod pattern;
pub mod report;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use argument::{Argument, ArgumentKind, AssignmentState, ValueParser};
pub use cli::{Cli, FailureReport, NotFoundReport, ParseOutcome};
pub use command::{Action, CommandSpec, CommandTable};
pub use descriptor::arguments_from_object;
pub use environment::{Environment, MemoryEnv, ProcessEnv};
pub use error::{ArgumentIssue, CliError};
pub use help::{HelpContext, HelpRenderer, PlainHelpRenderer};
pub use hooks::{CliObserver, TracingObserver};
pub use options::{CliSettings, ColorMode, ParseOptions};
pub use parsed::{ArgumentOutcome, ParsedArgs};
