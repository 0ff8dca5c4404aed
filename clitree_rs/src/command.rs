//! Command descriptors and the command table.
//!
//! Commands are keyed by a normalized path (`"do something regular"`, `""`
//! for the root). Paths may only hold letters, digits, underscores, dashes
//! and single spaces between words. Ancestry is textual: `a b` is an
//! ancestor of `a b c` but not of `a bc`.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;

use crate::argument::Argument;
use crate::error::CliError;
use crate::parsed::ParsedArgs;

fn regex_command_text() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9 _-]*$").expect("valid regex literal"))
}

/// True if the text only holds letters, numbers, underscores, spaces and dashes.
pub fn is_valid_command_text(command: &str) -> bool {
    regex_command_text().is_match(command)
}

/// Collapse runs of whitespace and trim.
pub fn clean_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate then normalize a command path.
pub fn normalize_command(command: &str) -> Result<String, CliError> {
    if !is_valid_command_text(command) {
        return Err(CliError::InvalidCommandText {
            command: command.to_string(),
        });
    }
    Ok(clean_command(command))
}

/// `ancestor` is a strict, word-boundary prefix of `path`.
///
/// The root (`""`) is an ancestor of every other path.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == path {
        return false;
    }
    if ancestor.is_empty() {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with(' '))
}

type ActionFuture = BoxFuture<'static, anyhow::Result<()>>;

/// The callable attached to a command. Receives the bound arguments.
#[derive(Clone)]
pub struct Action(Arc<dyn Fn(ParsedArgs) -> ActionFuture + Send + Sync>);

impl Action {
    /// Wrap an asynchronous action.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ParsedArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self(Arc::new(move |args| f(args).boxed()))
    }

    /// Wrap a synchronous action.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(ParsedArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(move |args| futures::future::ready(f(args)).boxed()))
    }

    pub async fn call(&self, args: ParsedArgs) -> anyhow::Result<()> {
        (self.0)(args).await
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// A registered command: its arguments, action and help metadata.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub(crate) arguments: Vec<Argument>,
    pub(crate) action: Option<Action>,
    pub(crate) description: String,
    pub(crate) example: Option<String>,
    pub(crate) help_prefix: Option<String>,
    pub(crate) help_suffix: Option<String>,
    pub(crate) inherit_parent_named_options: bool,
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self {
            arguments: Vec::new(),
            action: None,
            description: String::new(),
            example: None,
            help_prefix: None,
            help_suffix: None,
            inherit_parent_named_options: true,
        }
    }
}

impl CommandSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn arguments(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Shorthand for a synchronous action.
    pub fn run<F>(self, f: F) -> Self
    where
        F: Fn(ParsedArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action(Action::sync(f))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn help_prefix(mut self, text: impl Into<String>) -> Self {
        self.help_prefix = Some(text.into());
        self
    }

    pub fn help_suffix(mut self, text: impl Into<String>) -> Self {
        self.help_suffix = Some(text.into());
        self
    }

    /// Whether ancestor named options are offered on this command (default true).
    pub fn inherit_parent_named_options(mut self, inherit: bool) -> Self {
        self.inherit_parent_named_options = inherit;
        self
    }

    pub fn argument_list(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn action_ref(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn example_text(&self) -> Option<&str> {
        self.example.as_deref()
    }

    pub fn help_prefix_text(&self) -> Option<&str> {
        self.help_prefix.as_deref()
    }

    pub fn help_suffix_text(&self) -> Option<&str> {
        self.help_suffix.as_deref()
    }

    pub fn inherits_parent_named_options(&self) -> bool {
        self.inherit_parent_named_options
    }
}

/// Ordered mapping from normalized command path to command.
///
/// Registration order is kept; it breaks ties during resolution and orders
/// suggestions of equal distance.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<(String, CommandSpec)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|(p, _)| p == path)
    }

    /// Add or replace a command. Replacement keeps the original slot.
    pub fn insert(&mut self, path: &str, command: CommandSpec) -> Result<String, CliError> {
        let path = normalize_command(path)?;
        match self.position(&path) {
            Some(idx) => self.entries[idx].1 = command,
            None => self.entries.push((path.clone(), command)),
        }
        Ok(path)
    }

    pub fn get(&self, path: &str) -> Result<Option<&CommandSpec>, CliError> {
        let path = normalize_command(path)?;
        Ok(self.position(&path).map(|idx| &self.entries[idx].1))
    }

    pub fn get_mut(&mut self, path: &str) -> Result<Option<&mut CommandSpec>, CliError> {
        let path = normalize_command(path)?;
        Ok(self.position(&path).map(|idx| &mut self.entries[idx].1))
    }

    pub fn remove(&mut self, path: &str) -> Result<Option<CommandSpec>, CliError> {
        let path = normalize_command(path)?;
        Ok(self.position(&path).map(|idx| self.entries.remove(idx).1))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(&clean_command(path)).is_some()
    }

    /// Registration index of a normalized path.
    pub(crate) fn index_of(&self, path: &str) -> Option<usize> {
        self.position(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandSpec)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), c))
    }

    /// Registered strict ancestors of `path`, in table order.
    pub fn ancestors(&self, path: &str) -> Vec<(&str, &CommandSpec)> {
        self.iter().filter(|(p, _)| is_ancestor(p, path)).collect()
    }

    /// Direct children: descendants with no registered command in between.
    pub fn sub_commands(&self, path: &str) -> Vec<&str> {
        let path = clean_command(path);
        let descendants: Vec<&str> = self.paths().filter(|p| is_ancestor(&path, p)).collect();
        descendants
            .iter()
            .copied()
            .filter(|child| !descendants.iter().any(|other| is_ancestor(other, child)))
            .collect()
    }
}
