//! Arguments: one bindable value of a command.
//!
//! An [`Argument`] is registered as a template inside a command. Each parse
//! clones the templates and drives the copies through the reset/assign state
//! machine:
//!
//! ```text
//!   reset()                      assign(value)
//!  ─────────►  Unset / Skipped  ───────────────►  Assigned | Errored
//! ```
//!
//! `reset` merges the default with the bound environment variable (the
//! variable wins) and assigns the result. `assign` runs the optional value
//! transform, coerces flags, appends to collected values, and mirrors the
//! result back into the environment.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::environment::Environment;
use crate::pattern::Pattern;

/// How an argument receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentKind {
    /// `--name value` / `-n value`
    Named,
    /// `--name`, boolean
    Flag,
    /// Bound by position among non-flag tokens
    Positional,
    /// Only read from the environment
    Env,
    /// Everything after `--`
    Transfer,
    /// Positional tokens beyond the declared positionals
    Overflow,
}

impl ArgumentKind {
    pub const ALL: [ArgumentKind; 6] = [
        ArgumentKind::Named,
        ArgumentKind::Flag,
        ArgumentKind::Positional,
        ArgumentKind::Env,
        ArgumentKind::Transfer,
        ArgumentKind::Overflow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentKind::Named => "named",
            ArgumentKind::Flag => "flag",
            ArgumentKind::Positional => "positional",
            ArgumentKind::Env => "env",
            ArgumentKind::Transfer => "transfer",
            ArgumentKind::Overflow => "overflow",
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArgumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArgumentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid argument type '{}'. Use: named, flag, positional, env, transfer, or overflow.",
                    s
                )
            })
    }
}

/// Where an argument is in its reset/assign cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum AssignmentState {
    /// Never reset in this cycle.
    #[default]
    Unset,
    /// Reset found no default and no environment value.
    Skipped,
    /// A value (default, environment or token) was bound.
    Assigned,
    /// The value transform failed with this message.
    Errored(String),
}

impl AssignmentState {
    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentState::Assigned)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AssignmentState::Errored(message) => Some(message),
            _ => None,
        }
    }
}

type ParseFuture = BoxFuture<'static, Result<Value, String>>;

/// A value transform. May be synchronous or asynchronous; may fail.
#[derive(Clone)]
pub struct ValueParser(Arc<dyn Fn(Value) -> ParseFuture + Send + Sync>);

impl ValueParser {
    /// Wrap a synchronous transform.
    pub fn new<F, E>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self(Arc::new(move |value| {
            let result = f(value).map_err(|e| e.to_string());
            futures::future::ready(result).boxed()
        }))
    }

    /// Wrap an asynchronous transform.
    pub fn new_async<F, Fut, E>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self(Arc::new(move |value| {
            f(value).map(|r| r.map_err(|e| e.to_string())).boxed()
        }))
    }

    pub async fn parse(&self, value: Value) -> Result<Value, String> {
        (self.0)(value).await
    }
}

impl fmt::Debug for ValueParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValueParser(..)")
    }
}

/// Derive the canonical argument name from a field name.
pub fn name_from_field(field_name: &str) -> String {
    field_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// `true`, `1`, `"1"` and `"true"` are truthy flag tokens.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => s == "1" || s == "true",
        _ => false,
    }
}

/// Render a bound value as an environment variable string.
///
/// Lists of plain strings are comma-joined; any other list is written as
/// JSON so [`env_string_to_value`] can read it back unchanged.
pub fn value_to_env_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items)
            if items
                .iter()
                .all(|item| item.as_str().is_some_and(|s| !s.contains(','))) =>
        {
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(",")
        }
        other => other.to_string(),
    }
}

/// Read an environment variable back into the shape of `default`.
///
/// Collected arguments get a list (JSON or comma-separated). Numbers and
/// booleans keep their type when the text still parses as one.
pub fn env_string_to_value(text: &str, default: &Value, collectable: bool) -> Value {
    if collectable {
        if let Ok(list @ Value::Array(_)) = serde_json::from_str::<Value>(text) {
            return list;
        }
        if text.is_empty() {
            return Value::Array(Vec::new());
        }
        return Value::Array(text.split(',').map(|s| Value::String(s.to_string())).collect());
    }
    match (default, serde_json::from_str::<Value>(text)) {
        (Value::Number(_), Ok(parsed @ Value::Number(_)))
        | (Value::Bool(_), Ok(parsed @ Value::Bool(_)))
        | (Value::Array(_), Ok(parsed @ Value::Array(_))) => parsed,
        _ => Value::String(text.to_string()),
    }
}

fn is_plain_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// One bindable command argument.
#[derive(Debug, Clone)]
pub struct Argument {
    kind: ArgumentKind,
    field_name: String,
    name: String,
    aliases: Vec<Pattern>,
    default: Value,
    value: Value,
    environment_variable: Option<String>,
    require: Option<bool>,
    parser: Option<ValueParser>,
    collect_multiple: bool,
    description: Option<String>,
    do_not_assign_to_parent: bool,
    do_not_assign_to_env: bool,
    can_be_stored: bool,
    state: AssignmentState,
    read_env_from_process: bool,
    env_has_been_updated: bool,
}

impl Argument {
    /// A new argument bound to `field_name`.
    ///
    /// `env` arguments are bound to the environment variable of the same name.
    pub fn new(field_name: impl Into<String>, kind: ArgumentKind) -> Self {
        let field_name = field_name.into();
        Self {
            kind,
            name: name_from_field(&field_name),
            environment_variable: (kind == ArgumentKind::Env).then(|| field_name.clone()),
            field_name,
            aliases: Vec::new(),
            default: Value::Null,
            value: Value::Null,
            require: None,
            parser: None,
            collect_multiple: false,
            description: None,
            do_not_assign_to_parent: false,
            do_not_assign_to_env: false,
            can_be_stored: true,
            state: AssignmentState::Unset,
            read_env_from_process: false,
            env_has_been_updated: false,
        }
    }

    pub fn named(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Named)
    }

    pub fn flag(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Flag)
    }

    pub fn positional(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Positional)
    }

    pub fn env(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Env)
    }

    pub fn transfer(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Transfer)
    }

    pub fn overflow(field_name: impl Into<String>) -> Self {
        Self::new(field_name, ArgumentKind::Overflow)
    }

    // === Builders ===

    /// Override the canonical name (defaults to the field name with
    /// non-alphanumerics turned into dashes).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an alias: a literal word, a glob, or a `re::` regex.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(Pattern::lenient(alias));
        self
    }

    pub fn aliases<'a>(mut self, aliases: impl IntoIterator<Item = &'a str>) -> Self {
        self.aliases.extend(aliases.into_iter().map(Pattern::lenient));
        self
    }

    /// Add an already compiled alias pattern.
    pub fn alias_pattern(mut self, pattern: impl Into<Pattern>) -> Self {
        self.aliases.push(pattern.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Bind to an environment variable (read at reset, written on assign).
    pub fn env_var(mut self, variable: impl Into<String>) -> Self {
        self.environment_variable = Some(variable.into());
        self
    }

    pub fn required(mut self, require: bool) -> Self {
        self.require = Some(require);
        self
    }

    /// Set a synchronous value transform.
    pub fn parse_with<F, E>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.parser = Some(ValueParser::new(f));
        self
    }

    /// Set an asynchronous value transform.
    pub fn parse_with_async<F, Fut, E>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: fmt::Display,
    {
        self.parser = Some(ValueParser::new_async(f));
        self
    }

    pub fn parser(mut self, parser: ValueParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Collect every occurrence into a list (named arguments only;
    /// overflow and transfer always collect).
    pub fn collect_multiple(mut self, collect: bool) -> Self {
        self.collect_multiple = collect;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Keep the value out of the materialized field map.
    pub fn do_not_assign_to_parent(mut self) -> Self {
        self.do_not_assign_to_parent = true;
        self
    }

    /// Never write the value back into the environment variable.
    pub fn do_not_assign_to_env(mut self) -> Self {
        self.do_not_assign_to_env = true;
        self
    }

    /// Whether an external configuration store may persist this argument.
    pub fn can_be_stored(mut self, can_be_stored: bool) -> Self {
        self.can_be_stored = can_be_stored;
        self
    }

    // === Accessors ===

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn canonical_name(&self) -> &str {
        &self.name
    }

    pub fn alias_patterns(&self) -> &[Pattern] {
        &self.aliases
    }

    /// Printable names: the canonical name plus aliases that are plain words.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().filter_map(Pattern::as_literal))
            .filter(|n| is_plain_word(n))
            .collect()
    }

    /// The default, after any environment override from the last reset.
    pub fn current_default(&self) -> &Value {
        &self.default
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn state(&self) -> &AssignmentState {
        &self.state
    }

    pub fn environment_variable(&self) -> Option<&str> {
        self.environment_variable.as_deref()
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Positional arguments are required unless told otherwise.
    pub fn is_required(&self) -> bool {
        self.require
            .unwrap_or(self.kind == ArgumentKind::Positional)
    }

    /// Overflow and transfer always collect; named only when asked to.
    pub fn is_collectable(&self) -> bool {
        match self.kind {
            ArgumentKind::Overflow | ArgumentKind::Transfer => true,
            ArgumentKind::Named => self.collect_multiple,
            _ => false,
        }
    }

    pub fn assigns_to_parent(&self) -> bool {
        !self.do_not_assign_to_parent
    }

    pub fn is_storable(&self) -> bool {
        self.can_be_stored
    }

    /// True if the last reset found the variable in the environment.
    pub fn read_env_from_process(&self) -> bool {
        self.read_env_from_process
    }

    /// True if the environment was written since the last reset.
    pub fn env_has_been_updated(&self) -> bool {
        self.env_has_been_updated
    }

    /// The bound variable's current value, if any.
    pub fn env_value(&self, env: &dyn Environment) -> Option<String> {
        self.environment_variable
            .as_deref()
            .and_then(|key| env.get(key))
    }

    /// True if `name` is the canonical name or matches any alias.
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a.is_match(name))
    }

    // === State machine ===

    /// Start a new assignment cycle.
    ///
    /// The environment value, when present, replaces the default. With no
    /// value from either source the argument is left `Skipped`, so required
    /// arguments stay unsatisfied until a token arrives. Collected arguments
    /// always start from a list, empty when nothing was supplied.
    pub async fn reset(&mut self, env: &dyn Environment) {
        self.env_has_been_updated = false;
        self.state = AssignmentState::Unset;

        let env_value = self.env_value(env);
        self.read_env_from_process = env_value.is_some();
        if let Some(text) = env_value {
            self.default = env_string_to_value(&text, &self.default, self.is_collectable());
        }

        self.value = Value::Null;
        if self.default.is_null() {
            if self.is_collectable() {
                self.value = Value::Array(Vec::new());
            } else if self.kind == ArgumentKind::Flag && self.parser.is_none() {
                self.value = Value::Bool(false);
            }
            // Nothing was supplied, so nothing is exported.
            self.clear_env(env);
            self.state = AssignmentState::Skipped;
            return;
        }

        let default = self.default.clone();
        self.assign(default, env).await;
    }

    /// Bind a value. Always ends `Assigned` or `Errored`.
    ///
    /// A failing transform keeps the previously bound value.
    pub async fn assign(&mut self, value: Value, env: &dyn Environment) {
        let mut error = None;

        match self.kind {
            ArgumentKind::Flag => {
                self.value = match &self.parser {
                    Some(parser) => match parser.parse(value).await {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            error = Some(e);
                            self.value.clone()
                        }
                    },
                    None => Value::Bool(is_truthy(&value)),
                };
            }
            _ if self.is_collectable() => match value {
                Value::Array(_) => self.value = value,
                Value::Null => {}
                single => match self.run_parser(single).await {
                    Ok(parsed) => {
                        if !self.value.is_array() {
                            self.value = Value::Array(Vec::new());
                        }
                        if let Value::Array(items) = &mut self.value {
                            items.push(parsed);
                        }
                    }
                    Err(e) => error = Some(e),
                },
            },
            _ => match self.run_parser(value).await {
                Ok(parsed) => self.value = parsed,
                Err(e) => error = Some(e),
            },
        }

        self.set_value_to_env(env);
        self.state = match error {
            Some(message) => AssignmentState::Errored(message),
            None => AssignmentState::Assigned,
        };
    }

    async fn run_parser(&self, value: Value) -> Result<Value, String> {
        match &self.parser {
            Some(parser) => parser.parse(value).await,
            None => Ok(value),
        }
    }

    /// Mirror the effective value into the bound variable; null deletes it.
    fn set_value_to_env(&mut self, env: &dyn Environment) {
        if self.do_not_assign_to_env {
            return;
        }
        let Some(key) = self.environment_variable.as_deref() else {
            return;
        };
        let effective = if self.value.is_null() {
            &self.default
        } else {
            &self.value
        };
        if effective.is_null() {
            env.remove(key);
        } else {
            env.set(key, &value_to_env_string(effective));
        }
        self.env_has_been_updated = true;
    }

    fn clear_env(&mut self, env: &dyn Environment) {
        if self.do_not_assign_to_env {
            return;
        }
        if let Some(key) = self.environment_variable.as_deref() {
            env.remove(key);
            self.env_has_been_updated = true;
        }
    }
}
