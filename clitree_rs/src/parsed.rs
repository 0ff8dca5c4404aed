//! ParsedArgs - the bound result of one successful invocation.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::argument::{Argument, ArgumentKind, AssignmentState};

/// Per-argument result of an invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentOutcome {
    pub field: String,
    pub name: String,
    pub kind: ArgumentKind,
    pub value: Value,
    pub state: AssignmentState,
}

impl From<&Argument> for ArgumentOutcome {
    fn from(arg: &Argument) -> Self {
        Self {
            field: arg.field_name().to_string(),
            name: arg.canonical_name().to_string(),
            kind: arg.kind(),
            value: arg.value().clone(),
            state: arg.state().clone(),
        }
    }
}

/// Arguments bound for a resolved command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedArgs {
    /// The resolved command path (`""` for the root command)
    pub command: String,

    /// Field name to bound value
    pub values: Map<String, Value>,

    /// Every argument that took part, including environment-bound arguments
    /// of other commands
    pub arguments: Vec<ArgumentOutcome>,

    /// Positional tokens beyond the declared positionals
    pub overflow: Vec<String>,

    /// Tokens after `--`
    pub transfer: Vec<String>,
}

impl ParsedArgs {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> bool {
        self.get(field).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String items of a collected value.
    pub fn get_list(&self, field: &str) -> Vec<&str> {
        match self.get(field) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Bind the field map onto a typed struct.
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.values.clone()))
    }

    pub fn outcome(&self, field: &str) -> Option<&ArgumentOutcome> {
        self.arguments.iter().find(|a| a.field == field)
    }
}
