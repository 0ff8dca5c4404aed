//! Build arguments from a JSON object.
//!
//! Two shapes are accepted:
//!
//! ```json
//! { "to_do": { "type": "named", "aliases": ["t"] }, "count": 3 }
//! ```
//!
//! Every field is an argument. An object value is a descriptor; any other
//! value becomes the default of a named argument.
//!
//! ```json
//! { "lama": "asd", "__$lama": { "type": "named", "environment_variable": "LAMA" } }
//! ```
//!
//! Once any key carries the `__$` marker, only marked keys are arguments.
//! The unmarked field of the same name, when set, supplies the default.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::argument::{Argument, ArgumentKind};
use crate::error::CliError;

pub const ARGUMENT_MARKER: &str = "__$";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum Aliases {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Aliases {
    fn into_vec(self) -> Vec<String> {
        match self {
            Aliases::None => Vec::new(),
            Aliases::One(alias) => vec![alias],
            Aliases::Many(aliases) => aliases,
        }
    }
}

/// Declarative form of one argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArgumentDescriptor {
    #[serde(rename = "type")]
    pub kind: Option<ArgumentKind>,
    pub name: Option<String>,
    aliases: Aliases,
    pub default: Value,
    #[serde(alias = "env", alias = "environmentVariable")]
    pub environment_variable: Option<String>,
    pub require: Option<bool>,
    #[serde(alias = "collectMultiple")]
    pub collect_multiple: bool,
    pub description: Option<String>,
    #[serde(alias = "doNotAssignToParent")]
    pub do_not_assign_to_parent: bool,
    #[serde(alias = "doNotAssignToEnv")]
    pub do_not_assign_to_env: bool,
    #[serde(alias = "canBeStored")]
    pub can_be_stored: Option<bool>,
}

impl ArgumentDescriptor {
    pub fn into_argument(self, field_name: &str) -> Argument {
        let mut arg = Argument::new(field_name, self.kind.unwrap_or(ArgumentKind::Named));
        if let Some(name) = self.name {
            arg = arg.name(name);
        }
        let aliases = self.aliases.into_vec();
        arg = arg.aliases(aliases.iter().map(String::as_str));
        if !self.default.is_null() {
            arg = arg.default_value(self.default);
        }
        if let Some(variable) = self.environment_variable {
            arg = arg.env_var(variable);
        }
        if let Some(require) = self.require {
            arg = arg.required(require);
        }
        if let Some(description) = self.description {
            arg = arg.description(description);
        }
        if self.do_not_assign_to_parent {
            arg = arg.do_not_assign_to_parent();
        }
        if self.do_not_assign_to_env {
            arg = arg.do_not_assign_to_env();
        }
        arg.collect_multiple(self.collect_multiple)
            .can_be_stored(self.can_be_stored.unwrap_or(true))
    }
}

fn descriptor_of(field: &str, value: &Value) -> Result<ArgumentDescriptor, CliError> {
    ArgumentDescriptor::deserialize(value).map_err(|e| CliError::InvalidDescriptor {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn marked_arguments(obj: &Map<String, Value>) -> Result<Vec<Argument>, CliError> {
    let mut arguments = Vec::new();
    for (key, value) in obj {
        let Some(field) = key.strip_prefix(ARGUMENT_MARKER) else {
            continue;
        };
        if field.is_empty() {
            return Err(CliError::InvalidDescriptor {
                field: key.clone(),
                reason: format!("marked properties must have a name, i.e. {ARGUMENT_MARKER}my_prop"),
            });
        }
        let mut descriptor = descriptor_of(field, value)?;
        if let Some(default) = obj.get(field).filter(|v| !v.is_null()) {
            descriptor.default = default.clone();
        }
        arguments.push(descriptor.into_argument(field));
    }
    Ok(arguments)
}

/// Derive argument templates from the fields of a JSON object.
///
/// `null` yields no arguments; any other non-object is rejected.
pub fn arguments_from_object(value: &Value) -> Result<Vec<Argument>, CliError> {
    let obj = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(obj) => obj,
        other => {
            return Err(CliError::InvalidDescriptor {
                field: String::new(),
                reason: format!("cannot read arguments from a non object value: {other}"),
            });
        }
    };

    if obj.keys().any(|k| k.starts_with(ARGUMENT_MARKER)) {
        return marked_arguments(obj);
    }

    obj.iter()
        .map(|(field, value)| match value {
            Value::Object(_) => Ok(descriptor_of(field, value)?.into_argument(field)),
            scalar => Ok(Argument::named(field.as_str()).default_value(scalar.clone())),
        })
        .collect()
}
