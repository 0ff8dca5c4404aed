//! Help rendering.
//!
//! The engine hands a [`HelpContext`] to a [`HelpRenderer`]. The default
//! [`PlainHelpRenderer`] prints, in order:
//!
//! ```text
//! Usage  app do something <what> {...rest} -- {...passthrough}
//!   description
//!
//! Commands    sub-commands with their descriptions
//! Input       positional, overflow and transfer arguments
//! Args        named arguments with every alias
//! Flags       flags with every alias
//! Envs        bound environment variables (+ set, - unset)
//! Example
//! ```
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::BTreeMap;

use serde_json::Value;

use crate::argument::{Argument, ArgumentKind};
use crate::colors::Painter;
use crate::command::CommandSpec;
use crate::environment::Environment;
use crate::report::{painted_aliases, painted_label, render_columns};

/// Everything a renderer may need about one command.
pub struct HelpContext<'a> {
    /// Program name from the settings
    pub program: &'a str,
    /// Normalized command path
    pub command: &'a str,
    pub spec: &'a CommandSpec,
    /// Arguments offered on the command line: the command's own, inherited
    /// ancestor options and the reserved flags
    pub arguments: &'a [Argument],
    /// Direct sub-commands, in table order
    pub sub_commands: Vec<(&'a str, &'a CommandSpec)>,
    pub environment: &'a dyn Environment,
    pub painter: Painter,
}

impl HelpContext<'_> {
    pub fn of_kind(&self, kind: ArgumentKind) -> impl Iterator<Item = &Argument> {
        self.arguments.iter().filter(move |a| a.kind() == kind)
    }
}

pub trait HelpRenderer: Send + Sync {
    fn render(&self, ctx: &HelpContext<'_>) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHelpRenderer;

fn format_topic(topic: &str, painter: &Painter) -> String {
    let mut chars = topic.chars();
    let topic = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::from("--"),
    };
    painter.topic(&topic)
}

fn indent(text: &str, count: usize) -> String {
    let spaces = " ".repeat(count);
    text.lines()
        .map(|line| format!("{spaces}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn current_value(arg: &Argument) -> Option<String> {
    let value = if arg.value().is_null() {
        arg.current_default()
    } else {
        arg.value()
    };
    match value {
        Value::Null => None,
        Value::Bool(false) if arg.kind() == ArgumentKind::Flag => None,
        Value::Array(items) if items.is_empty() => None,
        Value::String(s) => Some(format!("[{s}]")),
        other => Some(format!("[{other}]")),
    }
}

impl PlainHelpRenderer {
    fn usage(&self, ctx: &HelpContext<'_>) -> String {
        let p = &ctx.painter;
        let mut parts: Vec<String> = Vec::new();
        if !ctx.program.trim().is_empty() {
            parts.push(ctx.program.trim().to_string());
        }
        if !ctx.command.is_empty() {
            parts.push(p.command(ctx.command));
        }
        parts.extend(ctx.of_kind(ArgumentKind::Positional).map(|a| painted_label(a, p)));
        if let Some(overflow) = ctx.of_kind(ArgumentKind::Overflow).next() {
            parts.push(painted_label(overflow, p));
        }
        if let Some(transfer) = ctx.of_kind(ArgumentKind::Transfer).next() {
            parts.push("--".to_string());
            parts.push(painted_label(transfer, p));
        }
        format!("{} {}", format_topic("usage", p), parts.join(" "))
    }

    fn argument_rows(&self, args: &[&Argument], all_aliases: bool, p: &Painter) -> String {
        let rows: Vec<Vec<String>> = args
            .iter()
            .map(|arg| {
                vec![
                    if all_aliases {
                        painted_aliases(arg, p)
                    } else {
                        painted_label(arg, p)
                    },
                    if arg.is_required() {
                        p.error("*")
                    } else {
                        String::new()
                    },
                    arg.description_text().unwrap_or_default().to_string(),
                    current_value(arg)
                        .map(|v| p.topic(&v))
                        .unwrap_or_default(),
                ]
            })
            .collect();
        indent(&render_columns(&rows), 2)
    }

    fn envs(&self, ctx: &HelpContext<'_>) -> Option<String> {
        let p = &ctx.painter;
        let mut by_variable: BTreeMap<&str, Vec<&Argument>> = BTreeMap::new();
        for arg in ctx.arguments {
            if let Some(variable) = arg.environment_variable() {
                by_variable.entry(variable).or_default().push(arg);
            }
        }
        if by_variable.is_empty() {
            return None;
        }

        let rows: Vec<Vec<String>> = by_variable
            .into_iter()
            .map(|(variable, args)| {
                let is_set = ctx.environment.get(variable).is_some()
                    || args.iter().any(|a| a.read_env_from_process());
                let marker = if is_set { p.ok("+") } else { p.topic("-") };
                let bound: Vec<&&Argument> =
                    args.iter().filter(|a| a.kind() != ArgumentKind::Env).collect();
                let detail = if bound.is_empty() {
                    args.iter()
                        .filter_map(|a| a.description_text())
                        .collect::<Vec<_>>()
                        .join(" and ")
                } else {
                    bound
                        .iter()
                        .map(|a| painted_label(a, p))
                        .collect::<Vec<_>>()
                        .join(" | ")
                };
                vec![
                    p.kind(variable, ArgumentKind::Env),
                    format!("<{marker}>"),
                    detail,
                ]
            })
            .collect();
        Some(indent(&render_columns(&rows), 2))
    }
}

impl HelpRenderer for PlainHelpRenderer {
    fn render(&self, ctx: &HelpContext<'_>) -> String {
        let p = &ctx.painter;
        let mut sections: Vec<String> = Vec::new();

        if let Some(prefix) = ctx.spec.help_prefix_text() {
            sections.push(prefix.to_string());
        }

        let mut head = self.usage(ctx);
        if !ctx.spec.description_text().trim().is_empty() {
            head.push('\n');
            head.push_str(&indent(ctx.spec.description_text().trim(), 2));
        }
        sections.push(head);

        if !ctx.sub_commands.is_empty() {
            let rows: Vec<Vec<String>> = ctx
                .sub_commands
                .iter()
                .map(|(path, spec)| {
                    let word = path.rsplit(' ').next().unwrap_or(*path);
                    let word = if spec.has_action() {
                        p.command(word)
                    } else {
                        p.menu(word)
                    };
                    vec![word, spec.description_text().to_string()]
                })
                .collect();
            sections.push(format!(
                "{}\n{}",
                format_topic("commands", p),
                indent(&render_columns(&rows), 2)
            ));
        }

        let input: Vec<&Argument> = ctx
            .of_kind(ArgumentKind::Overflow)
            .take(1)
            .chain(ctx.of_kind(ArgumentKind::Transfer).take(1))
            .chain(ctx.of_kind(ArgumentKind::Positional))
            .collect();
        for (topic, args, all_aliases) in [
            ("input", input, false),
            ("args", ctx.of_kind(ArgumentKind::Named).collect(), true),
            ("flags", ctx.of_kind(ArgumentKind::Flag).collect(), true),
        ] {
            if !args.is_empty() {
                sections.push(format!(
                    "{}\n{}",
                    format_topic(topic, p),
                    self.argument_rows(&args, all_aliases, p)
                ));
            }
        }

        if let Some(envs) = self.envs(ctx) {
            sections.push(format!("{}\n{}", format_topic("envs", p), envs));
        }

        if let Some(example) = ctx.spec.example_text().filter(|e| !e.trim().is_empty()) {
            sections.push(format!(
                "{}\n{}",
                format_topic("example", p),
                indent(example.trim(), 2)
            ));
        }

        if let Some(suffix) = ctx.spec.help_suffix_text() {
            sections.push(suffix.to_string());
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnv;

    fn render(command: &str, spec: &CommandSpec, subs: Vec<(&str, &CommandSpec)>) -> String {
        let env = MemoryEnv::with_vars([("APP_TOKEN", "x")]);
        let ctx = HelpContext {
            program: "app",
            command,
            spec,
            arguments: spec.argument_list(),
            sub_commands: subs,
            environment: &env,
            painter: Painter::plain(),
        };
        PlainHelpRenderer.render(&ctx)
    }

    #[test]
    fn test_usage_line() {
        let spec = CommandSpec::new().arguments([
            Argument::positional("what"),
            Argument::overflow("rest"),
            Argument::transfer("passthrough"),
        ]);
        let text = render("do something", &spec, Vec::new());
        assert!(
            text.starts_with("Usage app do something <what> {...rest} -- {...passthrough}"),
            "{text}"
        );
        assert!(text.contains("Input"));
    }

    #[test]
    fn test_sections() {
        let child = CommandSpec::new().description("Initialize").run(|_| Ok(()));
        let spec = CommandSpec::new()
            .description("Root menu")
            .example("app init")
            .arguments([
                Argument::named("to_do").alias("t").description("What to do"),
                Argument::flag("verbose").alias("v"),
                Argument::named("token").env_var("APP_TOKEN"),
                Argument::env("APP_HOME").description("Home dir"),
            ]);
        let text = render("", &spec, vec![("init", &child)]);

        assert!(text.contains("Root menu"));
        assert!(text.contains("Commands\n  init  Initialize"));
        assert!(text.contains("--to-do | -t"));
        assert!(text.contains("What to do"));
        assert!(text.contains("--verbose | -v"));
        assert!(text.contains("APP_TOKEN  <+>  --token"));
        assert!(text.contains("APP_HOME   <->  Home dir"));
        assert!(text.contains("Example\n  app init"));
    }

    #[test]
    fn test_format_topic() {
        assert_eq!(format_topic("ARGS", &Painter::plain()), "Args");
        assert_eq!(format_topic("", &Painter::plain()), "--");
    }
}
