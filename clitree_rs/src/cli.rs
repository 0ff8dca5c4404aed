//! The command tree handle and the parse orchestrator.
//!
//! Every [`Cli`] handle shares one context (settings, command table,
//! observers, help renderer, environment). Handles obtained through
//! [`Cli::get`] or [`Cli::command`] prefix every path they touch.
//!
//! One `parse` call runs:
//!
//! ```text
//!   resolve ──► reset ──► assign ──► validate ──┬─► invoke
//!      │                                        ├─► help
//!      └─► not found                            └─► failure report
//! ```
//!
//! Argument templates are never mutated by a parse: each call clones the
//! templates it needs into a working set and drives the copies.
//!
//! Vibecrafted with AI Agents by VetCoders (c)2025 The Loctree Team

use std::collections::HashSet;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::argument::{Argument, ArgumentKind};
use crate::argv::{IntoArgv, command_words};
use crate::assign::{UnknownName, plan_assignments};
use crate::colors::Painter;
use crate::command::{Action, CommandSpec, CommandTable, clean_command, normalize_command};
use crate::environment::{Environment, ProcessEnv};
use crate::error::{ArgumentIssue, CliError};
use crate::help::{HelpContext, HelpRenderer, PlainHelpRenderer};
use crate::hooks::CliObserver;
use crate::options::{CliSettings, ParseOptions};
use crate::parsed::{ArgumentOutcome, ParsedArgs};
use crate::report::{argument_errors_table, not_found_text, unknown_tokens_table};
use crate::resolver::{Resolution, resolve};
use crate::suggest::{DEFAULT_MAX_DISTANCE, suggest};

/// Validation failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub command: String,
    pub issues: Vec<ArgumentIssue>,
    /// Rendered report (error tables and, if asked, help)
    pub text: String,
    /// Status the caller should exit with, if any
    pub exit_code: Option<i32>,
}

/// No registered command matched.
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundReport {
    pub argv: Vec<String>,
    /// The tokens that could be command words, joined
    pub words: String,
    pub suggestions: Vec<String>,
    pub text: String,
    pub exit_code: Option<i32>,
}

/// What one parse call ended with.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// The action ran and returned `Ok`.
    Invoked(ParsedArgs),
    /// Arguments are valid; nothing was invoked.
    Parsed(ParsedArgs),
    /// Help was rendered instead of invoking.
    Help {
        command: String,
        text: String,
        issues: Vec<ArgumentIssue>,
    },
    Failed(FailureReport),
    CommandNotFound(NotFoundReport),
}

impl ParseOutcome {
    /// Exit status to signal, for failures configured with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ParseOutcome::Failed(report) => report.exit_code,
            ParseOutcome::CommandNotFound(report) => report.exit_code,
            _ => None,
        }
    }

    pub fn args(&self) -> Option<&ParsedArgs> {
        match self {
            ParseOutcome::Invoked(args) | ParseOutcome::Parsed(args) => Some(args),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Invoked(_) | ParseOutcome::Parsed(_))
    }

    /// Print the rendered text: help to stdout, reports to stderr.
    pub fn emit(&self) {
        match self {
            ParseOutcome::Help { text, .. } => println!("{text}"),
            ParseOutcome::Failed(FailureReport { text, .. })
            | ParseOutcome::CommandNotFound(NotFoundReport { text, .. }) => {
                if !text.is_empty() {
                    eprintln!("{text}");
                }
            }
            ParseOutcome::Invoked(_) | ParseOutcome::Parsed(_) => {}
        }
    }
}

struct CliContext {
    settings: CliSettings,
    table: CommandTable,
    observers: Vec<Arc<dyn CliObserver>>,
    help_renderer: Arc<dyn HelpRenderer>,
    environment: Arc<dyn Environment>,
}

/// Indices of the reserved flags inside a working set.
#[derive(Debug, Default, Clone, Copy)]
struct ReservedFlags {
    help: Option<usize>,
    no_color: Option<usize>,
    help_all: Option<usize>,
}

/// The arguments offered on the command line for one resolved command.
///
/// Layout: own arguments, then inherited ancestor options, then the
/// reserved flags.
struct WorkingSet {
    arguments: Vec<Argument>,
    inherited: Range<usize>,
    reserved: ReservedFlags,
    /// (command path, argument index) of every template in the set
    origins: HashSet<(String, usize)>,
}

impl WorkingSet {
    fn build(settings: &CliSettings, resolution: &Resolution, include_parents: bool) -> Self {
        let mut arguments: Vec<Argument> = resolution.command.argument_list().to_vec();
        let mut origins: HashSet<(String, usize)> = (0..arguments.len())
            .map(|i| (resolution.path.clone(), i))
            .collect();

        let start = arguments.len();
        if include_parents && resolution.command.inherits_parent_named_options() {
            for (path, spec) in &resolution.ancestors {
                if !spec.inherits_parent_named_options() {
                    break;
                }
                for (i, arg) in spec.argument_list().iter().enumerate() {
                    if arg.kind() == ArgumentKind::Named {
                        origins.insert((path.clone(), i));
                        arguments.push(arg.clone());
                    }
                }
            }
        }
        let inherited = start..arguments.len();

        let mut reserved = ReservedFlags::default();
        let push_reserved = |arguments: &mut Vec<Argument>, arg: Argument| {
            arguments.push(arg.do_not_assign_to_parent().can_be_stored(false));
            Some(arguments.len() - 1)
        };
        if settings.catch_help_markers {
            reserved.help = push_reserved(
                &mut arguments,
                Argument::flag("help")
                    .alias("h")
                    .description("Show this help menu"),
            );
        }
        if settings.catch_no_color_marker {
            reserved.no_color = push_reserved(
                &mut arguments,
                Argument::flag("no_color").description("Disable colors in the app"),
            );
        }
        if settings.hide_parent_command_options_on_help {
            reserved.help_all = push_reserved(
                &mut arguments,
                Argument::flag("help_all").description("Show all options help menu"),
            );
        }

        Self {
            arguments,
            inherited,
            reserved,
            origins,
        }
    }

    /// Arguments shown in help, optionally without the inherited ones.
    fn help_arguments(arena: &[Argument], inherited: &Range<usize>, show_parents: bool) -> Vec<Argument> {
        arena
            .iter()
            .enumerate()
            .filter(|(i, _)| show_parents || !inherited.contains(i))
            .map(|(_, a)| a.clone())
            .collect()
    }
}

/// Environment-bound templates that are not part of the working set.
fn external_env_arguments(table: &CommandTable, origins: &HashSet<(String, usize)>) -> Vec<Argument> {
    table
        .iter()
        .flat_map(|(path, spec)| {
            spec.argument_list()
                .iter()
                .enumerate()
                .filter(move |(i, arg)| {
                    arg.environment_variable().is_some()
                        && !origins.contains(&(path.to_string(), *i))
                })
                .map(|(_, arg)| arg.clone())
        })
        .collect()
}

fn flag_is_set(arena: &[Argument], index: Option<usize>) -> bool {
    index.is_some_and(|i| arena[i].value() == &Value::Bool(true))
}

fn collect_issues(
    errored: &[&Argument],
    unknown: &[UnknownName],
    unclaimed: &[String],
) -> Vec<ArgumentIssue> {
    let mut issues: Vec<ArgumentIssue> = errored
        .iter()
        .map(|arg| match arg.state().error() {
            Some(message) => ArgumentIssue::ParseError {
                field: arg.field_name().to_string(),
                name: arg.canonical_name().to_string(),
                kind: arg.kind(),
                message: message.to_string(),
            },
            None => ArgumentIssue::RequiredMissing {
                field: arg.field_name().to_string(),
                name: arg.canonical_name().to_string(),
                kind: arg.kind(),
            },
        })
        .collect();
    issues.extend(unclaimed.iter().map(|token| ArgumentIssue::UnexpectedPositional {
        token: token.clone(),
    }));
    issues.extend(unknown.iter().map(|u| ArgumentIssue::UnknownToken {
        token: u.token.clone(),
        name: u.name.clone(),
    }));
    issues
}

/// A handle on a command tree, scoped to a path prefix.
#[derive(Clone)]
pub struct Cli {
    context: Arc<RwLock<CliContext>>,
    prefix: String,
}

impl Cli {
    /// A new, empty command tree.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(CliSettings::named(name))
    }

    pub fn with_settings(settings: CliSettings) -> Self {
        Self {
            context: Arc::new(RwLock::new(CliContext {
                settings,
                table: CommandTable::new(),
                observers: Vec::new(),
                help_renderer: Arc::new(PlainHelpRenderer),
                environment: Arc::new(ProcessEnv),
            })),
            prefix: String::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CliContext> {
        self.context.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CliContext> {
        self.context.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn observers(&self) -> Vec<Arc<dyn CliObserver>> {
        self.read().observers.clone()
    }

    /// Validate `path` and join it onto this handle's prefix.
    fn compose(&self, path: &str) -> Result<String, CliError> {
        let path = normalize_command(path)?;
        Ok(clean_command(&format!("{} {}", self.prefix, path)))
    }

    /// The path prefix of this handle (`""` for the root handle).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn settings(&self) -> CliSettings {
        self.read().settings.clone()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut CliSettings)) {
        f(&mut self.write().settings);
    }

    pub fn observe(&self, observer: impl CliObserver + 'static) {
        self.write().observers.push(Arc::new(observer));
    }

    pub fn set_help_renderer(&self, renderer: impl HelpRenderer + 'static) {
        self.write().help_renderer = Arc::new(renderer);
    }

    /// Replace the environment arguments read from and mirror into.
    pub fn set_environment(&self, environment: Arc<dyn Environment>) {
        self.write().environment = environment;
    }

    // === Registration ===

    /// Add or replace the command at `path` (relative to this handle).
    pub fn set(&self, path: &str, spec: CommandSpec) -> Result<&Self, CliError> {
        let full = self.compose(path)?;
        let stored = self.write().table.insert(&full, spec)?;
        for observer in self.observers() {
            observer.command_added(&stored);
        }
        Ok(self)
    }

    /// A handle scoped to `path`.
    pub fn get(&self, path: &str) -> Result<Cli, CliError> {
        Ok(Cli {
            context: Arc::clone(&self.context),
            prefix: self.compose(path)?,
        })
    }

    /// Register `path` and return a handle scoped to it.
    pub fn command(&self, path: &str, spec: CommandSpec) -> Result<Cli, CliError> {
        self.set(path, spec)?;
        self.get(path)
    }

    /// Register `path` with `action` attached.
    pub fn on(&self, path: &str, action: Action, spec: CommandSpec) -> Result<&Self, CliError> {
        self.set(path, spec.action(action))
    }

    /// Set the action of this handle's own command, creating it if needed.
    pub fn default_action(
        &self,
        action: Action,
        arguments: impl IntoIterator<Item = Argument>,
    ) -> Result<&Self, CliError> {
        let existing = self.read().table.get(&self.prefix)?.cloned();
        let spec = existing.unwrap_or_default().action(action).arguments(arguments);
        self.set("", spec)
    }

    /// Append arguments to the command at `path`, creating it if needed.
    pub fn extend_arguments(
        &self,
        path: &str,
        arguments: impl IntoIterator<Item = Argument>,
    ) -> Result<&Self, CliError> {
        let full = self.compose(path)?;
        let existing = self.read().table.get(&full)?.cloned();
        let spec = existing.unwrap_or_default().arguments(arguments);
        self.set(path, spec)
    }

    /// Argument templates of the command at `path`.
    pub fn arguments(&self, path: &str) -> Result<Vec<Argument>, CliError> {
        let full = self.compose(path)?;
        Ok(self
            .read()
            .table
            .get(&full)?
            .map(|spec| spec.argument_list().to_vec())
            .unwrap_or_default())
    }

    pub fn remove(&self, path: &str) -> Result<Option<CommandSpec>, CliError> {
        let full = self.compose(path)?;
        self.write().table.remove(&full)
    }

    /// Every registered path, in registration order.
    pub fn commands(&self) -> Vec<String> {
        self.read().table.paths().map(String::from).collect()
    }

    pub fn sub_commands(&self, path: &str) -> Result<Vec<String>, CliError> {
        let full = self.compose(path)?;
        Ok(self
            .read()
            .table
            .sub_commands(&full)
            .into_iter()
            .map(String::from)
            .collect())
    }

    pub fn suggestions(&self, command: &str, max_distance: usize) -> Vec<String> {
        let ctx = self.read();
        suggest(command, ctx.table.paths(), max_distance)
    }

    /// Resolve an argv without binding anything.
    pub fn resolve(&self, argv: impl IntoArgv) -> Option<Resolution> {
        let ctx = self.read();
        resolve(&ctx.table, &argv.into_argv(), ctx.settings.max_command_variants)
    }

    // === Help ===

    fn render_help(
        &self,
        path: &str,
        spec: &CommandSpec,
        arguments: &[Argument],
        painter: Painter,
    ) -> String {
        let ctx = self.read();
        let sub_commands = ctx
            .table
            .sub_commands(path)
            .into_iter()
            .filter_map(|p| ctx.table.get(p).ok().flatten().map(|s| (p, s)))
            .collect();
        let help = HelpContext {
            program: &ctx.settings.name,
            command: path,
            spec,
            arguments,
            sub_commands,
            environment: ctx.environment.as_ref(),
            painter,
        };
        ctx.help_renderer.render(&help)
    }

    /// Help for the command `path` resolves to.
    pub fn help_text(&self, path: &str, show_parent_options: bool) -> Result<String, CliError> {
        let full = self.compose(path)?;
        let argv: Vec<String> = full.split_whitespace().map(String::from).collect();
        let (settings, resolution) = {
            let ctx = self.read();
            (
                ctx.settings.clone(),
                resolve(&ctx.table, &argv, ctx.settings.max_command_variants),
            )
        };
        let painter = Painter::new(settings.color);

        Ok(match resolution {
            Some(resolution) => {
                let working = WorkingSet::build(&settings, &resolution, show_parent_options);
                self.render_help(&resolution.path, &resolution.command, &working.arguments, painter)
            }
            None => self.render_help(&full, &CommandSpec::new(), &[], painter),
        })
    }

    /// Print help for `path` to stdout.
    ///
    /// Inherited options are listed unless the settings hide them and the
    /// process was not started with `--help-all`.
    pub fn show_help(&self, path: &str) -> Result<String, CliError> {
        let show_parents = !self.read().settings.hide_parent_command_options_on_help
            || std::env::args().any(|a| a == "--help-all");
        let text = self.help_text(path, show_parents)?;
        let command = self.compose(path)?;
        for observer in self.observers() {
            observer.help(&command, &text);
        }
        println!("{text}");
        Ok(text)
    }

    // === Parsing ===

    fn command_not_found(
        &self,
        argv: Vec<String>,
        options: &ParseOptions,
        settings: &CliSettings,
    ) -> Result<ParseOutcome, CliError> {
        let words = command_words(&argv);
        tracing::debug!(words = %words, "command not found");

        let painter = if argv.iter().any(|a| a == "--no-color") {
            Painter::plain()
        } else {
            Painter::new(settings.color)
        };

        let mut sections = Vec::new();
        if options.show_help_on_error {
            sections.push(self.help_text("", true)?);
        }

        let suggestions = if options.show_did_you_mean {
            self.suggestions(&words, DEFAULT_MAX_DISTANCE)
        } else {
            Vec::new()
        };
        let text = not_found_text(
            &settings.name,
            &words,
            suggestions.first().map(String::as_str),
            options.show_errors,
            &painter,
        );
        if !text.is_empty() {
            sections.push(text);
        }

        if options.throw_command_not_found_error {
            return Err(CliError::CommandNotFound { argv });
        }

        Ok(ParseOutcome::CommandNotFound(NotFoundReport {
            argv,
            words,
            suggestions,
            text: sections.join("\n\n"),
            exit_code: options.exit_code(),
        }))
    }

    /// Resolve, bind, validate and (optionally) invoke.
    ///
    /// Validation problems come back as [`ParseOutcome::Failed`]; only
    /// configured throws and action failures are `Err`.
    pub async fn parse(
        &self,
        argv: impl IntoArgv,
        options: &ParseOptions,
    ) -> Result<ParseOutcome, CliError> {
        let mut argv = argv.into_argv();
        if !self.prefix.is_empty() {
            let mut scoped: Vec<String> = self.prefix.split(' ').map(String::from).collect();
            scoped.append(&mut argv);
            argv = scoped;
        }

        let observers = self.observers();
        for observer in &observers {
            observer.pre_parse(&argv);
        }

        let (settings, environment, resolution) = {
            let ctx = self.read();
            (
                ctx.settings.clone(),
                Arc::clone(&ctx.environment),
                resolve(&ctx.table, &argv, ctx.settings.max_command_variants),
            )
        };
        let Some(resolution) = resolution else {
            return self.command_not_found(argv, options, &settings);
        };

        let working = WorkingSet::build(&settings, &resolution, true);
        let active_len = working.arguments.len();
        let mut arena = working.arguments;
        {
            let ctx = self.read();
            arena.extend(external_env_arguments(&ctx.table, &working.origins));
        }

        for arg in arena.iter_mut() {
            arg.reset(environment.as_ref()).await;
        }
        tracing::debug!(
            command = %resolution.path,
            active = active_len,
            external = arena.len() - active_len,
            "arguments reset"
        );

        let plan = plan_assignments(&arena[..active_len], &resolution.residual);
        for assignment in &plan.assignments {
            arena[assignment.index]
                .assign(assignment.value.clone(), environment.as_ref())
                .await;
        }
        tracing::debug!(
            assignments = plan.assignments.len(),
            overflow = plan.overflow.len(),
            transfer = plan.transfer.len(),
            unknown = plan.unknown_names.len(),
            "arguments assigned"
        );

        let has_overflow_sink = arena[..active_len]
            .iter()
            .any(|a| a.kind() == ArgumentKind::Overflow);
        let unclaimed: &[String] = if options.strict && !has_overflow_sink {
            &plan.overflow
        } else {
            &[]
        };
        let unknown: &[UnknownName] = if options.strict {
            plan.unknown_names.as_slice()
        } else {
            &[]
        };
        let errored: Vec<&Argument> = arena
            .iter()
            .filter(|a| !a.state().is_assigned() && (a.is_required() || a.state().error().is_some()))
            .collect();
        let issues = collect_issues(&errored, unknown, unclaimed);
        let has_errors = !issues.is_empty();

        let help_all = flag_is_set(&arena, working.reserved.help_all);
        let help_requested = flag_is_set(&arena, working.reserved.help) || help_all;
        let painter = if flag_is_set(&arena, working.reserved.no_color) {
            Painter::plain()
        } else {
            Painter::new(settings.color)
        };

        tracing::debug!(
            command = %resolution.path,
            issues = issues.len(),
            help = help_requested,
            "arguments validated"
        );

        let show_the_help = options.show_help
            && (help_requested
                || (!resolution.command.has_action() && options.show_help_on_menu && !has_errors));

        if show_the_help || has_errors {
            let show_errors_with_help =
                options.show_help && options.show_errors_on_help && help_requested;
            let mut sections = Vec::new();

            if show_the_help || options.show_help_on_error {
                let show_parents = !settings.hide_parent_command_options_on_help || help_all;
                let help_args =
                    WorkingSet::help_arguments(&arena[..active_len], &working.inherited, show_parents);
                let text =
                    self.render_help(&resolution.path, &resolution.command, &help_args, painter);
                for observer in &observers {
                    observer.help(&resolution.path, &text);
                }
                sections.push(text);
            }

            if options.show_errors && (!help_requested || show_errors_with_help) {
                if !errored.is_empty() {
                    sections.push(argument_errors_table(&errored, &painter));
                }
                if !unclaimed.is_empty() || !unknown.is_empty() {
                    sections.push(unknown_tokens_table(unclaimed, unknown, &painter));
                }
            }

            // Unclaimed words under a root command are usually a mistyped command.
            if !show_the_help && options.show_did_you_mean && !unclaimed.is_empty() {
                let words = command_words(&argv);
                if let Some(best) = self.suggestions(&words, DEFAULT_MAX_DISTANCE).first() {
                    sections.push(not_found_text(&settings.name, &words, Some(best), false, &painter));
                }
            }

            let text = sections.join("\n\n");
            return Ok(if show_the_help {
                ParseOutcome::Help {
                    command: resolution.path,
                    text,
                    issues,
                }
            } else {
                ParseOutcome::Failed(FailureReport {
                    command: resolution.path,
                    issues,
                    text,
                    exit_code: options.exit_code(),
                })
            });
        }

        let mut values = Map::new();
        for arg in arena[..active_len].iter().filter(|a| a.assigns_to_parent()) {
            values
                .entry(arg.field_name().to_string())
                .or_insert_with(|| arg.value().clone());
        }
        let parsed = ParsedArgs {
            command: resolution.path.clone(),
            values,
            arguments: arena.iter().map(ArgumentOutcome::from).collect(),
            overflow: plan.overflow,
            transfer: plan.transfer,
        };

        for observer in &observers {
            observer.parsed(&parsed);
        }

        match resolution.command.action_ref() {
            Some(action) if options.invoke => {
                for observer in &observers {
                    observer.invoke(&parsed);
                }
                action.call(parsed.clone()).await.map_err(CliError::Action)?;
                Ok(ParseOutcome::Invoked(parsed))
            }
            _ => Ok(ParseOutcome::Parsed(parsed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MemoryEnv;
    use serde_json::json;
    use std::sync::Mutex;

    fn quiet() -> ParseOptions {
        ParseOptions {
            exit_code_on_error: -1,
            ..Default::default()
        }
    }

    fn cli_with_env(env: Arc<MemoryEnv>) -> Cli {
        let cli = Cli::with_settings(CliSettings {
            name: "app".into(),
            color: crate::options::ColorMode::Never,
            ..Default::default()
        });
        cli.set_environment(env);
        cli
    }

    fn demo_tree(env: Arc<MemoryEnv>) -> Cli {
        let cli = cli_with_env(env);
        cli.set("", CommandSpec::new().description("Root menu"))
            .expect("root")
            .set(
                "do something regular",
                CommandSpec::new()
                    .arguments([
                        Argument::named("to_do").alias("t"),
                        Argument::positional("what"),
                    ])
                    .run(|_| Ok(())),
            )
            .expect("regular")
            .set("do something", CommandSpec::new())
            .expect("menu")
            .set("init", CommandSpec::new().run(|_| Ok(())))
            .expect("init");
        cli
    }

    #[tokio::test]
    async fn test_parse_invokes_longest_match() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let outcome = cli
            .parse("do something regular -t x thing", &quiet())
            .await
            .expect("parse");
        let ParseOutcome::Invoked(args) = outcome else {
            panic!("expected invocation, got {outcome:?}");
        };
        assert_eq!(args.command, "do something regular");
        assert_eq!(args.get_str("to_do"), Some("x"));
        assert_eq!(args.get_str("what"), Some("thing"));
        assert!(args.get("help").is_none());
    }

    #[tokio::test]
    async fn test_required_positional_missing() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let outcome = cli
            .parse("do something regular -t x", &quiet())
            .await
            .expect("parse");
        let ParseOutcome::Failed(report) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(
            report.issues,
            vec![ArgumentIssue::RequiredMissing {
                field: "what".into(),
                name: "what".into(),
                kind: ArgumentKind::Positional,
            }]
        );
        assert!(report.text.contains("<what>"));
        assert!(report.text.contains("required"));
        assert_eq!(report.exit_code, None);
    }

    #[tokio::test]
    async fn test_unknown_flag_is_strict_only() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let strict = cli.parse("init --nope", &quiet()).await.expect("parse");
        let ParseOutcome::Failed(report) = strict else {
            panic!("expected failure");
        };
        assert!(report.text.contains("Unknown flag or argument"));
        assert!(matches!(
            report.issues.as_slice(),
            [ArgumentIssue::UnknownToken { name, .. }] if name == "nope"
        ));

        let lenient = ParseOptions {
            strict: false,
            ..quiet()
        };
        let outcome = cli.parse("init --nope extra", &lenient).await.expect("parse");
        let ParseOutcome::Invoked(args) = outcome else {
            panic!("expected invocation");
        };
        assert_eq!(args.overflow, vec!["extra".to_string()]);
    }

    #[tokio::test]
    async fn test_menu_shows_help() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let outcome = cli.parse("do something", &quiet()).await.expect("parse");
        let ParseOutcome::Help { command, text, .. } = outcome else {
            panic!("expected help");
        };
        assert_eq!(command, "do something");
        assert!(text.contains("Usage app do something"));
        assert!(text.contains("regular"));
    }

    #[tokio::test]
    async fn test_help_flag_wins_over_errors() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let outcome = cli
            .parse("do something regular --help", &quiet())
            .await
            .expect("parse");
        let ParseOutcome::Help { text, issues, .. } = outcome else {
            panic!("expected help");
        };
        assert!(!issues.is_empty());
        assert!(!text.contains("Invalid or missing arguments"));

        let with_errors = ParseOptions {
            show_errors_on_help: true,
            ..quiet()
        };
        let outcome = cli
            .parse("do something regular -h", &with_errors)
            .await
            .expect("parse");
        let ParseOutcome::Help { text, .. } = outcome else {
            panic!("expected help");
        };
        assert!(text.contains("Invalid or missing arguments"));
    }

    #[tokio::test]
    async fn test_command_not_found() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set("init", CommandSpec::new().run(|_| Ok(()))).expect("init");
        cli.set("info", CommandSpec::new().run(|_| Ok(()))).expect("info");

        let outcome = cli.parse("int", &ParseOptions::default()).await.expect("parse");
        assert_eq!(outcome.exit_code(), Some(2));
        let ParseOutcome::CommandNotFound(report) = outcome else {
            panic!("expected not found");
        };
        assert_eq!(report.suggestions, vec!["init", "info"]);
        assert!(report.text.contains("Command 'int' not found."));
        assert!(report.text.contains("app init"));

        let throwing = ParseOptions {
            throw_command_not_found_error: true,
            ..quiet()
        };
        let err = cli.parse("int", &throwing).await.unwrap_err();
        assert!(matches!(err, CliError::CommandNotFound { .. }));
    }

    #[tokio::test]
    async fn test_action_error_propagates() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set(
            "boom",
            CommandSpec::new().run(|_| Err(anyhow::anyhow!("disk on fire"))),
        )
        .expect("boom");
        let err = cli.parse("boom", &quiet()).await.unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[tokio::test]
    async fn test_inherited_parent_options() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set("", CommandSpec::new().argument(Argument::named("profile")))
            .expect("root")
            .set("deploy", CommandSpec::new().run(|_| Ok(())))
            .expect("deploy")
            .set(
                "isolated",
                CommandSpec::new()
                    .inherit_parent_named_options(false)
                    .run(|_| Ok(())),
            )
            .expect("isolated");

        let outcome = cli.parse("deploy --profile prod", &quiet()).await.expect("parse");
        assert_eq!(
            outcome.args().and_then(|a| a.get_str("profile")),
            Some("prod")
        );

        let outcome = cli.parse("isolated --profile prod", &quiet()).await.expect("parse");
        assert!(matches!(outcome, ParseOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_external_env_argument_is_validated() {
        let env = Arc::new(MemoryEnv::new());
        let cli = cli_with_env(Arc::clone(&env));
        cli.set(
            "db",
            CommandSpec::new()
                .argument(Argument::env("DATABASE_URL").required(true))
                .run(|_| Ok(())),
        )
        .expect("db")
        .set("init", CommandSpec::new().run(|_| Ok(())))
        .expect("init");

        let outcome = cli.parse("init", &quiet()).await.expect("parse");
        let ParseOutcome::Failed(report) = outcome else {
            panic!("expected failure");
        };
        assert!(matches!(
            report.issues.as_slice(),
            [ArgumentIssue::RequiredMissing { field, .. }] if field == "DATABASE_URL"
        ));

        env.set("DATABASE_URL", "postgres://local");
        let outcome = cli.parse("init", &quiet()).await.expect("parse");
        assert!(outcome.is_success());
        let args = outcome.args().expect("args");
        assert!(args.get("DATABASE_URL").is_none());
        assert_eq!(
            args.outcome("DATABASE_URL").map(|o| o.value.clone()),
            Some(json!("postgres://local"))
        );
    }

    #[tokio::test]
    async fn test_templates_are_not_mutated() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        cli.parse("do something regular -t x thing", &quiet())
            .await
            .expect("parse");
        let templates = cli.arguments("do something regular").expect("arguments");
        assert!(templates.iter().all(|a| a.value().is_null()));
    }

    #[tokio::test]
    async fn test_child_handle_prefixes_paths() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        let remote = cli
            .command("remote", CommandSpec::new().description("Remotes"))
            .expect("remote");
        remote
            .set(
                "add",
                CommandSpec::new()
                    .argument(Argument::positional("url"))
                    .run(|_| Ok(())),
            )
            .expect("add");

        assert_eq!(cli.commands(), vec!["remote", "remote add"]);
        assert_eq!(cli.sub_commands("remote").expect("subs"), vec!["remote add"]);

        let outcome = remote.parse("add git@host", &quiet()).await.expect("parse");
        assert_eq!(
            outcome.args().and_then(|a| a.get_str("url")),
            Some("git@host")
        );
    }

    #[tokio::test]
    async fn test_default_action_and_extend() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        cli.default_action(
            Action::sync(move |args| {
                *sink.lock().unwrap() = args.get_str("name").map(String::from);
                Ok(())
            }),
            [Argument::named("name")],
        )
        .expect("default")
        .extend_arguments("", [Argument::flag("loud")])
        .expect("extend");

        assert_eq!(cli.arguments("").expect("arguments").len(), 2);
        let outcome = cli.parse("--name lama --loud", &quiet()).await.expect("parse");
        assert!(matches!(outcome, ParseOutcome::Invoked(_)));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("lama"));
    }

    #[tokio::test]
    async fn test_invoke_disabled_returns_parsed() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let options = ParseOptions {
            invoke: false,
            ..quiet()
        };
        let outcome = cli.parse("init", &options).await.expect("parse");
        assert!(matches!(outcome, ParseOutcome::Parsed(_)));
    }

    #[tokio::test]
    async fn test_observers_see_call_points() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);
        impl CliObserver for Arc<Recorder> {
            fn command_added(&self, path: &str) {
                self.0.lock().unwrap().push(format!("added:{path}"));
            }
            fn pre_parse(&self, _argv: &[String]) {
                self.0.lock().unwrap().push("pre_parse".into());
            }
            fn parsed(&self, args: &ParsedArgs) {
                self.0.lock().unwrap().push(format!("parsed:{}", args.command));
            }
            fn invoke(&self, args: &ParsedArgs) {
                self.0.lock().unwrap().push(format!("invoke:{}", args.command));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.observe(Arc::clone(&recorder));
        cli.set("init", CommandSpec::new().run(|_| Ok(()))).expect("init");
        cli.parse("init", &quiet()).await.expect("parse");

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["added:init", "pre_parse", "parsed:init", "invoke:init"]
        );
    }

    #[tokio::test]
    async fn test_empty_collected_arguments_bind_as_lists() {
        #[derive(Debug, serde::Deserialize)]
        struct RunArgs {
            rest: Vec<String>,
            passthrough: Vec<String>,
            tags: Vec<String>,
        }

        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set(
            "run",
            CommandSpec::new().arguments([
                Argument::overflow("rest"),
                Argument::transfer("passthrough"),
                Argument::named("tags").collect_multiple(true),
            ]),
        )
        .expect("run");

        let outcome = cli.parse("run", &quiet()).await.expect("parse");
        let args = outcome.args().expect("args");
        assert_eq!(args.get("rest"), Some(&json!([])));

        let bound: RunArgs = args.bind().expect("bind");
        assert!(bound.rest.is_empty());
        assert!(bound.passthrough.is_empty());
        assert!(bound.tags.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_parses_bind_the_same_values() {
        let env = Arc::new(MemoryEnv::new());
        let cli = cli_with_env(Arc::clone(&env));
        cli.set(
            "go",
            CommandSpec::new().arguments([
                Argument::named("tag").collect_multiple(true).env_var("GO_TAG"),
                Argument::named("n").env_var("GO_N").default_value(3),
            ]),
        )
        .expect("go");

        let first = cli.parse("go --tag a --tag b", &quiet()).await.expect("parse");
        let first = first.args().expect("args").values.clone();
        assert_eq!(first.get("tag"), Some(&json!(["a", "b"])));
        assert_eq!(first.get("n"), Some(&json!(3)));

        let second = cli.parse("go", &quiet()).await.expect("parse");
        assert_eq!(second.args().expect("args").values, first);
    }

    #[tokio::test]
    async fn test_every_issue_is_reported_at_once() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set(
            "deploy",
            CommandSpec::new()
                .arguments([
                    Argument::positional("target"),
                    Argument::named("region").required(true),
                    Argument::named("count").parse_with(|v: Value| {
                        v.as_str()
                            .and_then(|s| s.parse::<u32>().ok())
                            .map(Value::from)
                            .ok_or("not a number")
                    }),
                ])
                .run(|_| Ok(())),
        )
        .expect("deploy");

        let outcome = cli
            .parse("deploy prod extra --count abc --nope", &quiet())
            .await
            .expect("parse");
        let ParseOutcome::Failed(report) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(
            report.issues,
            vec![
                ArgumentIssue::RequiredMissing {
                    field: "region".into(),
                    name: "region".into(),
                    kind: ArgumentKind::Named,
                },
                ArgumentIssue::ParseError {
                    field: "count".into(),
                    name: "count".into(),
                    kind: ArgumentKind::Named,
                    message: "not a number".into(),
                },
                ArgumentIssue::UnexpectedPositional {
                    token: "extra".into(),
                },
                ArgumentIssue::UnknownToken {
                    token: "--nope".into(),
                    name: "nope".into(),
                },
            ]
        );
        assert!(report.text.contains("Invalid or missing arguments"));
        assert!(report.text.contains("Unrecognized command sequence"));
        assert!(report.text.contains("--region"));
        assert!(report.text.contains("not a number"));
    }

    #[tokio::test]
    async fn test_missing_positional_and_unknown_flag_together() {
        let cli = demo_tree(Arc::new(MemoryEnv::new()));
        let outcome = cli
            .parse("do something regular -t x --nope", &quiet())
            .await
            .expect("parse");
        let ParseOutcome::Failed(report) = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(report.issues.len(), 2);
        assert!(report.text.contains("<what>"));
        assert!(report.text.contains("--nope"));
    }

    #[test]
    fn test_invalid_command_text_is_eager() {
        let cli = Cli::new("app");
        assert!(matches!(
            cli.set("bad.path", CommandSpec::new()),
            Err(CliError::InvalidCommandText { .. })
        ));
        assert!(cli.get("bad/path").is_err());
    }

    #[test]
    fn test_help_text_hides_parent_options() {
        let cli = cli_with_env(Arc::new(MemoryEnv::new()));
        cli.set("", CommandSpec::new().argument(Argument::named("profile")))
            .expect("root")
            .set("deploy", CommandSpec::new().run(|_| Ok(())))
            .expect("deploy");

        assert!(cli.help_text("deploy", true).expect("help").contains("--profile"));
        assert!(!cli.help_text("deploy", false).expect("help").contains("--profile"));
        assert!(cli.help_text("deploy", false).expect("help").contains("--help-all"));
    }
}
