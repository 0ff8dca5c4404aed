//! clitree-demo - a small command tree exercising every argument kind.
//!
//! ```bash
//! clitree-demo init my-project -f
//! clitree-demo do something regular -t x thing
//! clitree-demo run build test -v --count 3 -- --release
//! clitree-demo --help
//! ```
//!
//! Set `CLITREE_DEMO_OPTIONS` to a TOML file to override the parse options.

use std::path::Path;

use anyhow::Context;
use clitree::{
    Argument, Cli, CliError, CliSettings, CommandSpec, ParseOptions, ParsedArgs, TracingObserver,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RunArgs {
    scripts: Vec<String>,
    passthrough: Vec<String>,
    verbose: bool,
    count: Option<u64>,
}

fn parse_count(value: Value) -> Result<Value, String> {
    let text = match &value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err("count requires a value".to_string()),
    };
    text.parse::<u64>()
        .map(Value::from)
        .map_err(|_| format!("'{text}' is not a positive number"))
}

fn print_values(args: &ParsedArgs) -> anyhow::Result<()> {
    let json = serde_json::to_string(&args.values).context("serialize values")?;
    println!("{} {}", args.command, json);
    Ok(())
}

fn build_cli() -> Result<Cli, CliError> {
    let cli = Cli::with_settings(CliSettings::named("clitree-demo"));
    cli.observe(TracingObserver);

    cli.set(
        "",
        CommandSpec::new()
            .description("Demo command tree for clitree")
            .argument(
                Argument::named("profile")
                    .alias("p")
                    .env_var("CLITREE_DEMO_PROFILE")
                    .default_value("dev")
                    .description("Profile shared by every command"),
            ),
    )?
    .set(
        "init",
        CommandSpec::new()
            .description("Create a new project")
            .example("clitree-demo init my-project --force")
            .arguments([
                Argument::positional("name").description("Project name"),
                Argument::flag("force").alias("f").description("Overwrite"),
            ])
            .run(|args| {
                let name = args.get_str("name").unwrap_or_default();
                let profile = args.get_str("profile").unwrap_or_default();
                let force = if args.get_bool("force") { " (forced)" } else { "" };
                println!("initialized {name} [{profile}]{force}");
                Ok(())
            }),
    )?
    .set(
        "do something",
        CommandSpec::new().description("Things to do"),
    )?
    .set(
        "do something regular",
        CommandSpec::new()
            .description("Do a regular thing")
            .arguments([
                Argument::named("to_do").alias("t").description("What to do"),
                Argument::positional("what"),
            ])
            .run(|args| print_values(&args)),
    )?
    .set(
        "run",
        CommandSpec::new()
            .description("Run scripts")
            .arguments([
                Argument::overflow("scripts").description("Scripts to run"),
                Argument::transfer("passthrough").description("Arguments for the scripts"),
                Argument::flag("verbose").alias("v"),
                Argument::named("count")
                    .alias("c")
                    .parse_with(parse_count)
                    .description("Repeat count"),
            ])
            .run(|args| {
                let run: RunArgs = args.bind().context("bind run arguments")?;
                let passthrough = run.passthrough.join(" ");
                for _ in 0..run.count.unwrap_or(1) {
                    for script in &run.scripts {
                        if run.verbose {
                            println!("running {script} {passthrough}");
                        } else {
                            println!("running {script}");
                        }
                    }
                }
                Ok(())
            }),
    )?
    .set(
        "fail",
        CommandSpec::new()
            .description("Always fails")
            .run(|_| anyhow::bail!("the fail command failed")),
    )?;

    Ok(cli)
}

async fn run() -> anyhow::Result<i32> {
    let options = match std::env::var_os("CLITREE_DEMO_OPTIONS") {
        Some(path) => ParseOptions::load_from_path(Path::new(&path)),
        None => ParseOptions::default(),
    };

    let cli = build_cli()?;
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let outcome = cli.parse(argv, &options).await?;
    outcome.emit();
    Ok(outcome.exit_code().unwrap_or(0))
}

#[tokio::main]
async fn main() {
    clitree::logging::init_tracing();

    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
