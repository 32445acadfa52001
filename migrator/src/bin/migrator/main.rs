mod commands;
mod context;
mod examples;
mod generator;
mod help;
mod output;
mod scripts;
mod theme;
mod utils;

use std::io::{self, Write};

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use commands::{
    init::{InitArgs, handle_init},
    list::handle_list,
    new::{NewArgs, handle_new},
    run::{RunArgs, handle_run},
    status::handle_status,
};
use help::HelpRenderer;
use output::{GlobalOptions, OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "migrator")]
#[command(version)]
#[command(
    about = "Idempotent batch migration and seed-script runner for Redis",
    long_about = r#"Batch migration and seed-script runner that provides:

• Run-once scripts tracked in a Redis execution store
• Paged reads with batched, atomic writes
• Forced re-runs and dry runs
• Scaffolding for new scripts

Commands:
  init      Initialize migrator in a project
  run       Run a registered script
  list      List registered scripts and their execution state
  status    Show recorded executions
  new       Generate a new script
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize migrator in the current project
    Init(InitArgs),

    /// Run a registered script unless it has already been executed
    Run(RunArgs),

    /// List registered scripts and whether each has run
    List,

    /// Show the execution records kept in the tracker store
    Status,

    /// Generate a new script and register its module
    New(NewArgs),
}

impl Cli {
    /// Parse arguments, printing help and errors framed by blank lines.
    fn parse_with_help() -> Self {
        let command = HelpRenderer::from_env().decorate(Cli::command());
        let err = match command.try_get_matches() {
            Ok(matches) => return Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit()),
            Err(err) => err,
        };

        let (code, to_stdout) = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => (0, true),
            _ => (err.exit_code(), false),
        };

        blank_line(to_stdout);
        if let Err(print_err) = err.print()
            && print_err.kind() != io::ErrorKind::BrokenPipe
        {
            eprintln!("Failed to display help: {print_err}");
        }
        blank_line(to_stdout);
        std::process::exit(code);
    }
}

fn blank_line(to_stdout: bool) {
    let _ = if to_stdout {
        io::stdout().write_all(b"\n").and_then(|()| io::stdout().flush())
    } else {
        io::stderr().write_all(b"\n").and_then(|()| io::stderr().flush())
    };
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_help();
    if cli.no_color {
        colored::control::set_override(false);
    }

    blank_line(true);

    let result = execute(cli).await;
    if let Err(err) = &result {
        eprintln!("Error: {err:#}");
    }
    blank_line(true);

    if result.is_err() {
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    match cli.command {
        Commands::Init(args) => handle_init(args, &output).await,
        Commands::Run(args) => handle_run(args, &output).await,
        Commands::List => handle_list(&output).await,
        Commands::Status => handle_status(&output).await,
        Commands::New(args) => handle_new(args, &output).await,
    }
}
