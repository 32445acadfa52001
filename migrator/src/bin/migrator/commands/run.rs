use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use migrator::{RunOutcome, ScriptEnv, duplicate_script_names, find_script, registered_scripts};
use serde::Serialize;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay};
use crate::utils::format_duration_ms;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Run Scripts",
        commands: &[
            "migrator run uppercase_first_name                 # Run once; later runs are skipped",
            "migrator run uppercase_first_name --batch-size 25 # Smaller write batches",
        ],
    },
    ExampleGroup {
        title: "Preview and Re-run",
        commands: &[
            "migrator run uppercase_first_name --dry-run       # Read and transform, write nothing",
            "migrator run uppercase_first_name --force         # Run again even if already executed",
        ],
    },
];

#[derive(Args)]
pub struct RunArgs {
    /// Name of the registered script
    script: String,

    /// Run even if the script has already been executed
    #[arg(long)]
    force: bool,

    /// Read and transform every page without writing or recording the execution
    #[arg(long)]
    dry_run: bool,

    /// Maximum items per write (defaults to runner.batch_size)
    #[arg(long)]
    batch_size: Option<usize>,
}

/// Outcome of one `migrator run`, for table and JSON output
#[derive(Debug, Serialize)]
struct RunSummary {
    script: String,
    status: &'static str,
    pages_read: u64,
    items_read: u64,
    items_written: u64,
    batches_written: u64,
    duration_ms: u64,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RunSummary {
    fn new(script: &str, outcome: &RunOutcome) -> Self {
        let stats = outcome.stats().cloned().unwrap_or_default();
        let status = match outcome {
            RunOutcome::Completed(_) => "completed",
            RunOutcome::Skipped => "skipped",
            RunOutcome::Failed(_) => "failed",
        };

        Self {
            script: script.to_string(),
            status,
            pages_read: stats.pages_read,
            items_read: stats.items_read,
            items_written: stats.items_written,
            batches_written: stats.batches_written,
            duration_ms: stats.duration_ms,
            dry_run: stats.dry_run,
            error: outcome.error().map(|err| err.to_string()),
        }
    }
}

impl TableDisplay for RunSummary {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = OutputManager::table(options, &["Metric", "Value"]);
        table.add_row(vec![Cell::new("Status"), Cell::new(self.status)]);
        table.add_row(vec![Cell::new("Pages read"), Cell::new(self.pages_read)]);
        table.add_row(vec![Cell::new("Items read"), Cell::new(self.items_read)]);
        table.add_row(vec![Cell::new("Items written"), Cell::new(self.items_written)]);
        table.add_row(vec![Cell::new("Batches written"), Cell::new(self.batches_written)]);
        table.add_row(vec![Cell::new("Duration"), Cell::new(format_duration_ms(self.duration_ms))]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} {} pages={} written={} batches={} {}",
            self.script,
            self.status,
            self.pages_read,
            self.items_written,
            self.batches_written,
            format_duration_ms(self.duration_ms)
        )
    }
}

pub async fn handle_run(args: RunArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;

    let Some(script) = find_script(&args.script) else {
        output.error(&format!("No script named '{}' is registered", args.script));
        let names: Vec<&str> = registered_scripts().iter().map(|s| s.name).collect();
        if !names.is_empty() {
            output.info(&format!("Registered scripts: {}", names.join(", ")));
        }
        anyhow::bail!("Unknown script '{}'", args.script);
    };

    if duplicate_script_names().contains(&script.name) {
        anyhow::bail!(
            "Script name '{}' is registered more than once; rename one so each has its own execution record",
            script.name
        );
    }

    let options = ctx.run_options(args.force, args.dry_run, args.batch_size)?;

    output.heading(&format!("Running {}/{}", script.folder, script.name));
    output.key_value("Description", script.description);
    output.key_value("Tracker store", ctx.script_store());
    output.key_value("Batch size", &options.batch_size.to_string());
    if options.force {
        output.warning("FORCED RUN - the idempotency check is skipped");
    }
    if options.dry_run {
        output.warning("DRY RUN MODE - No changes will be made");
    }

    let redis = ctx.connect().await?;
    output.verbose("Connected to Redis");

    let env = ScriptEnv {
        redis,
        script_store: ctx.script_store().to_string(),
        options,
        reporter: Arc::new(output.clone()),
    };
    let outcome = (script.run)(env).await;

    output.display(&RunSummary::new(script.name, &outcome))?;

    match outcome {
        RunOutcome::Completed(_) => Ok(()),
        RunOutcome::Skipped => {
            output.info("Use --force to run it again.");
            Ok(())
        }
        RunOutcome::Failed(err) => anyhow::bail!("Script '{}' failed ({})", script.name, err.kind()),
    }
}
