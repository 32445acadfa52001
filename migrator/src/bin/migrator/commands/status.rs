use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use migrator::{ExecutionRecord, list_store_records};
use serde::Serialize;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay};
use crate::utils::{format_datetime, format_duration_ms};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Execution History",
    commands: &[
        "migrator status                  # Every recorded execution, oldest first",
        "migrator --output compact status # One-line summary",
    ],
}];

#[derive(Debug, Serialize)]
struct ExecutionReport {
    store: String,
    records: Vec<ExecutionRecord>,
}

impl TableDisplay for ExecutionReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = OutputManager::table(
            options,
            &["Script", "Executed At", "Forced", "Pages", "Items", "Batches", "Duration"],
        );

        for record in &self.records {
            table.add_row(vec![
                Cell::new(&record.script),
                Cell::new(format_datetime(record.executed_at)),
                Cell::new(if record.forced { "yes" } else { "no" }),
                Cell::new(record.pages_read),
                Cell::new(record.items_written),
                Cell::new(record.batches_written),
                Cell::new(format_duration_ms(record.duration_ms)),
            ]);
        }

        table
    }

    fn to_compact(&self) -> String {
        match self.records.last() {
            Some(last) => format!(
                "{}: {} execution(s), latest {} at {}",
                self.store,
                self.records.len(),
                last.script,
                format_datetime(last.executed_at)
            ),
            None => format!("{}: no executions", self.store),
        }
    }
}

pub async fn handle_status(output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;

    let mut conn = ctx.connect().await?;
    let records = list_store_records(&mut conn, ctx.script_store())
        .await
        .with_context(|| format!("Failed to read execution records from '{}'", ctx.script_store()))?;

    output.heading(&format!("Executions recorded in {}", ctx.script_store()));
    if records.is_empty() {
        output.info("No scripts have been executed yet");
    }

    output.display(&ExecutionReport {
        store: ctx.script_store().to_string(),
        records,
    })
}
