use std::collections::HashSet;

use anyhow::Result;
use comfy_table::{Cell, Color as TableColor, Table};
use migrator::{duplicate_script_names, list_store_records, registered_scripts};
use serde::Serialize;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Inspect Scripts",
    commands: &[
        "migrator list                 # Registered scripts and whether each has run",
        "migrator --output json list   # Same, as JSON",
    ],
}];

#[derive(Debug, Serialize)]
struct ScriptRow {
    name: &'static str,
    folder: &'static str,
    description: &'static str,
    /// `None` when the tracker store could not be reached
    executed: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
struct ScriptListing {
    scripts: Vec<ScriptRow>,
}

impl TableDisplay for ScriptListing {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = OutputManager::table(options, &["Folder", "Script", "Executed", "Description"]);

        for row in &self.scripts {
            let (label, color) = match row.executed {
                Some(true) => ("yes", TableColor::Green),
                Some(false) => ("no", TableColor::Yellow),
                None => ("unknown", TableColor::DarkGrey),
            };
            let executed = if options.no_color { Cell::new(label) } else { Cell::new(label).fg(color) };
            table.add_row(vec![
                Cell::new(row.folder),
                Cell::new(row.name),
                executed,
                Cell::new(row.description),
            ]);
        }

        table
    }

    fn to_compact(&self) -> String {
        let pending = self.scripts.iter().filter(|row| row.executed == Some(false)).count();
        format!("Scripts: {} ({pending} pending)", self.scripts.len())
    }
}

pub async fn handle_list(output: &OutputManager) -> Result<()> {
    let scripts = registered_scripts();

    if scripts.is_empty() {
        output.warning("No scripts are registered in this binary");
        output.info("Create one with 'migrator new --name <script> --folder <folder>'");
        return Ok(());
    }

    let ctx = ProjectContext::find()?;
    let executed = match load_executed(&ctx).await {
        Ok(executed) => Some(executed),
        Err(err) => {
            output.warning(&format!("Execution state unavailable: {err:#}"));
            None
        }
    };

    let listing = ScriptListing {
        scripts: scripts
            .iter()
            .map(|script| ScriptRow {
                name: script.name,
                folder: script.folder,
                description: script.description,
                executed: executed.as_ref().map(|names| names.contains(script.name)),
            })
            .collect(),
    };

    output.display(&listing)?;

    for name in duplicate_script_names() {
        output.warning(&format!("'{name}' is registered more than once"));
    }

    Ok(())
}

async fn load_executed(ctx: &ProjectContext) -> Result<HashSet<String>> {
    let mut conn = ctx.connect().await?;
    let records = list_store_records(&mut conn, ctx.script_store()).await?;
    Ok(records.into_iter().map(|record| record.script).collect())
}
