use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use migrator::find_script;
use std::path::Path;

use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::generator::{generate_script_file, register_module};
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Generate Scripts",
    commands: &[
        "migrator new --name seed_users --folder accounts      # scripts/accounts/seed_users.rs",
        "migrator new -n backfill_totals -f billing            # scripts/billing/backfill_totals.rs",
    ],
}];

#[derive(Args)]
pub struct NewArgs {
    /// Name of the migration/seed script (also its execution-record key)
    #[arg(short, long)]
    name: String,

    /// Folder inside the scripts directory the script is placed in
    #[arg(short, long)]
    folder: String,
}

pub async fn handle_new(args: NewArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;

    output.heading("Generate Script");

    let file = generate_script_file(&args.name, &args.folder, Utc::now())?;
    output.bullet(&format!("Script name: {}", file.script_name));

    if find_script(&file.script_name).is_some() {
        output.warning(&format!(
            "A script named '{}' is already registered; both would share one execution record",
            file.script_name
        ));
    }

    let folder_dir = ctx.scripts_dir.join(&file.folder_module);
    let script_path = folder_dir.join(&file.filename);
    if script_path.exists() {
        anyhow::bail!("{} already exists", relative(&ctx.project_root, &script_path));
    }

    std::fs::create_dir_all(&folder_dir)
        .with_context(|| format!("Failed to create {}", folder_dir.display()))?;
    std::fs::write(&script_path, &file.content)
        .with_context(|| format!("Failed to write {}", script_path.display()))?;
    output.success(&format!("Created: {}", relative(&ctx.project_root, &script_path)));

    if register_module(&folder_dir, &file.module_name)? {
        output.bullet(&format!("Updated: {}", relative(&ctx.project_root, &folder_dir.join("mod.rs"))));
    }
    if register_module(&ctx.scripts_dir, &file.folder_module)? {
        output.bullet(&format!(
            "Updated: {}",
            relative(&ctx.project_root, &ctx.scripts_dir.join("mod.rs"))
        ));
    }

    output.info("Next steps:");
    output.bullet("Implement read, transform and write in the generated file");
    output.bullet("Make sure your binary declares the scripts module ('mod scripts;')");
    output.bullet(&format!("Run 'migrator run {}'", file.script_name));

    Ok(())
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
