use anyhow::{Context, Result};
use clap::Args;

use crate::context::{CONFIG_FILE, MigratorConfig, ProjectContext};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Set Up",
    commands: &[
        "migrator init            # Write migrator.toml with defaults",
        "migrator init --force    # Reset migrator.toml to defaults",
    ],
}];

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing migrator.toml
    #[arg(long)]
    force: bool,
}

pub async fn handle_init(args: InitArgs, output: &OutputManager) -> Result<()> {
    let ctx = ProjectContext::find()?;

    output.heading("Initialize migrator");

    if ctx.is_initialized() && !args.force {
        output.warning(&format!("{CONFIG_FILE} already exists in {}", ctx.project_root.display()));
        output.info("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    let config = MigratorConfig::default();
    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    std::fs::write(&ctx.config_path, content)
        .with_context(|| format!("Failed to write {}", ctx.config_path.display()))?;
    output.success(&format!("Created {CONFIG_FILE}"));

    let scripts_dir = ctx.project_root.join(&config.scaffold.scripts_dir);
    std::fs::create_dir_all(&scripts_dir)
        .with_context(|| format!("Failed to create {}", scripts_dir.display()))?;
    output.bullet(&format!("Scripts directory: {}", config.scaffold.scripts_dir));
    output.bullet(&format!("Tracker store: {}", config.tracker.script_store));

    output.info("Next steps:");
    output.bullet("Export REDIS_URL (or set tracker.redis_url)");
    output.bullet("Run 'migrator new --name <script> --folder <folder>'");

    Ok(())
}
