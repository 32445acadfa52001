use anyhow::{Context, Result};
use migrator::{ConnectionManager, DEFAULT_BATCH_SIZE, RunOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project configuration file, next to Cargo.toml.
pub const CONFIG_FILE: &str = "migrator.toml";

/// Project context for migrator operations
pub struct ProjectContext {
    /// Root directory of the project (where Cargo.toml is)
    pub project_root: PathBuf,
    /// Path to migrator.toml
    pub config_path: PathBuf,
    /// Directory new scripts are generated into
    pub scripts_dir: PathBuf,
    /// Loaded configuration, or defaults when the file is missing
    pub config: MigratorConfig,
}

/// Configuration stored in migrator.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigratorConfig {
    #[serde(default)]
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub runner: RunnerSettings,
    #[serde(default)]
    pub scaffold: ScaffoldSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Redis hash holding one record per executed script
    #[serde(default = "default_script_store")]
    pub script_store: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            script_store: default_script_store(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_script_store() -> String {
    "migration-seed-scripts".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldSettings {
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,
}

impl Default for ScaffoldSettings {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
        }
    }
}

/// The scripts module of the `migrator` binary, relative to the package root.
fn default_scripts_dir() -> String {
    "src/bin/migrator/scripts".to_string()
}

impl ProjectContext {
    /// Find and load project context from current directory or ancestors
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::find_from(&current_dir)
    }

    /// Find project context starting from the given directory
    pub fn find_from(start: &Path) -> Result<Self> {
        let project_root = Self::find_project_root(start)?;
        Self::from_root(project_root)
    }

    /// Create context from a known project root
    pub fn from_root(project_root: PathBuf) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            MigratorConfig::default()
        };

        let scripts_dir = project_root.join(&config.scaffold.scripts_dir);

        Ok(Self {
            project_root,
            config_path,
            scripts_dir,
            config,
        })
    }

    /// Find project root by looking for Cargo.toml
    fn find_project_root(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join("Cargo.toml").exists() {
                return Ok(current);
            }

            if !current.pop() {
                anyhow::bail!(
                    "Could not find Cargo.toml in {start:?} or any parent directory. \
                     Are you in a Rust project?"
                );
            }
        }
    }

    /// Check if migrator.toml exists
    pub fn is_initialized(&self) -> bool {
        self.config_path.exists()
    }

    /// Get the Redis URL, expanding environment variables
    pub fn redis_url(&self) -> Result<String> {
        expand_env(&self.config.tracker.redis_url)
    }

    pub fn script_store(&self) -> &str {
        &self.config.tracker.script_store
    }

    /// Run options from configuration, overridden by command-line flags
    pub fn run_options(&self, force: bool, dry_run: bool, batch_size: Option<usize>) -> Result<RunOptions> {
        let batch_size = batch_size.unwrap_or(self.config.runner.batch_size);
        let options = RunOptions::default()
            .with_force(force)
            .with_dry_run(dry_run)
            .with_batch_size(batch_size)?;
        Ok(options)
    }

    /// Open a managed Redis connection
    pub async fn connect(&self) -> Result<ConnectionManager> {
        let url = self.redis_url()?;
        let client = redis::Client::open(url.as_str()).context("Failed to create Redis client")?;
        ConnectionManager::new(client).await.context("Failed to connect to Redis")
    }
}

/// Expand a `${VAR}` value from the environment; anything else is returned as-is
fn expand_env(value: &str) -> Result<String> {
    match value.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        Some(var_name) => {
            std::env::var(var_name).with_context(|| format!("Environment variable {var_name} not set"))
        }
        None => Ok(value.to_string()),
    }
}
