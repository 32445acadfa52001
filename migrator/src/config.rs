//! Run configuration fixed at construction time.

use std::num::NonZeroUsize;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::MigrationError;

/// Number of items handed to a single `write` call unless overridden.
pub const DEFAULT_BATCH_SIZE: usize = 50;

static SCRIPT_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]*$").expect("script name pattern is valid"));

/// Returns `true` if the name can be used as a tracker key.
pub fn is_valid_script_name(name: &str) -> bool {
    SCRIPT_NAME_PATTERN.is_match(name)
}

/// Identity of a script and the location its execution is recorded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    script_name: String,
    script_store: String,
}

impl Configuration {
    /// Validate and build a configuration.
    ///
    /// `script_name` is the key written to the store once the script completes;
    /// `script_store` names the table/hash/file holding those keys.
    pub fn new(script_name: impl Into<String>, script_store: impl Into<String>) -> Result<Self, MigrationError> {
        let script_name = script_name.into();
        let script_store = script_store.into();

        if script_name.is_empty() {
            return Err(MigrationError::invalid_config("script name must not be empty"));
        }
        if !is_valid_script_name(&script_name) {
            return Err(MigrationError::invalid_config(format!(
                "script name '{script_name}' may only contain letters, digits, '_', '.', ':' and '-'"
            )));
        }
        if script_store.trim().is_empty() {
            return Err(MigrationError::invalid_config("script store must not be empty"));
        }

        Ok(Self {
            script_name,
            script_store,
        })
    }

    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    pub fn script_store(&self) -> &str {
        &self.script_store
    }
}

/// Knobs controlling a single engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip the idempotency check and run regardless of prior executions.
    pub force: bool,
    /// Maximum number of items per `write` call.
    pub batch_size: NonZeroUsize,
    /// Read and transform every page but never write or record the execution.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            force: false,
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).expect("default batch size is non-zero"),
            dry_run: false,
        }
    }
}

impl RunOptions {
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the batch size. Zero is rejected.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, MigrationError> {
        self.batch_size =
            NonZeroUsize::new(batch_size).ok_or_else(|| MigrationError::invalid_config("batch size must be at least 1"))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_script_names() {
        for name in ["accounts-dynamodb", "20241228_seed_users", "billing:v2.backfill"] {
            assert!(Configuration::new(name, "migration-seed-scripts").is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_empty_or_malformed_names() {
        assert!(Configuration::new("", "store").is_err());
        assert!(Configuration::new("has space", "store").is_err());
        assert!(Configuration::new("-leading-dash", "store").is_err());
    }

    #[test]
    fn rejects_blank_store() {
        let err = Configuration::new("seed", "  ").unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn run_options_defaults() {
        let options = RunOptions::default();
        assert!(!options.force);
        assert!(!options.dry_run);
        assert_eq!(options.batch_size.get(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(RunOptions::default().with_batch_size(0).is_err());
        assert_eq!(RunOptions::default().with_batch_size(7).unwrap().batch_size.get(), 7);
    }
}
