//! Template for new migration/seed scripts.

use anyhow::Result;
use chrono::{DateTime, Utc};
use migrator::config::is_valid_script_name;
use std::fmt::Write;

use crate::utils::{module_name, sanitize_identifier};

/// Generated script file
pub struct ScriptFile {
    /// Filename (without path)
    pub filename: String,
    /// Module name (valid Rust identifier)
    pub module_name: String,
    /// Folder module name
    pub folder_module: String,
    /// Key the script is tracked under
    pub script_name: String,
    /// Full file content
    pub content: String,
}

/// Generate a script file for `name` placed in `folder`.
pub fn generate_script_file(name: &str, folder: &str, timestamp: DateTime<Utc>) -> Result<ScriptFile> {
    let script_name = sanitize_identifier(name);
    if script_name.trim_matches('_').is_empty() || !is_valid_script_name(&script_name) {
        anyhow::bail!("'{name}' cannot be used as a script name; use letters, digits and '_'");
    }

    let folder_ident = sanitize_identifier(folder);
    if folder_ident.trim_matches('_').is_empty() {
        anyhow::bail!("'{folder}' cannot be used as a folder name; use letters, digits and '_'");
    }

    let module = module_name(&script_name);
    let folder_module = module_name(&folder_ident);
    let content = generate_content(&script_name, &folder_module, timestamp);

    Ok(ScriptFile {
        filename: format!("{module}.rs"),
        module_name: module,
        folder_module,
        script_name,
        content,
    })
}

fn generate_content(script_name: &str, folder: &str, timestamp: DateTime<Utc>) -> String {
    let mut content = String::new();

    let _ = writeln!(content, "// {folder}/{script_name}.rs");
    let _ = writeln!(content, "//");
    let _ = writeln!(content, "// Script: {script_name}");
    let _ = writeln!(content, "// Generated: {}", timestamp.format("%Y-%m-%dT%H:%M:%SZ"));
    let _ = writeln!(content, "//");
    let _ = writeln!(content, "// ⚠ IMPLEMENTATION REQUIRED: fill in read, transform and write below.");
    let _ = writeln!(content);

    let _ = writeln!(content, "use migrator::{{BoxError, DataOperations, Page, ScriptEnv, ScriptFuture, ScriptRegistration}};");
    let _ = writeln!(content, "use migrator::ConnectionManager;");
    let _ = writeln!(content, "use serde_json::Value;");
    let _ = writeln!(content);
    let _ = writeln!(content, "const SCRIPT_NAME: &str = \"{script_name}\";");
    let _ = writeln!(content);

    let _ = writeln!(content, "struct Operations {{");
    let _ = writeln!(content, "    #[allow(dead_code)]");
    let _ = writeln!(content, "    conn: ConnectionManager,");
    let _ = writeln!(content, "}}");
    let _ = writeln!(content);

    let _ = writeln!(content, "impl DataOperations for Operations {{");
    let _ = writeln!(content, "    type Item = Value;");
    let _ = writeln!(content, "    type Token = u64;");
    let _ = writeln!(content);
    let _ = writeln!(content, "    /// Return the page starting at `page_token` (None = first page).");
    let _ = writeln!(content, "    /// Set `next_page_token` while more pages remain.");
    let _ = writeln!(
        content,
        "    async fn read(&mut self, page_token: Option<u64>) -> Result<Page<Value, u64>, BoxError> {{"
    );
    let _ = writeln!(content, "        let _ = page_token;");
    let _ = writeln!(content, "        Ok(Page::last(Vec::new()))");
    let _ = writeln!(content, "    }}");
    let _ = writeln!(content);
    let _ = writeln!(content, "    /// Map one page of items. Remove this method to keep items unchanged.");
    let _ = writeln!(
        content,
        "    fn transform(&self, items: Vec<Value>) -> Result<Vec<Value>, BoxError> {{"
    );
    let _ = writeln!(content, "        Ok(items)");
    let _ = writeln!(content, "    }}");
    let _ = writeln!(content);
    let _ = writeln!(content, "    /// Persist one batch (at most `batch_size` items).");
    let _ = writeln!(
        content,
        "    async fn write(&mut self, batch: Vec<Value>) -> Result<(), BoxError> {{"
    );
    let _ = writeln!(content, "        let _ = batch;");
    let _ = writeln!(content, "        Ok(())");
    let _ = writeln!(content, "    }}");
    let _ = writeln!(content, "}}");
    let _ = writeln!(content);

    let _ = writeln!(content, "fn run(env: ScriptEnv) -> ScriptFuture {{");
    let _ = writeln!(content, "    Box::pin(async move {{");
    let _ = writeln!(content, "        let operations = Operations {{ conn: env.redis.clone() }};");
    let _ = writeln!(content, "        env.run_engine(SCRIPT_NAME, operations).await");
    let _ = writeln!(content, "    }})");
    let _ = writeln!(content, "}}");
    let _ = writeln!(content);

    let _ = writeln!(content, "migrator::inventory::submit! {{");
    let _ = writeln!(content, "    ScriptRegistration {{");
    let _ = writeln!(content, "        name: SCRIPT_NAME,");
    let _ = writeln!(content, "        folder: \"{folder}\",");
    let _ = writeln!(content, "        description: \"{script_name}\",");
    let _ = writeln!(content, "        run,");
    let _ = writeln!(content, "    }}");
    let _ = writeln!(content, "}}");

    content
}
