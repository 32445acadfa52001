//! Keeps `mod.rs` files in the scripts tree in sync with generated modules.

use anyhow::{Context, Result};
use std::path::Path;

const MOD_HEADER: &str = "//! Migration and seed scripts.
//!
//! Module declarations are added by `migrator new`.

";

/// Declare `module_name` in `dir/mod.rs`, creating the file if needed.
///
/// Returns `false` when the module was already declared.
pub fn register_module(dir: &Path, module_name: &str) -> Result<bool> {
    let mod_path = dir.join("mod.rs");

    let content = if mod_path.exists() {
        std::fs::read_to_string(&mod_path).with_context(|| format!("Failed to read {}", mod_path.display()))?
    } else {
        MOD_HEADER.to_string()
    };

    if declares_module(&content, module_name) {
        return Ok(false);
    }

    let new_content = insert_declaration(&content, &format!("mod {module_name};"));
    std::fs::write(&mod_path, new_content).with_context(|| format!("Failed to write {}", mod_path.display()))?;

    Ok(true)
}

fn declares_module(content: &str, module_name: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        let line = line.strip_prefix("pub ").unwrap_or(line);
        line.strip_prefix("mod ")
            .and_then(|rest| rest.strip_suffix(';'))
            .is_some_and(|name| name.trim() == module_name)
    })
}

/// Insert after the last `mod` line, or after the leading comment block.
fn insert_declaration(content: &str, declaration: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();

    let last_mod = lines.iter().rposition(|line| {
        let line = line.trim();
        (line.starts_with("mod ") || line.starts_with("pub mod ")) && line.ends_with(';')
    });

    let insert_at = match last_mod {
        Some(index) => index + 1,
        None => lines
            .iter()
            .position(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("//")
            })
            .unwrap_or(lines.len()),
    };

    lines.insert(insert_at, declaration);
    let mut new_content = lines.join("\n");
    new_content.push('\n');
    new_content
}
