//! Script scaffolding.
//!
//! This module provides functionality to:
//! - Generate a script file from the template
//! - Register the new module in the folder and scripts `mod.rs` files

mod module_updater;
mod template;

pub use module_updater::register_module;
pub use template::generate_script_file;
