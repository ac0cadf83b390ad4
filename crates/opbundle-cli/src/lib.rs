//! # opbundle-cli — Bundle Validation Command-Line Interface
//!
//! ## Subcommands
//!
//! - `validate`: format and content validation of a bundle directory
//! - `pull`: unpack a bundle image with docker or podman, optionally
//!   validating the result
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the engine.
//! - Handlers delegate to `opbundle-validate`; no validation rules here.

pub mod container;
pub mod pull;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use opbundle_core::ValidationError;
use opbundle_validate::BundleLayout;

/// Load a layout override, or the default layout when no file is given.
pub fn load_layout(config: Option<&Path>) -> Result<BundleLayout> {
    let Some(path) = config else {
        return Ok(BundleLayout::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    BundleLayout::from_yaml_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Print a pass outcome and return its exit code.
pub fn report(pass: &str, result: Result<(), ValidationError>) -> u8 {
    match result {
        Ok(()) => {
            println!("{pass}: OK");
            0
        }
        Err(errors) => {
            println!("{pass}: {} error(s)", errors.len());
            for e in errors.errors() {
                println!("  - {e}");
            }
            1
        }
    }
}
