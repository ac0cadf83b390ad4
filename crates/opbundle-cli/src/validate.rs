//! # Validate Subcommand
//!
//! Runs format validation on a bundle root, then content validation on its
//! manifests directory. Either pass can be run alone.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use opbundle_validate::{BundleLayout, ImageValidator};

use crate::report;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Bundle root directory.
    pub bundle_dir: PathBuf,

    /// Only validate the manifests directory contents.
    #[arg(long, conflicts_with = "format_only")]
    pub content_only: bool,

    /// Only validate annotations, layout and dependencies.
    #[arg(long)]
    pub format_only: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, layout: &BundleLayout) -> Result<u8> {
    let validator = ImageValidator::new().with_layout(layout.clone());
    Ok(validate_bundle(
        &validator,
        &args.bundle_dir,
        !args.content_only,
        !args.format_only,
    ))
}

/// Run the selected passes and return the combined exit code.
pub fn validate_bundle(validator: &ImageValidator, root: &Path, format: bool, content: bool) -> u8 {
    let mut code = 0;
    if format {
        code |= report("format", validator.validate_bundle_format(root));
    }
    if content {
        let manifests = validator.layout().manifests_path(root);
        code |= report("content", validator.validate_bundle_content(&manifests));
    }
    code
}
