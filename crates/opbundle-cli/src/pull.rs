//! # Pull Subcommand
//!
//! Unpacks a bundle image into a local directory and optionally validates
//! the result. A pull failure is reported alone; validation never runs on
//! a partial unpack.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use opbundle_validate::{BundleLayout, ImageValidator};

use crate::container::{ContainerTool, ContainerToolReader};
use crate::validate::validate_bundle;

/// Arguments for the pull subcommand.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Bundle image reference, e.g. quay.io/example/bundle:0.0.1.
    pub image: String,

    /// Directory to unpack the image into.
    pub output_dir: PathBuf,

    /// Container tool used to unpack the image.
    #[arg(long, value_enum, default_value = "docker")]
    pub tool: ContainerTool,

    /// Validate the unpacked bundle.
    #[arg(long)]
    pub validate: bool,
}

/// Execute the pull subcommand.
pub fn run_pull(args: &PullArgs, layout: &BundleLayout) -> Result<u8> {
    let validator = ImageValidator::new()
        .with_layout(layout.clone())
        .with_image_reader(Arc::new(ContainerToolReader::new(args.tool)));

    validator
        .pull_bundle_image(&args.image, &args.output_dir)
        .with_context(|| format!("failed to pull bundle image {}", args.image))?;
    println!("unpacked {} into {}", args.image, args.output_dir.display());

    if !args.validate {
        return Ok(0);
    }
    Ok(validate_bundle(&validator, &args.output_dir, true, true))
}
