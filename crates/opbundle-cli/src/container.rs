//! # Container Tool Image Reader
//!
//! An [`ImageReader`] that shells out to `docker` or `podman`: pull the
//! image, create a stopped container from it, copy its root filesystem
//! out, and remove the container.

use std::path::Path;
use std::process::Command;

use clap::ValueEnum;

use opbundle_validate::{ImageReader, ImageReaderError};

/// Container tool used to unpack images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContainerTool {
    /// `docker`.
    Docker,
    /// `podman`.
    Podman,
}

impl ContainerTool {
    /// Binary name.
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerTool::Docker => "docker",
            ContainerTool::Podman => "podman",
        }
    }
}

/// Reads bundle images through a container tool CLI.
#[derive(Debug, Clone)]
pub struct ContainerToolReader {
    tool: ContainerTool,
}

impl ContainerToolReader {
    /// Reader backed by `tool`.
    pub fn new(tool: ContainerTool) -> Self {
        Self { tool }
    }

    fn run(&self, step: &str, args: &[&str]) -> Result<String, ImageReaderError> {
        let binary = self.tool.binary();
        tracing::debug!(tool = binary, step, ?args, "running container tool");
        let failed = |reason: String| ImageReaderError::Tool {
            tool: binary.to_string(),
            step: step.to_string(),
            reason,
        };
        let output = Command::new(binary)
            .args(args)
            .output()
            .map_err(|e| failed(e.to_string()))?;
        if !output.status.success() {
            return Err(failed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ImageReader for ContainerToolReader {
    fn get_image_data(&self, image: &str, output_dir: &Path) -> Result<(), ImageReaderError> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            ImageReaderError::Other(format!(
                "cannot create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        self.run("pull", &["pull", image])?;
        // Bundle images are FROM scratch; the command is never executed.
        let container = self.run("create", &["create", image, "opbundle-unpack"])?;

        let source = format!("{container}:/.");
        let destination = output_dir.display().to_string();
        let copied = self.run("cp", &["cp", &source, &destination]);
        let removed = self.run("rm", &["rm", &container]);
        if let Err(e) = &removed {
            tracing::warn!(container, error = %e, "failed to remove unpack container");
        }
        copied.map(|_| ())
    }
}
