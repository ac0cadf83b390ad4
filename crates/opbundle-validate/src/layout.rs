//! # Bundle Layout
//!
//! Where things live inside a bundle root. The defaults match the
//! registry+v1 convention; a YAML config file may override any of them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Annotation label carrying the bundle media type.
pub const MEDIATYPE_LABEL: &str = "operators.operatorframework.io.bundle.mediatype.v1";
/// Annotation label carrying the manifests directory.
pub const MANIFESTS_LABEL: &str = "operators.operatorframework.io.bundle.manifests.v1";
/// Annotation label carrying the metadata directory.
pub const METADATA_LABEL: &str = "operators.operatorframework.io.bundle.metadata.v1";
/// Annotation label carrying the package name.
pub const PACKAGE_LABEL: &str = "operators.operatorframework.io.bundle.package.v1";
/// Annotation label carrying the comma-separated channel list.
pub const CHANNELS_LABEL: &str = "operators.operatorframework.io.bundle.channels.v1";
/// Annotation label carrying the default channel. Optional.
pub const CHANNEL_DEFAULT_LABEL: &str = "operators.operatorframework.io.bundle.channel.default.v1";

/// Relative locations of the bundle's directories and metadata files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BundleLayout {
    /// Subdirectory holding one manifest per file.
    pub manifests_dir: String,
    /// Subdirectory holding annotations and dependencies.
    pub metadata_dir: String,
    /// Annotations file name inside the metadata directory.
    pub annotations_file: String,
    /// Dependencies file name inside the metadata directory.
    pub dependencies_file: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            manifests_dir: "manifests".to_string(),
            metadata_dir: "metadata".to_string(),
            annotations_file: "annotations.yaml".to_string(),
            dependencies_file: "dependencies.yaml".to_string(),
        }
    }
}

impl BundleLayout {
    /// Parse a layout override; absent keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// `<root>/<manifests_dir>`.
    pub fn manifests_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifests_dir)
    }

    /// `<root>/<metadata_dir>`.
    pub fn metadata_path(&self, root: &Path) -> PathBuf {
        root.join(&self.metadata_dir)
    }

    /// `<root>/<metadata_dir>/<annotations_file>`.
    pub fn annotations_path(&self, root: &Path) -> PathBuf {
        self.metadata_path(root).join(&self.annotations_file)
    }

    /// `<root>/<metadata_dir>/<dependencies_file>`.
    pub fn dependencies_path(&self, root: &Path) -> PathBuf {
        self.metadata_path(root).join(&self.dependencies_file)
    }

    /// Value the manifests annotation must carry, e.g. `manifests/`.
    pub fn manifests_annotation(&self) -> String {
        format!("{}/", self.manifests_dir.trim_end_matches('/'))
    }

    /// Value the metadata annotation must carry, e.g. `metadata/`.
    pub fn metadata_annotation(&self) -> String {
        format!("{}/", self.metadata_dir.trim_end_matches('/'))
    }
}
