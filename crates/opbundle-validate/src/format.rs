//! # Format Classification
//!
//! Decides which bundle format a directory claims to be and whether its
//! annotations file agrees. Only `registry+v1` is recognized today; each
//! media type carries the allow-list of object kinds it may ship.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use opbundle_core::{yaml_to_json_value, BundleError, ValidationError};

use crate::kinds::CSV_KIND;
use crate::layout::{
    BundleLayout, CHANNELS_LABEL, CHANNEL_DEFAULT_LABEL, MANIFESTS_LABEL, MEDIATYPE_LABEL,
    METADATA_LABEL, PACKAGE_LABEL,
};
use crate::loader::LoadedManifests;

/// Object kinds a registry+v1 bundle may contain.
pub const REGISTRY_V1_KINDS: [&str; 19] = [
    "ClusterServiceVersion",
    "CustomResourceDefinition",
    "Secret",
    "ClusterRole",
    "ClusterRoleBinding",
    "ConfigMap",
    "ServiceAccount",
    "Service",
    "Role",
    "RoleBinding",
    "PrometheusRule",
    "ServiceMonitor",
    "PodDisruptionBudget",
    "PriorityClass",
    "VerticalPodAutoscaler",
    "ConsoleYAMLSample",
    "ConsoleQuickStart",
    "ConsoleCLIDownload",
    "ConsoleLink",
];

/// A recognized bundle format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// Plain manifests with a CSV, as consumed by the operator registry.
    RegistryV1,
}

impl MediaType {
    /// Every recognized media type.
    pub fn all() -> &'static [MediaType] {
        &[MediaType::RegistryV1]
    }

    /// The value written in the media type annotation.
    pub fn annotation_value(&self) -> &'static str {
        match self {
            MediaType::RegistryV1 => "registry+v1",
        }
    }

    /// Name used in violation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            MediaType::RegistryV1 => "registryV1",
        }
    }

    /// Parse an annotation value.
    pub fn from_annotation(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.annotation_value() == value)
    }

    /// Object kinds this format may ship.
    pub fn supported_kinds(&self) -> &'static [&'static str] {
        match self {
            MediaType::RegistryV1 => &REGISTRY_V1_KINDS,
        }
    }

    /// Whether `kind` may appear in a bundle of this format.
    pub fn supports(&self, kind: &str) -> bool {
        self.supported_kinds().contains(&kind)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation_value())
    }
}

/// Infer the media type from the contents of a manifests directory.
///
/// A directory is `registry+v1` when every file is a structured document
/// and one of them is a ClusterServiceVersion.
pub fn detect_media_type(loaded: &LoadedManifests, dir: &Path) -> Result<MediaType, BundleError> {
    if loaded.file_count == 0 {
        return Err(BundleError::EmptyManifestsDir {
            path: dir.display().to_string(),
        });
    }
    if loaded.unstructured_count == 0 && loaded.of_kind(CSV_KIND).next().is_some() {
        return Ok(MediaType::RegistryV1);
    }
    Err(BundleError::MediaTypeUndetermined {
        path: dir.display().to_string(),
    })
}

/// Decoded annotations file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    values: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct AnnotationsDocument {
    annotations: BTreeMap<String, serde_json::Value>,
}

impl Annotations {
    /// Parse the text of an annotations file.
    ///
    /// Scalar values are kept in their textual form. A document without an
    /// `annotations` mapping, or with a nested value, is an error.
    pub fn parse(content: &str) -> Result<Self, String> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let json = yaml_to_json_value(&yaml)?;
        let doc: AnnotationsDocument = serde_json::from_value(json).map_err(|e| e.to_string())?;

        let mut values = BTreeMap::new();
        for (label, value) in doc.annotations {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return Err(format!("annotation {label:?} must be a scalar value")),
            };
            values.insert(label, text);
        }
        Ok(Self { values })
    }

    /// Value of a label, if present.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    /// Declared media type, if the label is present and recognized.
    pub fn media_type(&self) -> Option<MediaType> {
        self.get(MEDIATYPE_LABEL).and_then(MediaType::from_annotation)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no labels were declared.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Check the annotations against the layout and the detected media type.
///
/// `detected` is `None` when detection already failed and reported its own
/// error; the media type label is then only checked for being recognized.
pub fn validate_annotations(
    annotations: &Annotations,
    layout: &BundleLayout,
    detected: Option<MediaType>,
) -> ValidationError {
    let mut errors = ValidationError::new();

    for label in [
        MEDIATYPE_LABEL,
        MANIFESTS_LABEL,
        METADATA_LABEL,
        PACKAGE_LABEL,
        CHANNELS_LABEL,
    ] {
        let Some(value) = annotations.get(label) else {
            errors.push(BundleError::MissingAnnotation {
                label: label.to_string(),
            });
            continue;
        };
        tracing::debug!(label, value, "found annotation");

        let expected = match label {
            MEDIATYPE_LABEL => match (MediaType::from_annotation(value), detected) {
                (Some(declared), Some(found)) if declared != found => {
                    Some(found.annotation_value().to_string())
                }
                (None, found) => Some(
                    found
                        .unwrap_or(MediaType::RegistryV1)
                        .annotation_value()
                        .to_string(),
                ),
                _ => None,
            },
            MANIFESTS_LABEL => {
                Some(layout.manifests_annotation()).filter(|expected| expected != value)
            }
            METADATA_LABEL => Some(layout.metadata_annotation()).filter(|expected| expected != value),
            _ => {
                if value.is_empty() {
                    errors.push(BundleError::EmptyAnnotation {
                        label: label.to_string(),
                    });
                }
                None
            }
        };

        if let Some(expected) = expected {
            errors.push(BundleError::UnexpectedAnnotationValue {
                label: label.to_string(),
                expected,
                actual: value.to_string(),
            });
        }
    }

    if let Some(channels) = annotations.get(CHANNELS_LABEL).filter(|c| !c.is_empty()) {
        match validate_channels(channels, annotations.get(CHANNEL_DEFAULT_LABEL)) {
            Ok(default) => tracing::debug!(channels, default = %default, "resolved default channel"),
            Err(e) => errors.push(e),
        }
    }

    errors
}

/// Check a comma-separated channel list and an optional default channel.
///
/// Returns the effective default: the declared one, or the first channel.
pub fn validate_channels(channels: &str, default: Option<&str>) -> Result<String, BundleError> {
    let list: Vec<&str> = channels.split(',').map(str::trim).collect();
    if list.iter().any(|c| c.is_empty()) {
        return Err(BundleError::InvalidChannels {
            channels: channels.to_string(),
        });
    }
    match default.filter(|d| !d.is_empty()) {
        None => Ok(list[0].to_string()),
        Some(d) if list.contains(&d) => Ok(d.to_string()),
        Some(d) => Err(BundleError::DefaultChannelNotListed {
            channels: channels.to_string(),
            default: d.to_string(),
        }),
    }
}
