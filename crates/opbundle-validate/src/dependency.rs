//! # Dependency Declarations
//!
//! The optional dependencies file lists what a bundle needs from the
//! cluster or catalog. Each entry carries a `type` discriminator and a
//! `value`; the discriminator selects one of three variants, anything else
//! is unsupported.
//!
//! ```yaml
//! dependencies:
//!   - type: olm.gvk
//!     value:
//!       group: etcd.database.coreos.com
//!       version: v1beta2
//!       kind: EtcdCluster
//!   - type: olm.package
//!     value:
//!       packageName: prometheus
//!       version: ">=0.27.0"
//!   - type: olm.label
//!     value:
//!       label: "tier=backend"
//! ```
//!
//! Field checks within one entry are independent: an entry with three
//! empty fields yields three errors.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use opbundle_core::{yaml_to_json_value, BundleError, ValidationError};

/// Discriminator of a GVK dependency.
pub const GVK_TYPE: &str = "olm.gvk";
/// Discriminator of a package dependency.
pub const PACKAGE_TYPE: &str = "olm.package";
/// Discriminator of a label dependency.
pub const LABEL_TYPE: &str = "olm.label";

/// Requires an API (group/version/kind) to be served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GvkDependency {
    /// API group.
    #[serde(default)]
    pub group: String,
    /// API version.
    #[serde(default)]
    pub version: String,
    /// Kind.
    #[serde(default)]
    pub kind: String,
}

/// Requires another package at a version or version range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDependency {
    /// Package name.
    #[serde(default)]
    pub package_name: String,
    /// Exact version or version range.
    #[serde(default)]
    pub version: String,
}

/// Requires a label to be provided by some other bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelDependency {
    /// The label.
    #[serde(default)]
    pub label: String,
}

/// A decoded dependency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// `olm.gvk`.
    Gvk(GvkDependency),
    /// `olm.package`.
    Package(PackageDependency),
    /// `olm.label`.
    Label(LabelDependency),
}

impl Dependency {
    /// Every field violation of this entry.
    pub fn validate(&self) -> Vec<BundleError> {
        let mut errs = Vec::new();
        match self {
            Dependency::Gvk(gvk) => {
                if gvk.group.is_empty() {
                    errs.push(BundleError::EmptyGvkGroup);
                }
                if gvk.version.is_empty() {
                    errs.push(BundleError::EmptyGvkVersion);
                }
                if gvk.kind.is_empty() {
                    errs.push(BundleError::EmptyGvkKind);
                }
            }
            Dependency::Package(pkg) => {
                if pkg.package_name.is_empty() {
                    errs.push(BundleError::EmptyPackageName);
                }
                if pkg.version.is_empty() {
                    errs.push(BundleError::EmptyPackageVersion);
                } else if !is_valid_version_range(&pkg.version) {
                    errs.push(BundleError::InvalidSemver);
                }
            }
            Dependency::Label(label) => {
                if label.label.is_empty() {
                    errs.push(BundleError::EmptyLabel);
                }
            }
        }
        errs
    }

    /// The discriminator this variant is written with.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dependency::Gvk(_) => GVK_TYPE,
            Dependency::Package(_) => PACKAGE_TYPE,
            Dependency::Label(_) => LABEL_TYPE,
        }
    }
}

/// An entry as written, before the discriminator is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDependency {
    /// The `type` discriminator.
    #[serde(rename = "type", default)]
    pub dep_type: String,
    /// The variant payload.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RawDependency {
    /// Read one entry of the `dependencies` list.
    ///
    /// An entry that is not a mapping, or whose `type` is not a string, is a
    /// [`BundleError::DependencyDecode`] for that entry alone.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, BundleError> {
        Self::deserialize(value).map_err(|e| BundleError::DependencyDecode {
            dep_type: match value.get("type") {
                Some(serde_json::Value::String(t)) => t.clone(),
                Some(other) => other.to_string(),
                None => "<unknown>".to_string(),
            },
            reason: e.to_string(),
        })
    }

    /// Interpret the discriminator and decode the payload.
    pub fn decode(&self) -> Result<Dependency, BundleError> {
        match self.dep_type.as_str() {
            GVK_TYPE => self.payload().map(Dependency::Gvk),
            PACKAGE_TYPE => self.payload().map(Dependency::Package),
            LABEL_TYPE => self.payload().map(Dependency::Label),
            other => Err(BundleError::UnsupportedDependencyType {
                dep_type: other.to_string(),
            }),
        }
    }

    fn payload<T: DeserializeOwned + Default>(&self) -> Result<T, BundleError> {
        Option::<T>::deserialize(&self.value)
            .map(Option::unwrap_or_default)
            .map_err(|e| BundleError::DependencyDecode {
                dep_type: self.dep_type.clone(),
                reason: e.to_string(),
            })
    }
}

#[derive(Deserialize)]
struct DependenciesDocument {
    #[serde(default)]
    dependencies: Vec<serde_json::Value>,
}

/// Parse the text of a dependencies file into its entries, still undecoded.
///
/// Only the document shape is checked here; each entry is decoded on its
/// own by [`validate_dependencies`].
pub fn parse_dependencies(content: &str) -> Result<Vec<serde_json::Value>, BundleError> {
    let unparseable = |reason: String| BundleError::DependenciesUnparseable { reason };
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| unparseable(e.to_string()))?;
    if yaml.is_null() {
        return Ok(Vec::new());
    }
    let json = yaml_to_json_value(&yaml).map_err(unparseable)?;
    let doc: DependenciesDocument =
        serde_json::from_value(json).map_err(|e| unparseable(e.to_string()))?;
    Ok(doc.dependencies)
}

/// Validate every entry; errors keep entry order, then field order.
pub fn validate_dependencies(entries: &[serde_json::Value]) -> ValidationError {
    let mut errors = ValidationError::new();
    for (i, entry) in entries.iter().enumerate() {
        match RawDependency::from_value(entry).and_then(|raw| raw.decode()) {
            Ok(dep) => {
                let errs = dep.validate();
                tracing::debug!(index = i, dep_type = dep.type_name(), errors = errs.len(), "checked dependency");
                errors.extend(errs);
            }
            Err(e) => errors.push(e),
        }
    }
    errors
}

/// Read, parse and validate a dependencies file. A missing file is valid.
pub fn validate_dependencies_file(path: &Path) -> ValidationError {
    if !path.exists() {
        tracing::debug!(file = %path.display(), "no dependencies file");
        return ValidationError::new();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return ValidationError::from(BundleError::DependenciesUnreadable {
                reason: e.to_string(),
            })
        }
    };
    match parse_dependencies(&content) {
        Ok(entries) => validate_dependencies(&entries),
        Err(e) => ValidationError::from(e),
    }
}

/// Whether `version` is an exact semantic version or a version range.
///
/// Ranges are alternatives joined by `||`; each alternative is a list of
/// comparators separated by commas or whitespace (`>=1.0.0 <2.0.0`).
pub fn is_valid_version_range(version: &str) -> bool {
    let version = version.trim();
    if version.is_empty() {
        return false;
    }
    if semver::Version::parse(version).is_ok() {
        return true;
    }
    version.split("||").all(|alternative| {
        let alternative = alternative.trim();
        if alternative.is_empty() {
            return false;
        }
        if semver::VersionReq::parse(alternative).is_ok() {
            return true;
        }
        let comparators = join_comparators(alternative);
        !comparators.is_empty() && semver::VersionReq::parse(&comparators).is_ok()
    })
}

/// Rewrite `>= 1.0.0 <2.0.0` as `>=1.0.0, <2.0.0`.
fn join_comparators(alternative: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in alternative.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^' | '!')) {
            pending_op.push_str(token);
            continue;
        }
        parts.push(format!("{}{token}", std::mem::take(&mut pending_op)));
    }
    if !pending_op.is_empty() {
        return String::new();
    }
    parts.join(", ")
}
