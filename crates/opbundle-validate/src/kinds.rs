//! # Typed Projections
//!
//! The two kinds the content checks need to read in depth. Each projection
//! pulls only the fields it uses out of a [`ManifestObject`]; a field with
//! the wrong shape is a [`BundleError::FieldDecode`] for that object, not a
//! failure of the pass.

use serde::Deserialize;

use opbundle_core::{BundleError, ManifestObject};

/// Kind name of a ClusterServiceVersion.
pub const CSV_KIND: &str = "ClusterServiceVersion";
/// Kind name of a CustomResourceDefinition.
pub const CRD_KIND: &str = "CustomResourceDefinition";

/// Annotation holding example custom resources as a JSON array.
pub const ALM_EXAMPLES_ANNOTATION: &str = "alm-examples";

/// Install mode types a CSV may declare.
pub const INSTALL_MODE_TYPES: [&str; 4] =
    ["OwnNamespace", "SingleNamespace", "MultiNamespace", "AllNamespaces"];

/// One entry of `spec.installModes`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallMode {
    /// Install mode type, e.g. `AllNamespaces`.
    #[serde(rename = "type", default)]
    pub mode_type: String,
    /// Whether the operator supports this mode.
    #[serde(default)]
    pub supported: bool,
}

/// One entry of `spec.customresourcedefinitions.owned` / `.required`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrdDescription {
    /// Full CRD name, `<plural>.<group>`.
    #[serde(default)]
    pub name: String,
    /// Version name.
    #[serde(default)]
    pub version: String,
    /// Kind served by the CRD.
    #[serde(default)]
    pub kind: String,
}

impl CrdDescription {
    /// `<name>/<version>` key used to match CSV entries against CRD objects.
    pub fn key(&self) -> String {
        crd_key(&self.name, &self.version)
    }
}

/// Build a `<name>/<version>` CRD key.
pub fn crd_key(name: &str, version: &str) -> String {
    format!("{name}/{version}")
}

/// The parts of a ClusterServiceVersion the content checks read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterServiceVersion {
    /// `metadata.name`.
    pub name: String,
    /// `spec.version`.
    pub version: Option<String>,
    /// `spec.installModes`.
    pub install_modes: Vec<InstallMode>,
    /// `spec.customresourcedefinitions.owned`.
    pub owned: Vec<CrdDescription>,
    /// `spec.customresourcedefinitions.required`.
    pub required: Vec<CrdDescription>,
    /// `metadata.annotations["alm-examples"]`.
    pub alm_examples: Option<String>,
}

impl ClusterServiceVersion {
    /// Project a CSV object.
    pub fn from_object(obj: &ManifestObject) -> Result<Self, BundleError> {
        Ok(Self {
            name: obj.name().to_string(),
            version: obj.field("spec.version")?,
            install_modes: obj.field("spec.installModes")?.unwrap_or_default(),
            owned: obj
                .field("spec.customresourcedefinitions.owned")?
                .unwrap_or_default(),
            required: obj
                .field("spec.customresourcedefinitions.required")?
                .unwrap_or_default(),
            alm_examples: obj.metadata().annotations.get(ALM_EXAMPLES_ANNOTATION).cloned(),
        })
    }
}

/// One entry of `spec.versions` of a CRD.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrdVersion {
    /// Version name, e.g. `v1beta2`.
    #[serde(default)]
    pub name: String,
    /// Served by the API server.
    #[serde(default)]
    pub served: bool,
    /// The storage version.
    #[serde(default)]
    pub storage: bool,
}

/// The parts of a CustomResourceDefinition the content checks read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResourceDefinition {
    /// `metadata.name`.
    pub name: String,
    /// `spec.group`.
    pub group: String,
    /// `spec.names.kind`.
    pub kind: String,
    /// `spec.versions`.
    pub versions: Vec<CrdVersion>,
    /// `spec.version`, the single-version form of older CRDs.
    pub legacy_version: Option<String>,
}

impl CustomResourceDefinition {
    /// Project a CRD object.
    pub fn from_object(obj: &ManifestObject) -> Result<Self, BundleError> {
        Ok(Self {
            name: obj.name().to_string(),
            group: obj.field("spec.group")?.unwrap_or_default(),
            kind: obj.field("spec.names.kind")?.unwrap_or_default(),
            versions: obj.field("spec.versions")?.unwrap_or_default(),
            legacy_version: obj.field("spec.version")?,
        })
    }

    /// Every version name repeated in `spec.versions`, once each, in the
    /// order the repeat is first seen.
    pub fn duplicate_versions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut dups: Vec<&str> = Vec::new();
        for v in &self.versions {
            let name = v.name.as_str();
            if seen.contains(&name) {
                if !dups.contains(&name) {
                    dups.push(name);
                }
            } else {
                seen.push(name);
            }
        }
        dups
    }

    /// `<name>/<version>` for every version this CRD provides, without
    /// repeats.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        let names = self
            .versions
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.legacy_version.as_deref());
        for version in names.filter(|v| !v.is_empty()) {
            let key = crd_key(&self.name, version);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn object(yaml: &str) -> ManifestObject {
        ManifestObject::from_yaml_str(yaml, Path::new("obj.yaml")).unwrap()
    }

    #[test]
    fn projects_csv() {
        let csv = ClusterServiceVersion::from_object(&object(
            r#"
apiVersion: operators.coreos.com/v1alpha1
kind: ClusterServiceVersion
metadata:
  name: etcdoperator.v0.9.4
  annotations:
    alm-examples: "[]"
spec:
  version: 0.9.4
  installModes:
    - type: OwnNamespace
      supported: true
  customresourcedefinitions:
    owned:
      - name: etcdclusters.etcd.database.coreos.com
        version: v1beta2
        kind: EtcdCluster
    required:
      - name: vaults.vault.security.coreos.com
        version: v1alpha1
        kind: VaultService
"#,
        ))
        .unwrap();
        assert_eq!(csv.name, "etcdoperator.v0.9.4");
        assert_eq!(csv.version.as_deref(), Some("0.9.4"));
        assert_eq!(csv.install_modes.len(), 1);
        assert!(csv.install_modes[0].supported);
        assert_eq!(csv.owned[0].key(), "etcdclusters.etcd.database.coreos.com/v1beta2");
        assert_eq!(csv.required[0].kind, "VaultService");
        assert_eq!(csv.alm_examples.as_deref(), Some("[]"));
    }

    #[test]
    fn csv_without_spec_projects_empty() {
        let csv = ClusterServiceVersion::from_object(&object(
            "apiVersion: operators.coreos.com/v1alpha1\nkind: ClusterServiceVersion\nmetadata:\n  name: x\n",
        ))
        .unwrap();
        assert!(csv.install_modes.is_empty());
        assert!(csv.owned.is_empty());
    }

    #[test]
    fn csv_with_scalar_install_modes_fails_projection() {
        let err = ClusterServiceVersion::from_object(&object(
            "apiVersion: operators.coreos.com/v1alpha1\nkind: ClusterServiceVersion\nmetadata:\n  name: x\nspec:\n  installModes: all\n",
        ))
        .unwrap_err();
        match err {
            BundleError::FieldDecode { field, .. } => assert_eq!(field, "spec.installModes"),
            other => panic!("expected FieldDecode, got {other:?}"),
        }
    }

    #[test]
    fn crd_duplicates_reported_once_per_name() {
        let crd = CustomResourceDefinition::from_object(&object(
            r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: etcdclusters.etcd.database.coreos.com
spec:
  group: etcd.database.coreos.com
  names:
    kind: EtcdCluster
  versions:
    - name: v1beta2
    - name: v1beta2
    - name: v1
    - name: v1beta2
"#,
        ))
        .unwrap();
        assert_eq!(crd.duplicate_versions(), vec!["v1beta2"]);
        assert_eq!(
            crd.keys(),
            vec![
                "etcdclusters.etcd.database.coreos.com/v1beta2".to_string(),
                "etcdclusters.etcd.database.coreos.com/v1".to_string(),
            ]
        );
        assert_eq!(crd.kind, "EtcdCluster");
    }

    #[test]
    fn legacy_single_version_crd_has_a_key() {
        let crd = CustomResourceDefinition::from_object(&object(
            "apiVersion: apiextensions.k8s.io/v1beta1\nkind: CustomResourceDefinition\nmetadata:\n  name: a.b.c\nspec:\n  group: b.c\n  version: v1alpha1\n",
        ))
        .unwrap();
        assert_eq!(crd.keys(), vec!["a.b.c/v1alpha1".to_string()]);
        assert!(crd.duplicate_versions().is_empty());
    }
}
