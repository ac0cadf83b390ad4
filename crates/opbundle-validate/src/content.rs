//! # Content Validation
//!
//! Checks the objects of one manifests directory against each other and
//! against the media type. The steps run in a fixed order and none of them
//! stops another:
//!
//! 1. exactly one ClusterServiceVersion, and its required fields;
//! 2. version-name uniqueness inside every CRD;
//! 3. owned CRDs of the CSV against the CRD objects present, both ways;
//! 4. every object kind against the media type's allow-list.
//!
//! Decode errors from the loader come first in the result, so the final
//! order is the order of discovery.

use std::collections::HashSet;

use opbundle_core::{BundleError, ManifestObject, ValidationError};

use crate::format::MediaType;
use crate::kinds::{
    ClusterServiceVersion, CustomResourceDefinition, CRD_KIND, CSV_KIND, INSTALL_MODE_TYPES,
};
use crate::loader::LoadedManifests;

/// Run every content check over a loaded manifests directory.
pub fn validate_content(loaded: &LoadedManifests, media_type: MediaType) -> ValidationError {
    let mut errors = loaded.errors.clone();

    let csv = select_csv(&loaded.objects, &mut errors);
    if let Some(csv) = &csv {
        validate_csv(csv, &mut errors);
    }

    let crds = project_crds(&loaded.objects, &mut errors);
    for crd in &crds {
        for version in crd.duplicate_versions() {
            errors.push(BundleError::DuplicateCrdVersion {
                crd: crd.name.clone(),
                version: version.to_string(),
            });
        }
    }

    if let Some(csv) = &csv {
        cross_check_crds(csv, &crds, &mut errors);
    }

    for obj in &loaded.objects {
        if !media_type.supports(obj.kind()) {
            tracing::debug!(kind = obj.kind(), file = %obj.path().display(), "unsupported kind");
            errors.push(BundleError::UnsupportedKind {
                kind: obj.kind().to_string(),
                media_type: media_type.display_name().to_string(),
            });
        }
    }

    errors
}

/// The bundle's single CSV, projected. Reports a missing, repeated or
/// undecodable CSV and returns `None` in those cases.
fn select_csv(objects: &[ManifestObject], errors: &mut ValidationError) -> Option<ClusterServiceVersion> {
    let csvs: Vec<&ManifestObject> = objects.iter().filter(|o| o.kind() == CSV_KIND).collect();
    match csvs.as_slice() {
        [] => {
            errors.push(BundleError::CsvNotFound);
            None
        }
        [only] => match ClusterServiceVersion::from_object(only) {
            Ok(csv) => Some(csv),
            Err(e) => {
                tracing::warn!(file = %only.path().display(), "CSV could not be projected");
                errors.push(e);
                None
            }
        },
        many => {
            errors.push(BundleError::MultipleCsvs { count: many.len() });
            None
        }
    }
}

/// Field checks of a projected CSV.
pub fn validate_csv(csv: &ClusterServiceVersion, errors: &mut ValidationError) {
    if csv.install_modes.is_empty() {
        errors.push(BundleError::InstallModesNotFound);
    } else {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut reported: HashSet<&str> = HashSet::new();
        for mode in &csv.install_modes {
            let t = mode.mode_type.as_str();
            if !INSTALL_MODE_TYPES.contains(&t) {
                errors.push(BundleError::InvalidInstallModeType {
                    mode_type: t.to_string(),
                });
            } else if !seen.insert(t) && reported.insert(t) {
                errors.push(BundleError::DuplicateInstallModeType {
                    mode_type: t.to_string(),
                });
            }
        }
        if csv.install_modes.iter().all(|m| !m.supported) {
            errors.push(BundleError::NoSupportedInstallModes);
        }
    }

    for (index, owned) in csv.owned.iter().enumerate() {
        for (field, value) in [("name", &owned.name), ("version", &owned.version), ("kind", &owned.kind)] {
            if value.is_empty() {
                errors.push(BundleError::OwnedCrdFieldEmpty { index, field });
            }
        }
    }

    if let Some(examples) = &csv.alm_examples {
        if let Err(e) = serde_json::from_str::<serde_json::Value>(examples) {
            errors.push(BundleError::InvalidAlmExamples {
                reason: e.to_string(),
            });
        }
    }
}

fn project_crds(objects: &[ManifestObject], errors: &mut ValidationError) -> Vec<CustomResourceDefinition> {
    objects
        .iter()
        .filter(|o| o.kind() == CRD_KIND)
        .filter_map(|o| match CustomResourceDefinition::from_object(o) {
            Ok(crd) => Some(crd),
            Err(e) => {
                errors.push(e);
                None
            }
        })
        .collect()
}

/// Symmetric difference between the CSV's owned CRDs and the CRD objects
/// present, plus owned/required overlap.
pub fn cross_check_crds(
    csv: &ClusterServiceVersion,
    crds: &[CustomResourceDefinition],
    errors: &mut ValidationError,
) {
    let mut owned: Vec<String> = Vec::new();
    for desc in csv.owned.iter().filter(|d| !d.name.is_empty() && !d.version.is_empty()) {
        let key = desc.key();
        if !owned.contains(&key) {
            owned.push(key);
        }
    }

    let mut present: Vec<String> = Vec::new();
    for key in crds.iter().flat_map(CustomResourceDefinition::keys) {
        if !present.contains(&key) {
            present.push(key);
        }
    }

    for key in owned.iter().filter(|k| !present.contains(*k)) {
        errors.push(BundleError::OwnedCrdNotFound { key: key.clone() });
    }
    for key in present.iter().filter(|k| !owned.contains(*k)) {
        errors.push(BundleError::CrdNotDefinedInCsv {
            key: key.clone(),
            csv: csv.name.clone(),
        });
    }
    // A CRD that declares no version can only be matched by name.
    for crd in crds.iter().filter(|c| c.keys().is_empty()) {
        if !csv.owned.iter().any(|d| d.name == crd.name) {
            errors.push(BundleError::CrdNotDefinedInCsv {
                key: crd.name.clone(),
                csv: csv.name.clone(),
            });
        }
    }

    let mut overlap: Vec<String> = Vec::new();
    for key in csv.required.iter().map(|d| d.key()) {
        if owned.contains(&key) && !overlap.contains(&key) {
            overlap.push(key);
        }
    }
    for key in overlap {
        errors.push(BundleError::CrdOwnedAndRequired {
            key,
            csv: csv.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{CrdDescription, CrdVersion, InstallMode};

    fn csv(owned: &[(&str, &str)]) -> ClusterServiceVersion {
        ClusterServiceVersion {
            name: "etcdoperator.v0.9.4".to_string(),
            version: Some("0.9.4".to_string()),
            install_modes: vec![InstallMode {
                mode_type: "AllNamespaces".to_string(),
                supported: true,
            }],
            owned: owned
                .iter()
                .map(|(name, version)| CrdDescription {
                    name: name.to_string(),
                    version: version.to_string(),
                    kind: "Kind".to_string(),
                })
                .collect(),
            required: Vec::new(),
            alm_examples: None,
        }
    }

    fn crd(name: &str, versions: &[&str]) -> CustomResourceDefinition {
        CustomResourceDefinition {
            name: name.to_string(),
            group: "example.com".to_string(),
            kind: "Kind".to_string(),
            versions: versions
                .iter()
                .map(|v| CrdVersion {
                    name: v.to_string(),
                    served: true,
                    storage: false,
                })
                .collect(),
            legacy_version: None,
        }
    }

    fn cross(csv: &ClusterServiceVersion, crds: &[CustomResourceDefinition]) -> Vec<String> {
        let mut errors = ValidationError::new();
        cross_check_crds(csv, crds, &mut errors);
        errors.messages()
    }

    #[test]
    fn matching_sets_produce_nothing() {
        let c = csv(&[("a.example.com", "v1"), ("b.example.com", "v1")]);
        assert!(cross(&c, &[crd("a.example.com", &["v1"]), crd("b.example.com", &["v1"])]).is_empty());
    }

    #[test]
    fn both_directions_are_reported() {
        let c = csv(&[("a.example.com", "v1")]);
        let msgs = cross(&c, &[crd("b.example.com", &["v1"])]);
        assert_eq!(
            msgs,
            vec![
                "owned CRD a.example.com/v1 not found in bundle".to_string(),
                r#"CRD b.example.com/v1 is present in bundle "etcdoperator.v0.9.4" but not defined in CSV"#.to_string(),
            ]
        );
    }

    #[test]
    fn each_served_version_is_its_own_key() {
        let c = csv(&[("a.example.com", "v1")]);
        let msgs = cross(&c, &[crd("a.example.com", &["v1", "v2"])]);
        assert_eq!(
            msgs,
            vec![r#"CRD a.example.com/v2 is present in bundle "etcdoperator.v0.9.4" but not defined in CSV"#]
        );
    }

    #[test]
    fn versionless_crd_must_still_be_owned() {
        let c = csv(&[]);
        assert_eq!(
            cross(&c, &[crd("stray.example.com", &[])]),
            vec![r#"CRD stray.example.com is present in bundle "etcdoperator.v0.9.4" but not defined in CSV"#]
        );

        let c = csv(&[("stray.example.com", "v1")]);
        assert_eq!(
            cross(&c, &[crd("stray.example.com", &[])]),
            vec!["owned CRD stray.example.com/v1 not found in bundle"]
        );
    }

    #[test]
    fn owned_and_required_overlap() {
        let mut c = csv(&[("a.example.com", "v1")]);
        c.required = c.owned.clone();
        let msgs = cross(&c, &[crd("a.example.com", &["v1"])]);
        assert_eq!(
            msgs,
            vec![r#"CRD a.example.com/v1 is both owned and required by CSV "etcdoperator.v0.9.4""#]
        );
    }

    fn csv_errors(c: &ClusterServiceVersion) -> Vec<String> {
        let mut errors = ValidationError::new();
        validate_csv(c, &mut errors);
        errors.messages()
    }

    #[test]
    fn missing_install_modes() {
        let mut c = csv(&[]);
        c.install_modes.clear();
        assert_eq!(csv_errors(&c), vec!["install modes not found"]);
    }

    #[test]
    fn install_mode_type_checks() {
        let mut c = csv(&[]);
        c.install_modes = ["OwnNamespace", "OwnNamespace", "OwnNamespace", "Everywhere"]
            .iter()
            .map(|t| InstallMode {
                mode_type: t.to_string(),
                supported: false,
            })
            .collect();
        assert_eq!(
            csv_errors(&c),
            vec![
                r#"install mode type "OwnNamespace" is duplicated"#,
                r#"install mode type "Everywhere" is invalid"#,
                "none of the install mode types are supported",
            ]
        );
    }

    #[test]
    fn owned_entry_fields_and_examples() {
        let mut c = csv(&[("", "v1")]);
        c.owned[0].kind.clear();
        c.alm_examples = Some("[{".to_string());
        let msgs = csv_errors(&c);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0], "owned CRD at index 0 has empty name");
        assert_eq!(msgs[1], "owned CRD at index 0 has empty kind");
        assert!(msgs[2].starts_with("invalid alm-examples annotation"));
    }
}
