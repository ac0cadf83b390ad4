//! Property tests for the counting guarantees of the content and
//! dependency validators.

use std::collections::BTreeSet;
use std::path::Path;

use proptest::prelude::*;

use opbundle_core::ManifestObject;
use opbundle_validate::content::validate_content;
use opbundle_validate::dependency::validate_dependencies;
use opbundle_validate::{LoadedManifests, MediaType};

fn crd_name(i: u8) -> String {
    format!("widgets{i}.example.com")
}

fn csv_object(owned: &BTreeSet<u8>) -> ManifestObject {
    let mut yaml = String::from(
        "apiVersion: operators.coreos.com/v1alpha1\nkind: ClusterServiceVersion\nmetadata:\n  name: widgets.v1.0.0\nspec:\n  installModes:\n    - type: AllNamespaces\n      supported: true\n  customresourcedefinitions:\n    owned:\n",
    );
    if owned.is_empty() {
        yaml.push_str("      []\n");
    }
    for i in owned {
        yaml.push_str(&format!(
            "      - name: {}\n        version: v1\n        kind: Widget{i}\n",
            crd_name(*i)
        ));
    }
    ManifestObject::from_yaml_str(&yaml, Path::new("csv.yaml")).unwrap()
}

fn crd_object(i: u8) -> ManifestObject {
    let yaml = format!(
        "apiVersion: apiextensions.k8s.io/v1\nkind: CustomResourceDefinition\nmetadata:\n  name: {}\nspec:\n  group: example.com\n  names:\n    kind: Widget{i}\n  versions:\n    - name: v1\n      served: true\n      storage: true\n",
        crd_name(i)
    );
    ManifestObject::from_yaml_str(&yaml, Path::new("crd.yaml")).unwrap()
}

proptest! {
    #[test]
    fn crd_errors_match_symmetric_difference(
        owned in prop::collection::btree_set(0u8..10, 0..6),
        present in prop::collection::btree_set(0u8..10, 0..6),
    ) {
        let mut objects = vec![csv_object(&owned)];
        objects.extend(present.iter().map(|i| crd_object(*i)));
        let loaded = LoadedManifests { objects, ..LoadedManifests::default() };

        let messages = validate_content(&loaded, MediaType::RegistryV1).messages();
        let expected: Vec<u8> = owned.symmetric_difference(&present).copied().collect();
        prop_assert_eq!(messages.len(), expected.len());

        for i in expected {
            let key = format!("{}/v1", crd_name(i));
            let wanted = if owned.contains(&i) {
                format!("owned CRD {key} not found in bundle")
            } else {
                format!("CRD {key} is present in bundle \"widgets.v1.0.0\" but not defined in CSV")
            };
            prop_assert!(messages.contains(&wanted), "missing {wanted:?} in {messages:?}");
        }

        let again = validate_content(&loaded, MediaType::RegistryV1).messages();
        prop_assert_eq!(messages, again);
    }

    #[test]
    fn gvk_errors_count_empty_fields(
        group in prop_oneof![Just(String::new()), "[a-z]{1,8}"],
        version in prop_oneof![Just(String::new()), "v[0-9]"],
        kind in prop_oneof![Just(String::new()), "[A-Z][a-z]{1,8}"],
    ) {
        let expected = [&group, &version, &kind].iter().filter(|f| f.is_empty()).count();
        let entry = serde_json::json!({
            "type": "olm.gvk",
            "value": {"group": group, "version": version, "kind": kind},
        });
        prop_assert_eq!(validate_dependencies(&[entry]).len(), expected);
    }
}
