//! # Manifest Objects
//!
//! A bundle file is decoded in two steps. First the YAML (or JSON) text is
//! turned into a generic `serde_json::Value` tree; then the object header
//! (`kind`, `apiVersion`, `metadata`) is projected out of it. Kind-specific
//! fields stay in the opaque tree until a validator asks for them through
//! [`ManifestObject::field`], which reports a shape mismatch as a
//! [`BundleError::FieldDecode`] naming the offending dotted path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::BundleError;

/// Projected `metadata` block common to every Kubernetes object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    /// `metadata.name`.
    #[serde(default)]
    pub name: String,
    /// `metadata.namespace`, absent for cluster-scoped objects.
    #[serde(default)]
    pub namespace: Option<String>,
    /// `metadata.labels`.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// `metadata.annotations`.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// A decoded bundle file: a generic Kubernetes object.
///
/// Identity within a bundle directory is `(kind, name)`. The value is
/// immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestObject {
    kind: String,
    api_version: String,
    metadata: ObjectMeta,
    fields: Value,
    path: PathBuf,
}

impl ManifestObject {
    /// Decode a YAML or JSON document read from `path`.
    ///
    /// # Errors
    ///
    /// [`BundleError::Decode`] when the text is not a single structured
    /// document or not a mapping; [`BundleError::FieldDecode`] when a header
    /// field has the wrong type.
    pub fn from_yaml_str(content: &str, path: &Path) -> Result<Self, BundleError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| BundleError::Decode {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let value = yaml_to_json_value(&yaml).map_err(|reason| BundleError::Decode {
            path: path.display().to_string(),
            reason,
        })?;
        Self::from_value(value, path)
    }

    /// Project the object header out of an already decoded tree.
    pub fn from_value(value: Value, path: &Path) -> Result<Self, BundleError> {
        let decode = |reason: &str| BundleError::Decode {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };
        match &value {
            Value::Object(_) => {}
            Value::Null => return Err(decode("empty document")),
            _ => return Err(decode("document is not a mapping")),
        }

        let header = |field: &str| -> Result<String, BundleError> {
            match project_field::<String>(&value, field) {
                Ok(Some(s)) if !s.is_empty() => Ok(s),
                Ok(_) => Err(decode(&format!("Object '{field}' is missing"))),
                Err(reason) => Err(BundleError::FieldDecode {
                    kind: "<unknown>".to_string(),
                    field: field.to_string(),
                    path: path.display().to_string(),
                    reason,
                }),
            }
        };
        let kind = header("kind")?;
        let api_version = header("apiVersion")?;

        let mut object = Self {
            kind,
            api_version,
            metadata: ObjectMeta::default(),
            fields: value,
            path: path.to_path_buf(),
        };

        // Field by field so the error names the exact path.
        let mut metadata = ObjectMeta::default();
        if let Some(name) = object.field::<String>("metadata.name")? {
            metadata.name = name;
        }
        metadata.namespace = object.field::<String>("metadata.namespace")?;
        if let Some(labels) = object.field("metadata.labels")? {
            metadata.labels = labels;
        }
        if let Some(annotations) = object.field("metadata.annotations")? {
            metadata.annotations = annotations;
        }
        object.metadata = metadata;

        Ok(object)
    }

    /// Object kind, e.g. `ClusterServiceVersion`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Object apiVersion, e.g. `operators.coreos.com/v1alpha1`.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `metadata.name`, empty when the document omits it.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// `metadata.namespace`.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    /// The projected metadata block.
    pub fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    /// The full decoded tree.
    pub fn fields(&self) -> &Value {
        &self.fields
    }

    /// File the object was decoded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserialize the value at a dotted path into `T`.
    ///
    /// Returns `Ok(None)` when the path is absent or null.
    pub fn field<T: DeserializeOwned>(&self, dotted: &str) -> Result<Option<T>, BundleError> {
        project_field(&self.fields, dotted).map_err(|reason| BundleError::FieldDecode {
            kind: self.kind.clone(),
            field: dotted.to_string(),
            path: self.path.display().to_string(),
            reason,
        })
    }
}

/// Walk a dotted path (`spec.install.strategy`) through nested mappings.
pub fn lookup<'a>(root: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Deserialize the value at `dotted` into `T`; null and absent are `None`.
pub fn project_field<T: DeserializeOwned>(root: &Value, dotted: &str) -> Result<Option<T>, String> {
    match lookup(root, dotted) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => T::deserialize(v).map(Some).map_err(|e| e.to_string()),
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Manifests only use the JSON-compatible subset of YAML. Tags are
/// dropped; non-string scalar keys are rendered to strings.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    use serde_yaml::Value as Y;

    Ok(match yaml {
        Y::Null => Value::Null,
        Y::Bool(b) => Value::Bool(*b),
        Y::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                let f = n.as_f64().ok_or_else(|| format!("unsupported YAML number: {n:?}"))?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))?
            }
        }
        Y::String(s) => Value::String(s.clone()),
        Y::Sequence(seq) => Value::Array(
            seq.iter()
                .map(yaml_to_json_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Y::Mapping(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Y::String(s) => s.clone(),
                    Y::Number(n) => n.to_string(),
                    Y::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                out.insert(key, yaml_to_json_value(v)?);
            }
            Value::Object(out)
        }
        Y::Tagged(tagged) => yaml_to_json_value(&tagged.value)?,
    })
}
