//! # Manifest Loader
//!
//! Reads every regular file of one directory and decodes it as a
//! [`ManifestObject`]. Files that fail to decode contribute an error to
//! the pass and loading carries on with the next file. Only an unreadable
//! directory stops the loader.
//!
//! Files are visited in file-name order so repeated passes over the same
//! directory report identical errors in identical order.

use std::path::{Path, PathBuf};

use opbundle_core::{BundleError, ManifestObject, ValidationError};

/// Everything one directory produced.
#[derive(Debug, Default)]
pub struct LoadedManifests {
    /// Successfully decoded objects, in file-name order.
    pub objects: Vec<ManifestObject>,
    /// Read and decode failures, in file-name order.
    pub errors: ValidationError,
    /// Number of regular files visited.
    pub file_count: usize,
    /// Files that were not structured documents at all (syntax errors,
    /// scalars, missing kind). Field-level failures are not counted.
    pub unstructured_count: usize,
}

impl LoadedManifests {
    /// Objects of the given kind.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a ManifestObject> + 'a {
        self.objects.iter().filter(move |o| o.kind() == kind)
    }
}

/// Load every regular file in `dir`.
///
/// # Errors
///
/// Returns [`BundleError::DirectoryUnreadable`] if `dir` cannot be listed.
pub fn load_manifests(dir: &Path) -> Result<LoadedManifests, BundleError> {
    let unreadable = |e: std::io::Error| BundleError::DirectoryUnreadable {
        path: dir.display().to_string(),
        reason: e.to_string(),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut loaded = LoadedManifests {
        file_count: files.len(),
        ..LoadedManifests::default()
    };

    for path in &files {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                loaded.unstructured_count += 1;
                loaded.errors.push(BundleError::FileUnreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match ManifestObject::from_yaml_str(&content, path) {
            Ok(obj) => {
                tracing::debug!(
                    kind = obj.kind(),
                    name = obj.name(),
                    file = %path.display(),
                    "decoded manifest"
                );
                loaded.objects.push(obj);
            }
            Err(e) => {
                if !matches!(e, BundleError::FieldDecode { .. }) {
                    loaded.unstructured_count += 1;
                }
                tracing::debug!(file = %path.display(), error = %e, "manifest failed to decode");
                loaded.errors.push(e);
            }
        }
    }

    Ok(loaded)
}
