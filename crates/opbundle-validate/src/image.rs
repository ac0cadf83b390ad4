//! # Image Validator
//!
//! Entry points of the engine. [`ImageValidator::pull_bundle_image`] hands
//! an image reference to the external [`ImageReader`] and returns its
//! result untouched; the two validation entry points compose the loader,
//! the format classifier and the content/dependency validators and return
//! one aggregated [`ValidationError`].
//!
//! Each call is independent: the validator holds only its layout and an
//! optional reader, so one instance can serve concurrent callers working
//! on different directories.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use opbundle_core::{BundleError, ValidationError};

use crate::content::validate_content;
use crate::dependency::validate_dependencies_file;
use crate::format::{detect_media_type, validate_annotations, Annotations, MediaType};
use crate::layout::BundleLayout;
use crate::loader::load_manifests;

/// Failure reported by an image reader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageReaderError {
    /// The validator was built without an image reader.
    #[error("no image reader configured")]
    Unavailable,

    /// An external tool exited unsuccessfully.
    #[error("{tool} {step} failed: {reason}")]
    Tool {
        /// Tool binary, e.g. `docker`.
        tool: String,
        /// Step that failed, e.g. `pull`.
        step: String,
        /// Captured stderr or spawn failure.
        reason: String,
    },

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

/// Materializes the filesystem of a bundle image into a local directory.
///
/// Implementations may block on the network; the engine imposes no
/// timeout and does not retry.
pub trait ImageReader: Send + Sync {
    /// Pull `image` and unpack its contents into `output_dir`.
    fn get_image_data(&self, image: &str, output_dir: &Path) -> Result<(), ImageReaderError>;
}

/// Composes the bundle validators behind three entry points.
#[derive(Clone, Default)]
pub struct ImageValidator {
    image_reader: Option<Arc<dyn ImageReader>>,
    layout: BundleLayout,
}

impl std::fmt::Debug for ImageValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageValidator")
            .field("image_reader", &self.image_reader.is_some())
            .field("layout", &self.layout)
            .finish()
    }
}

impl ImageValidator {
    /// A validator with the default layout and no image reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `reader` for [`ImageValidator::pull_bundle_image`].
    pub fn with_image_reader(mut self, reader: Arc<dyn ImageReader>) -> Self {
        self.image_reader = Some(reader);
        self
    }

    /// Use a non-default bundle layout.
    pub fn with_layout(mut self, layout: BundleLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The layout in use.
    pub fn layout(&self) -> &BundleLayout {
        &self.layout
    }

    /// Pull `image` into `output_dir` through the configured reader.
    ///
    /// The reader's error is returned as is.
    pub fn pull_bundle_image(&self, image: &str, output_dir: &Path) -> Result<(), ImageReaderError> {
        let reader = self.image_reader.as_ref().ok_or(ImageReaderError::Unavailable)?;
        tracing::debug!(image, dir = %output_dir.display(), "pulling bundle image");
        reader.get_image_data(image, output_dir)
    }

    /// Validate the layout, annotations and dependency file of a bundle
    /// root.
    pub fn validate_bundle_format(&self, dir: &Path) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        let manifests_dir = self.layout.manifests_path(dir);
        let metadata_dir = self.layout.metadata_path(dir);

        if let Err(e) = std::fs::read_dir(dir) {
            errors.push(BundleError::DirectoryUnreadable {
                path: dir.display().to_string(),
                reason: e.to_string(),
            });
            return errors.into_result();
        }
        if manifests_dir.is_dir() {
            tracing::debug!(dir = %manifests_dir.display(), "found manifests directory");
        } else {
            errors.push(BundleError::ManifestsDirNotFound);
        }
        if metadata_dir.is_dir() {
            tracing::debug!(dir = %metadata_dir.display(), "found metadata directory");
        } else {
            errors.push(BundleError::MetadataDirNotFound);
        }
        if !errors.is_empty() {
            return errors.into_result();
        }

        let detected = match load_manifests(&manifests_dir)
            .and_then(|loaded| detect_media_type(&loaded, &manifests_dir))
        {
            Ok(media_type) => {
                tracing::debug!(%media_type, "detected media type");
                Some(media_type)
            }
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let annotations_path = self.layout.annotations_path(dir);
        let content = match std::fs::read_to_string(&annotations_path) {
            Ok(c) => c,
            Err(e) => {
                errors.push(BundleError::AnnotationsUnreadable {
                    reason: e.to_string(),
                });
                return errors.into_result();
            }
        };
        let annotations = match Annotations::parse(&content) {
            Ok(a) => a,
            Err(reason) => {
                errors.push(BundleError::AnnotationsUnparseable { reason });
                return errors.into_result();
            }
        };
        errors.merge(validate_annotations(&annotations, &self.layout, detected));

        errors.merge(validate_dependencies_file(&self.layout.dependencies_path(dir)));

        log_outcome("format", dir, &errors);
        errors.into_result()
    }

    /// Validate the objects of a manifests directory as a registry+v1
    /// bundle.
    pub fn validate_bundle_content(&self, manifests_dir: &Path) -> Result<(), ValidationError> {
        self.validate_bundle_content_as(manifests_dir, MediaType::RegistryV1)
    }

    /// Validate the objects of a manifests directory for a known media
    /// type.
    pub fn validate_bundle_content_as(
        &self,
        manifests_dir: &Path,
        media_type: MediaType,
    ) -> Result<(), ValidationError> {
        tracing::debug!(dir = %manifests_dir.display(), %media_type, "validating bundle contents");
        let loaded = load_manifests(manifests_dir)?;
        let errors = validate_content(&loaded, media_type);
        log_outcome("content", manifests_dir, &errors);
        errors.into_result()
    }
}

fn log_outcome(pass: &str, dir: &Path, errors: &ValidationError) {
    if errors.is_empty() {
        tracing::info!(pass, dir = %dir.display(), "bundle valid");
    } else {
        tracing::info!(pass, dir = %dir.display(), errors = errors.len(), "bundle invalid");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeImageReader {
        result: Option<ImageReaderError>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ImageReader for FakeImageReader {
        fn get_image_data(&self, image: &str, output_dir: &Path) -> Result<(), ImageReaderError> {
            self.calls
                .lock()
                .unwrap()
                .push((image.to_string(), output_dir.display().to_string()));
            match &self.result {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn pull_delegates_to_reader() {
        let reader = Arc::new(FakeImageReader::default());
        let validator = ImageValidator::new().with_image_reader(reader.clone());
        validator
            .pull_bundle_image("quay.io/example/bundle:0.0.1", Path::new("/tmp/dir"))
            .unwrap();
        let calls = reader.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("quay.io/example/bundle:0.0.1".to_string(), "/tmp/dir".to_string())]
        );
    }

    #[test]
    fn pull_returns_reader_error_unchanged() {
        let expected = ImageReaderError::Other("Unable to unpack image".to_string());
        let reader = Arc::new(FakeImageReader {
            result: Some(expected.clone()),
            ..FakeImageReader::default()
        });
        let validator = ImageValidator::new().with_image_reader(reader);
        let err = validator
            .pull_bundle_image("quay.io/example/bundle:0.0.1", Path::new("/tmp/dir"))
            .unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn pull_without_reader() {
        let err = ImageValidator::new()
            .pull_bundle_image("quay.io/example/bundle:0.0.1", Path::new("/tmp/dir"))
            .unwrap_err();
        assert_eq!(err, ImageReaderError::Unavailable);
    }

    #[test]
    fn content_of_missing_directory_is_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageValidator::new()
            .validate_bundle_content(&dir.path().join("manifests"))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(matches!(err.errors()[0], BundleError::DirectoryUnreadable { .. }));
    }

    #[test]
    fn format_of_empty_root_reports_both_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageValidator::new().validate_bundle_format(dir.path()).unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["Unable to locate manifests directory", "Unable to locate metadata directory"]
        );
    }
}
