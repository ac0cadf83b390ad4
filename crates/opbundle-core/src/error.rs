//! # Error Types
//!
//! Every check in the engine reports a [`BundleError`]. A validation pass
//! collects them into a [`ValidationError`], which is the only error type
//! the validation entry points ever return.
//!
//! ## Design
//!
//! - Each variant renders to one human-readable line. Several of these
//!   lines are consumed verbatim by catalog tooling, so the wording of the
//!   existing templates must not drift.
//! - Structural failures (unreadable directory, missing CSV) and
//!   accumulated failures (one field, one cross-reference) share the same
//!   type; the tier only decides whether the stage keeps going.

use std::fmt;

use thiserror::Error;

/// A single violation found while validating a bundle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    // -- Filesystem ---------------------------------------------------------
    /// A directory could not be listed.
    #[error("Unable to read directory {path}: {reason}")]
    DirectoryUnreadable {
        /// Directory that failed to list.
        path: String,
        /// Underlying IO failure.
        reason: String,
    },

    /// A regular file inside the bundle could not be read.
    #[error("Unable to read file {path}: {reason}")]
    FileUnreadable {
        /// File that failed to read.
        path: String,
        /// Underlying IO failure.
        reason: String,
    },

    /// The bundle root has no manifests subdirectory.
    #[error("Unable to locate manifests directory")]
    ManifestsDirNotFound,

    /// The bundle root has no metadata subdirectory.
    #[error("Unable to locate metadata directory")]
    MetadataDirNotFound,

    // -- Decoding -----------------------------------------------------------
    /// A file is not a structured document at all.
    #[error("Unable to decode file {path}: {reason}")]
    Decode {
        /// File that failed to decode.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// A field of a decoded object has the wrong shape for its kind.
    #[error("cannot decode field {field} of {kind} in {path}: {reason}")]
    FieldDecode {
        /// Object kind, or `<unknown>` when the kind itself failed.
        kind: String,
        /// Dotted path of the offending field.
        field: String,
        /// File the object came from.
        path: String,
        /// Deserializer message.
        reason: String,
    },

    // -- Format / annotations -----------------------------------------------
    /// The manifests directory holds no regular files.
    #[error("The directory {path} contains no yaml files")]
    EmptyManifestsDir {
        /// Manifests directory.
        path: String,
    },

    /// The manifests directory does not look like any known bundle format.
    #[error("Unable to determine media type for manifests directory {path}")]
    MediaTypeUndetermined {
        /// Manifests directory.
        path: String,
    },

    /// The annotations file could not be read.
    #[error("Unable to read annotations.yaml file: {reason}")]
    AnnotationsUnreadable {
        /// Underlying IO failure.
        reason: String,
    },

    /// The annotations file is not a valid annotations document.
    #[error("Unable to parse annotations.yaml file: {reason}")]
    AnnotationsUnparseable {
        /// Parser message.
        reason: String,
    },

    /// A required annotation label is absent.
    #[error("Missing annotation {label:?}")]
    MissingAnnotation {
        /// Annotation label.
        label: String,
    },

    /// An annotation has a value other than the one the layout requires.
    #[error("Expecting annotation {label:?} to have value {expected:?} instead of {actual:?}")]
    UnexpectedAnnotationValue {
        /// Annotation label.
        label: String,
        /// Required value.
        expected: String,
        /// Value found in the file.
        actual: String,
    },

    /// An annotation that must carry a value is empty.
    #[error("Expecting annotation {label:?} to have non-empty value")]
    EmptyAnnotation {
        /// Annotation label.
        label: String,
    },

    /// The channel list contains an empty element.
    #[error("invalid channels are provided: {channels}")]
    InvalidChannels {
        /// Raw comma-separated channel list.
        channels: String,
    },

    /// The default channel is not one of the declared channels.
    #[error("The channel list {channels} doesn't contain default channel {default}")]
    DefaultChannelNotListed {
        /// Raw comma-separated channel list.
        channels: String,
        /// Declared default channel.
        default: String,
    },

    // -- Content ------------------------------------------------------------
    /// An object kind outside the media type's allow-list.
    #[error("{kind} is not supported type for {media_type} bundle")]
    UnsupportedKind {
        /// Offending object kind.
        kind: String,
        /// Human-readable media type name.
        media_type: String,
    },

    /// No ClusterServiceVersion in the manifests directory.
    #[error("no ClusterServiceVersion found in manifests directory")]
    CsvNotFound,

    /// More than one ClusterServiceVersion in the manifests directory.
    #[error("found {count} ClusterServiceVersions in manifests directory, expected exactly one")]
    MultipleCsvs {
        /// Number of CSV objects found.
        count: usize,
    },

    /// The CSV declares no install modes.
    #[error("install modes not found")]
    InstallModesNotFound,

    /// An install mode type outside the known set.
    #[error("install mode type {mode_type:?} is invalid")]
    InvalidInstallModeType {
        /// Declared install mode type.
        mode_type: String,
    },

    /// An install mode type listed more than once.
    #[error("install mode type {mode_type:?} is duplicated")]
    DuplicateInstallModeType {
        /// Declared install mode type.
        mode_type: String,
    },

    /// Every install mode is declared unsupported.
    #[error("none of the install mode types are supported")]
    NoSupportedInstallModes,

    /// An owned CRD entry of the CSV lacks one of its identifying fields.
    #[error("owned CRD at index {index} has empty {field}")]
    OwnedCrdFieldEmpty {
        /// Position in `spec.customresourcedefinitions.owned`.
        index: usize,
        /// `name`, `version` or `kind`.
        field: &'static str,
    },

    /// The `alm-examples` annotation is not JSON.
    #[error("invalid alm-examples annotation: {reason}")]
    InvalidAlmExamples {
        /// Parser message.
        reason: String,
    },

    /// A CRD lists the same version name twice.
    #[error("{crd} must contain unique version name {version}")]
    DuplicateCrdVersion {
        /// CRD object name.
        crd: String,
        /// Repeated version name.
        version: String,
    },

    /// The CSV owns a CRD that is not in the bundle.
    #[error("owned CRD {key} not found in bundle")]
    OwnedCrdNotFound {
        /// `<crd name>/<version>`.
        key: String,
    },

    /// The bundle ships a CRD that the CSV does not own.
    #[error("CRD {key} is present in bundle {csv:?} but not defined in CSV")]
    CrdNotDefinedInCsv {
        /// `<crd name>/<version>`.
        key: String,
        /// Name of the bundle's CSV.
        csv: String,
    },

    /// The CSV both owns and requires the same CRD.
    #[error("CRD {key} is both owned and required by CSV {csv:?}")]
    CrdOwnedAndRequired {
        /// `<crd name>/<version>`.
        key: String,
        /// Name of the bundle's CSV.
        csv: String,
    },

    // -- Dependencies -------------------------------------------------------
    /// The dependencies file could not be read.
    #[error("Unable to read dependencies.yaml file: {reason}")]
    DependenciesUnreadable {
        /// Underlying IO failure.
        reason: String,
    },

    /// The dependencies file is not a valid dependencies document.
    #[error("Unable to parse dependencies.yaml file: {reason}")]
    DependenciesUnparseable {
        /// Parser message.
        reason: String,
    },

    /// A dependency entry with an unknown `type` discriminator.
    #[error("Unsupported dependency type {dep_type}")]
    UnsupportedDependencyType {
        /// The discriminator as written.
        dep_type: String,
    },

    /// A dependency value whose fields have the wrong shape.
    #[error("Unable to decode {dep_type} dependency value: {reason}")]
    DependencyDecode {
        /// The discriminator of the entry.
        dep_type: String,
        /// Deserializer message.
        reason: String,
    },

    /// GVK dependency without a group.
    #[error("API Group is empty")]
    EmptyGvkGroup,

    /// GVK dependency without a version.
    #[error("API Version is empty")]
    EmptyGvkVersion,

    /// GVK dependency without a kind.
    #[error("API Kind is empty")]
    EmptyGvkKind,

    /// Package dependency without a package name.
    #[error("Package name is empty")]
    EmptyPackageName,

    /// Package dependency without a version.
    #[error("Package version is empty")]
    EmptyPackageVersion,

    /// Package dependency whose version is not semver syntax.
    #[error("Invalid semver format version")]
    InvalidSemver,

    /// Label dependency without a label.
    #[error("Label information is empty")]
    EmptyLabel,
}

/// Ordered collection of every violation found in one validation pass.
///
/// Insertion order is discovery order. A value returned to a caller is
/// never empty: use [`ValidationError::into_result`] to turn a finished
/// accumulator into `Ok(())` or `Err(self)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<BundleError>,
}

impl ValidationError {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one violation.
    pub fn push(&mut self, error: BundleError) {
        self.errors.push(error);
    }

    /// Append every violation of another pass, preserving its order.
    pub fn merge(&mut self, other: ValidationError) {
        self.errors.extend(other.errors);
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns a slice of all violations in discovery order.
    pub fn errors(&self) -> &[BundleError] {
        &self.errors
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<BundleError> {
        self.errors
    }

    /// Rendered message of every violation, in order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// `Ok(())` when nothing was found, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<BundleError> for ValidationError {
    fn from(error: BundleError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<BundleError> for ValidationError {
    fn extend<T: IntoIterator<Item = BundleError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle validation failed with {} error(s):", self.errors.len())?;
        for e in &self.errors {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
