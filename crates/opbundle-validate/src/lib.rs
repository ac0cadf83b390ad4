//! # opbundle-validate — Bundle Validation Engine
//!
//! Validates operator bundles (a ClusterServiceVersion, its
//! CustomResourceDefinitions, RBAC objects and an optional dependency
//! declaration) before they are admitted to a catalog. Every validator
//! reports all violations of a pass at once through
//! [`opbundle_core::ValidationError`].
//!
//! ## Pipeline
//!
//! ```text
//! ImageValidator::pull_bundle_image    -> ImageReader (external)
//! ImageValidator::validate_bundle_format
//!     layout dirs -> loader -> format::detect_media_type
//!                 -> format::validate_annotations
//!                 -> dependency::validate_dependencies_file
//! ImageValidator::validate_bundle_content
//!     loader -> content::validate_content
//! ```
//!
//! ## Crate Policy
//!
//! - Read-only on the filesystem; no state shared between calls.
//! - Validation entry points return `Ok(())` or a non-empty
//!   `ValidationError`, never a bare IO error.

pub mod content;
pub mod dependency;
pub mod format;
pub mod image;
pub mod kinds;
pub mod layout;
pub mod loader;

pub use dependency::{Dependency, GvkDependency, LabelDependency, PackageDependency};
pub use format::{Annotations, MediaType};
pub use image::{ImageReader, ImageReaderError, ImageValidator};
pub use layout::BundleLayout;
pub use loader::{load_manifests, LoadedManifests};
