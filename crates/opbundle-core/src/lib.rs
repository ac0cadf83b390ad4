//! # opbundle-core — Foundational Types for Bundle Validation
//!
//! Shared vocabulary for every validator in the workspace. A bundle is a
//! directory of Kubernetes manifests; validating it produces either nothing
//! or one [`ValidationError`] that lists every [`BundleError`] found in the
//! pass, in the order the checks discovered them.
//!
//! ## Key Design Principles
//!
//! 1. **One aggregate per pass.** Validators append to a call-local
//!    [`ValidationError`] and convert it with [`ValidationError::into_result`]
//!    at the end. An empty aggregate is never returned as an error.
//!
//! 2. **Generic first, typed second.** Every file is decoded into a
//!    [`ManifestObject`] (kind, apiVersion, metadata, opaque field tree)
//!    before any kind-specific projection is attempted.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `opbundle-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod manifest;

pub use error::{BundleError, ValidationError};
pub use manifest::{yaml_to_json_value, ManifestObject, ObjectMeta};
