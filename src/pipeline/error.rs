//! Error type for the provisioning workflows.

use thiserror::Error;

use crate::artifact_store::ArtifactStoreError;
use crate::cloud_config::CloudConfigError;
use crate::images::ImageError;
use crate::manifest::ManifestError;
use crate::provider::ProviderError;
use crate::resources::ResourceError;
use crate::software::SoftwareError;
use crate::stack::StackError;

use super::NAME_PATTERN;

/// Failure of one Boot, Destroy, or Show step. Steps that completed before
/// the failure are not undone.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PipelineError {
    /// Raised before any side effect when the environment name is unusable.
    #[error("invalid name {name:?}: must match pattern {}", NAME_PATTERN)]
    InvalidName {
        /// Rejected name.
        name: String,
    },
    /// Raised when the name pattern itself fails to compile.
    #[error("name pattern failed to compile: {message}")]
    NamePattern {
        /// Compiler error text.
        message: String,
    },
    /// Raised when Boot finds artifacts from a previous environment.
    #[error("state directory must be empty")]
    StateNotEmpty,
    /// Raised when Show is asked for nothing.
    #[error("set at least one flag")]
    NothingToShow,
    /// Raised when Show cannot write to its output.
    #[error("failed to write output: {message}")]
    Output {
        /// I/O error text.
        message: String,
    },
    /// Artifact store failure.
    #[error(transparent)]
    Store(#[from] ArtifactStoreError),
    /// Stack upsert, wait, or delete failure.
    #[error(transparent)]
    Stack(#[from] StackError),
    /// Resource discovery failure.
    #[error(transparent)]
    Resources(#[from] ResourceError),
    /// NAT image discovery failure.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// Key pair or access key failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Software lookup failure.
    #[error(transparent)]
    Software(#[from] SoftwareError),
    /// Director manifest failure.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// Cloud config failure.
    #[error(transparent)]
    CloudConfig(#[from] CloudConfigError),
}
