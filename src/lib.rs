//! Core library for the strata environment provisioner.
//!
//! An environment is two `CloudFormation` stacks layered on each other: a
//! base stack holding the network, NAT, and director identity, and an
//! application stack that builds on the base stack's outputs. The
//! [`pipeline`] module drives the provider through Boot and Destroy, and
//! writes every artifact an operator needs into an [`ArtifactStore`].

pub mod artifact_store;
pub mod cloud_config;
pub mod config;
pub mod credentials;
pub mod images;
pub mod manifest;
pub mod pipeline;
pub mod provider;
pub mod resources;
pub mod software;
pub mod stack;
pub mod templates;
pub mod test_support;

pub use artifact_store::{ArtifactStore, ArtifactStoreError, FilesystemArtifactStore};
pub use config::{ConfigError, StrataConfig};
pub use pipeline::{Pipeline, PipelineError, ShowField};
pub use provider::{AwsProvider, CloudProvider, ProviderError};
pub use resources::{BaseStackResources, ResourceLocator, ResourceMap};
pub use stack::{DeleteClassifier, StackError, StackManager, StatusClassifier, UpsertClassifier};
