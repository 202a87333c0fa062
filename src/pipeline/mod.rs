//! Boot, Destroy, and Show for one named environment.
//!
//! An environment is two stacks: `<name>-base` (VPC, NAT, director
//! network and identity) and `<name>-concourse` (the application subnet and
//! load balancer). Boot and Destroy are strict sequences; the first failing
//! step aborts the run and nothing already done is rolled back.

use std::sync::LazyLock;
use std::time::Duration;

use rand::Rng;
use regex::Regex;

use crate::artifact_store::ArtifactStore;
use crate::credentials::CredentialGenerator;
use crate::manifest::ManifestAssembler;
use crate::provider::CloudProvider;
use crate::resources::ResourceLocator;
use crate::software::SoftwareSource;
use crate::stack::{Clock, StackManager, TokioClock};

mod boot;
mod destroy;
mod error;
mod show;


pub use error::PipelineError;
pub use show::{ShowField, show_artifacts};

/// Pattern every environment name must match.
pub const NAME_PATTERN: &str = "^[a-zA-Z][-a-zA-Z0-9]*$";

/// Default budget for one stack change to settle.
pub const DEFAULT_STACK_TIMEOUT: Duration = Duration::from_secs(600);

static NAME_REGEX: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(NAME_PATTERN));

/// Name of the base stack for environment `name`.
#[must_use]
pub fn base_stack_name(name: &str) -> String {
    format!("{name}-base")
}

/// Name of the application stack for environment `name`.
#[must_use]
pub fn application_stack_name(name: &str) -> String {
    format!("{name}-concourse")
}

/// Checks `name` against [`NAME_PATTERN`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidName`] when the name does not match.
pub fn validate_name(name: &str) -> Result<(), PipelineError> {
    let regex = NAME_REGEX
        .as_ref()
        .map_err(|err| PipelineError::NamePattern {
            message: err.to_string(),
        })?;
    if regex.is_match(name) {
        Ok(())
    } else {
        Err(PipelineError::InvalidName {
            name: name.to_owned(),
        })
    }
}

/// Everything a pipeline run needs, constructed once by the entry point.
#[derive(Debug)]
pub struct Pipeline<P, S, W, R, C = TokioClock> {
    stacks: StackManager<P, C>,
    store: S,
    software: W,
    credentials: CredentialGenerator<R>,
    manifests: ManifestAssembler,
    stack_timeout: Duration,
}

impl<P, S, W, R, C> Pipeline<P, S, W, R, C>
where
    P: CloudProvider,
    S: ArtifactStore,
    W: SoftwareSource,
    R: Rng,
    C: Clock,
{
    /// Assembles a pipeline from its collaborators.
    #[must_use]
    pub fn new(
        stacks: StackManager<P, C>,
        store: S,
        software: W,
        credentials: CredentialGenerator<R>,
    ) -> Self {
        Self {
            stacks,
            store,
            software,
            credentials,
            manifests: ManifestAssembler::default(),
            stack_timeout: DEFAULT_STACK_TIMEOUT,
        }
    }

    /// Overrides how long each stack change may take to settle.
    #[must_use]
    pub const fn with_stack_timeout(mut self, stack_timeout: Duration) -> Self {
        self.stack_timeout = stack_timeout;
        self
    }

    /// Overrides the manifest assembler.
    #[must_use]
    pub fn with_manifest_assembler(mut self, manifests: ManifestAssembler) -> Self {
        self.manifests = manifests;
        self
    }

    const fn provider(&self) -> &P {
        self.stacks.provider()
    }

    const fn locator(&self) -> ResourceLocator<'_, P> {
        ResourceLocator::new(self.stacks.provider())
    }
}
