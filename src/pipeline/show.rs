//! Show: print stored artifacts for an environment.

use std::io::Write;

use rand::Rng;

use super::{Pipeline, PipelineError};
use crate::artifact_store::{ArtifactStore, keys};
use crate::provider::CloudProvider;
use crate::software::SoftwareSource;
use crate::stack::Clock;

/// Artifact Show can print.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShowField {
    /// Private SSH key for the director and NAT instances.
    SshKey,
    /// Director elastic IP.
    BoshIp,
    /// Director admin password.
    BoshPassword,
    /// Shell exports for targeting the director.
    BoshEnvironment,
}

impl ShowField {
    /// Store key holding this artifact.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SshKey => keys::SSH_KEY,
            Self::BoshIp => keys::BOSH_IP,
            Self::BoshPassword => keys::BOSH_PASSWORD,
            Self::BoshEnvironment => keys::BOSH_ENVIRONMENT,
        }
    }
}

impl<P, S, W, R, C> Pipeline<P, S, W, R, C>
where
    P: CloudProvider,
    S: ArtifactStore,
    W: SoftwareSource,
    R: Rng,
    C: Clock,
{
    /// Writes each selected artifact to `out`, in the order given, one
    /// artifact per line.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NothingToShow`] when `fields` is empty,
    /// [`PipelineError::Store`] when an artifact is missing, and
    /// [`PipelineError::Output`] when writing fails.
    pub fn show(&self, fields: &[ShowField], out: &mut impl Write) -> Result<(), PipelineError> {
        show_artifacts(&self.store, fields, out)
    }
}

/// Writes each selected artifact from `store` to `out` without touching
/// the provider.
///
/// # Errors
///
/// Same as [`Pipeline::show`].
pub fn show_artifacts<S>(
    store: &S,
    fields: &[ShowField],
    out: &mut impl Write,
) -> Result<(), PipelineError>
where
    S: ArtifactStore + ?Sized,
{
    if fields.is_empty() {
        return Err(PipelineError::NothingToShow);
    }
    for field in fields {
        let value = store.get(field.key())?;
        write_artifact(out, &value).map_err(|err| PipelineError::Output {
            message: err.to_string(),
        })?;
    }
    Ok(())
}

fn write_artifact(out: &mut impl Write, value: &[u8]) -> std::io::Result<()> {
    out.write_all(value)?;
    if !value.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}
