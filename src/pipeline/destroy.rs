//! Destroy: tear an environment down in reverse order.

use rand::Rng;
use tracing::info;

use super::{Pipeline, PipelineError, application_stack_name, base_stack_name, validate_name};
use crate::artifact_store::ArtifactStore;
use crate::provider::CloudProvider;
use crate::software::SoftwareSource;
use crate::stack::{Clock, DeleteClassifier};

impl<P, S, W, R, C> Pipeline<P, S, W, R, C>
where
    P: CloudProvider,
    S: ArtifactStore,
    W: SoftwareSource,
    R: Rng,
    C: Clock,
{
    /// Tears environment `name` down.
    ///
    /// The director user's access keys go first so the base stack can
    /// delete the user, then the application stack, then the base stack,
    /// and finally the key pair. Each stack delete is awaited before the
    /// next step starts. The state directory is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidName`] before any side effect,
    /// otherwise the error of the first step that fails.
    pub async fn destroy(&self, name: &str) -> Result<(), PipelineError> {
        validate_name(name)?;

        let base_stack = base_stack_name(name);
        let base = self.locator().get_base_stack_resources(&base_stack).await?;

        let user = base.director_user.as_str();
        let key_ids = self.provider().list_access_keys(user).await?;
        for key_id in &key_ids {
            info!(user, key_id = %key_id, "deleting access key");
            self.provider().delete_access_key(user, key_id).await?;
        }

        let application_stack = application_stack_name(name);
        self.teardown(&application_stack).await?;
        self.teardown(&base_stack).await?;

        info!(environment = name, "deleting key pair");
        self.provider().delete_key_pair(name).await?;

        info!(environment = name, "finished");
        Ok(())
    }

    async fn teardown(&self, stack: &str) -> Result<(), PipelineError> {
        self.stacks.delete(stack).await?;
        info!(stack, "waiting for stack deletion");
        self.stacks
            .wait(stack, &DeleteClassifier, self.stack_timeout)
            .await?;
        info!(stack, "stack deleted");
        Ok(())
    }
}
