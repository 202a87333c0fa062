//! Boot: bring an environment up from an empty state directory.

use std::collections::BTreeMap;

use rand::Rng;
use shell_escape::unix::escape;
use tracing::info;

use super::{Pipeline, PipelineError, application_stack_name, base_stack_name, validate_name};
use crate::artifact_store::{ArtifactStore, keys};
use crate::cloud_config::{CloudConfigAssembler, DirectorTarget, application_logical_ids};
use crate::credentials::DirectorCredentials;
use crate::images::latest_nat_image;
use crate::manifest::{ManifestAssembler, ManifestInputs};
use crate::provider::CloudProvider;
use crate::resources::BaseStackResources;
use crate::software::{SoftwareSource, resolve_software};
use crate::stack::{Clock, UpsertClassifier};
use crate::templates::{
    APPLICATION_STACK_TEMPLATE, BASE_STACK_TEMPLATE, application_parameters, base_parameters,
};

const DIRECTOR_ADMIN: &str = "admin";
const CONSOLE_HINT: &str = "check the CloudFormation console for details";

impl<P, S, W, R, C> Pipeline<P, S, W, R, C>
where
    P: CloudProvider,
    S: ArtifactStore,
    W: SoftwareSource,
    R: Rng,
    C: Clock,
{
    /// Provisions environment `name`.
    ///
    /// Creates the key pair, converges the base stack, issues the director's
    /// access key, writes the director manifest, converges the application
    /// stack, and writes its cloud config. Every artifact lands in the store
    /// under the keys in [`crate::artifact_store::keys`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidName`] or
    /// [`PipelineError::StateNotEmpty`] before any side effect, otherwise
    /// the error of the first step that fails.
    pub async fn boot(&mut self, name: &str) -> Result<(), PipelineError> {
        validate_name(name)?;
        if !self.store.is_empty()? {
            return Err(PipelineError::StateNotEmpty);
        }

        info!(environment = name, "creating key pair");
        let private_key = self.provider().create_key_pair(name).await?;
        self.store.set(keys::SSH_KEY, private_key.as_bytes())?;

        info!("looking for the latest NAT image");
        let nat_image = latest_nat_image(self.provider()).await?;
        info!(image = %nat_image, "found NAT image");

        let base_stack = base_stack_name(name);
        let base_parameters = BTreeMap::from([
            (base_parameters::NAT_INSTANCE_AMI.to_owned(), nat_image),
            (base_parameters::KEY_NAME.to_owned(), name.to_owned()),
        ]);
        self.converge(&base_stack, BASE_STACK_TEMPLATE, &base_parameters)
            .await?;

        let base = self.locator().get_base_stack_resources(&base_stack).await?;
        self.store.set(keys::BOSH_IP, base.director_ip.as_bytes())?;
        self.store.set(keys::NAT_IP, base.nat_ip.as_bytes())?;

        let credentials = self.write_director_manifest(name, &base).await?;

        let application_stack = application_stack_name(name);
        let application_parameters = BTreeMap::from([
            (
                application_parameters::VPC_ID.to_owned(),
                base.vpc_id.clone(),
            ),
            (
                application_parameters::NAT_INSTANCE.to_owned(),
                base.nat_instance_id.clone(),
            ),
            (
                application_parameters::PUBLICLY_ROUTABLE_SUBNET_ID.to_owned(),
                base.subnet_id.clone(),
            ),
            (
                application_parameters::AVAILABILITY_ZONE.to_owned(),
                base.availability_zone.clone(),
            ),
        ]);
        self.converge(
            &application_stack,
            APPLICATION_STACK_TEMPLATE,
            &application_parameters,
        )
        .await?;

        self.write_cloud_config(&application_stack, &base, &credentials).await?;

        info!(environment = name, "finished");
        Ok(())
    }

    async fn converge(
        &self,
        stack: &str,
        template: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<(), PipelineError> {
        info!(stack, "upserting stack, {CONSOLE_HINT}");
        let outcome = self.stacks.upsert(stack, template, parameters).await?;
        info!(stack, ?outcome, "waiting for stack");
        self.stacks
            .wait(stack, &UpsertClassifier, self.stack_timeout)
            .await?;
        info!(stack, "stack update complete");
        Ok(())
    }

    async fn write_director_manifest(
        &mut self,
        name: &str,
        base: &BaseStackResources,
    ) -> Result<DirectorCredentials, PipelineError> {
        info!(user = %base.director_user, "issuing director access key");
        let access_key = self
            .provider()
            .create_access_key(&base.director_user)
            .await?;

        info!("generating director manifest");
        let software = resolve_software(&self.software).await?;
        let credentials = self.credentials.director_credentials();
        let manifest = self.manifests.build(&ManifestInputs {
            key_name: name,
            software: &software,
            credentials: &credentials,
            resources: base,
            access_key: &access_key,
        })?;
        let rendered = ManifestAssembler::render(&manifest)?;

        self.store.set(keys::DIRECTOR_MANIFEST, rendered.as_bytes())?;
        self.store
            .set(keys::BOSH_PASSWORD, credentials.admin.as_bytes())?;
        let environment = bosh_environment(base, &credentials.admin);
        self.store
            .set(keys::BOSH_ENVIRONMENT, environment.as_bytes())?;
        Ok(credentials)
    }

    async fn write_cloud_config(
        &self,
        application_stack: &str,
        base: &BaseStackResources,
        credentials: &DirectorCredentials,
    ) -> Result<(), PipelineError> {
        info!(stack = application_stack, "generating cloud config");
        let locator = self.locator();
        let resources = locator.get_stack_resources(application_stack).await?;
        let subnet_id = resources.require(application_logical_ids::SUBNET)?;
        let subnet = locator.describe_subnet(subnet_id).await?;
        let director = DirectorTarget {
            target: base.director_ip.clone(),
            user: DIRECTOR_ADMIN.to_owned(),
            password: credentials.admin.clone(),
        };
        let config = CloudConfigAssembler.build(
            &resources,
            &subnet.cidr_block,
            &base.availability_zone,
            &director,
        )?;
        let rendered = CloudConfigAssembler::render(&config)?;
        self.store.set(keys::CLOUD_CONFIG, rendered.as_bytes())?;
        Ok(())
    }
}

/// Shell exports for targeting the new director.
pub(super) fn bosh_environment(base: &BaseStackResources, password: &str) -> String {
    [
        ("BOSH_TARGET", base.director_ip.as_str()),
        ("BOSH_USER", DIRECTOR_ADMIN),
        ("BOSH_PASSWORD", password),
        ("NAT_IP", base.nat_ip.as_str()),
    ]
    .into_iter()
    .map(|(variable, value)| format!("export {variable}={}", escape(value.into())))
    .collect::<Vec<_>>()
    .join("\n")
}
