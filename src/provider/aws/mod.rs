//! AWS implementation of [`CloudProvider`] backed by the official SDK.

mod compute;
mod error;
mod identity;
mod stacks;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudformation::config::Credentials;

use crate::provider::{
    AccessKey, CloudProvider, ImageFilter, ImageSummary, ProviderFuture, StackDescription,
    StackRequest, StackResource, SubnetDetails,
};

const CREDENTIALS_SOURCE: &str = "strata-config";

/// Connection settings for [`AwsProvider`].
#[derive(Clone, Default, Eq, PartialEq)]
pub struct AwsProviderConfig {
    /// Region hosting the environment.
    pub region: String,
    /// Static access key identifier. When absent the SDK's default
    /// credential chain is used.
    pub access_key_id: Option<String>,
    /// Static secret access key paired with `access_key_id`.
    pub secret_access_key: Option<String>,
    /// Optional endpoint override, used when targeting a local emulator.
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for AwsProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsProviderConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

/// Provider that drives `CloudFormation`, EC2, and IAM.
#[derive(Clone, Debug)]
pub struct AwsProvider {
    cloudformation: aws_sdk_cloudformation::Client,
    ec2: aws_sdk_ec2::Client,
    iam: aws_sdk_iam::Client,
}

impl AwsProvider {
    /// Loads SDK configuration once and builds a client per service.
    pub async fn connect(config: &AwsProviderConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
                None,
                CREDENTIALS_SOURCE,
            ));
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        Self {
            cloudformation: aws_sdk_cloudformation::Client::new(&sdk_config),
            ec2: aws_sdk_ec2::Client::new(&sdk_config),
            iam: aws_sdk_iam::Client::new(&sdk_config),
        }
    }
}

impl CloudProvider for AwsProvider {
    fn describe_stack<'a>(&'a self, stack: &'a str) -> ProviderFuture<'a, StackDescription> {
        Box::pin(async move { self.fetch_stack(stack).await })
    }

    fn create_stack<'a>(&'a self, request: &'a StackRequest) -> ProviderFuture<'a, ()> {
        Box::pin(async move { self.submit_create(request).await })
    }

    fn update_stack<'a>(&'a self, request: &'a StackRequest) -> ProviderFuture<'a, ()> {
        Box::pin(async move { self.submit_update(request).await })
    }

    fn delete_stack<'a>(&'a self, stack: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move { self.submit_delete(stack).await })
    }

    fn describe_stack_resources<'a>(
        &'a self,
        stack: &'a str,
    ) -> ProviderFuture<'a, Vec<StackResource>> {
        Box::pin(async move { self.fetch_stack_resources(stack).await })
    }

    fn describe_subnet<'a>(
        &'a self,
        subnet_id: &'a str,
    ) -> ProviderFuture<'a, Option<SubnetDetails>> {
        Box::pin(async move { self.fetch_subnet(subnet_id).await })
    }

    fn describe_images<'a>(
        &'a self,
        filter: &'a ImageFilter,
    ) -> ProviderFuture<'a, Vec<ImageSummary>> {
        Box::pin(async move { self.fetch_images(filter).await })
    }

    fn create_key_pair<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, String> {
        Box::pin(async move { self.issue_key_pair(name).await })
    }

    fn delete_key_pair<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, ()> {
        Box::pin(async move { self.revoke_key_pair(name).await })
    }

    fn create_access_key<'a>(&'a self, user: &'a str) -> ProviderFuture<'a, AccessKey> {
        Box::pin(async move { self.issue_access_key(user).await })
    }

    fn list_access_keys<'a>(&'a self, user: &'a str) -> ProviderFuture<'a, Vec<String>> {
        Box::pin(async move { self.fetch_access_key_ids(user).await })
    }

    fn delete_access_key<'a>(
        &'a self,
        user: &'a str,
        key_id: &'a str,
    ) -> ProviderFuture<'a, ()> {
        Box::pin(async move { self.revoke_access_key(user, key_id).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_debug_omits_secret() {
        let config = AwsProviderConfig {
            region: String::from("us-east-1"),
            access_key_id: Some(String::from("AKIAEXAMPLE")),
            secret_access_key: Some(String::from("hunter2")),
            endpoint_url: None,
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("us-east-1"));
        assert!(!rendered.contains("hunter2"));
    }
}
