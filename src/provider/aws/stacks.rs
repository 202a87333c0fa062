//! `CloudFormation` calls.

use aws_sdk_cloudformation::types::{Capability, Parameter, Tag};

use super::AwsProvider;
use super::error::{Present, missing_field};
use crate::provider::{ProviderError, StackDescription, StackRequest, StackResource};

fn parameters(request: &StackRequest) -> Vec<Parameter> {
    request
        .parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn tags(request: &StackRequest) -> Result<Vec<Tag>, ProviderError> {
    request
        .tags
        .iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|err| ProviderError::uncoded(err.to_string()))
        })
        .collect()
}

fn capabilities(request: &StackRequest) -> Vec<Capability> {
    request
        .capabilities
        .iter()
        .map(|value| Capability::from(value.as_str()))
        .collect()
}

impl AwsProvider {
    pub(super) async fn fetch_stack(&self, stack: &str) -> Result<StackDescription, ProviderError> {
        let output = self
            .cloudformation
            .describe_stacks()
            .stack_name(stack)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        let Some(found) = output.stacks().first() else {
            return Err(ProviderError::stack_missing(stack));
        };

        let status = found
            .stack_status()
            .present()
            .map(|value| value.as_str().to_owned())
            .ok_or_else(|| missing_field("DescribeStacks", "a stack status"))?;

        Ok(StackDescription {
            stack_id: found.stack_id().present().map(str::to_owned),
            status,
        })
    }

    pub(super) async fn submit_create(&self, request: &StackRequest) -> Result<(), ProviderError> {
        self.cloudformation
            .create_stack()
            .stack_name(&request.name)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters(request)))
            .set_tags(Some(tags(request)?))
            .set_capabilities(Some(capabilities(request)))
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;
        Ok(())
    }

    pub(super) async fn submit_update(&self, request: &StackRequest) -> Result<(), ProviderError> {
        self.cloudformation
            .update_stack()
            .stack_name(&request.name)
            .template_body(&request.template_body)
            .set_parameters(Some(parameters(request)))
            .set_capabilities(Some(capabilities(request)))
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;
        Ok(())
    }

    pub(super) async fn submit_delete(&self, stack: &str) -> Result<(), ProviderError> {
        self.cloudformation
            .delete_stack()
            .stack_name(stack)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;
        Ok(())
    }

    pub(super) async fn fetch_stack_resources(
        &self,
        stack: &str,
    ) -> Result<Vec<StackResource>, ProviderError> {
        let output = self
            .cloudformation
            .describe_stack_resources()
            .stack_name(stack)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        output
            .stack_resources()
            .iter()
            .map(|resource| {
                let logical_id = resource
                    .logical_resource_id()
                    .present()
                    .ok_or_else(|| missing_field("DescribeStackResources", "a logical id"))?;
                Ok(StackResource {
                    logical_id: logical_id.to_owned(),
                    physical_id: resource
                        .physical_resource_id()
                        .present()
                        .unwrap_or_default()
                        .to_owned(),
                    stack_id: resource
                        .stack_id()
                        .present()
                        .unwrap_or_default()
                        .to_owned(),
                })
            })
            .collect()
    }
}
