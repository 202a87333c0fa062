//! EC2 calls: key pairs, subnets, and image discovery.

use aws_sdk_ec2::types::{Filter, Image};

use super::AwsProvider;
use super::error::missing_field;
use crate::provider::{ImageFilter, ImageSummary, ProviderError, SubnetDetails};

fn summarise(image: &Image) -> Option<ImageSummary> {
    let root_volume_type = image
        .block_device_mappings()
        .first()
        .and_then(|mapping| mapping.ebs())
        .and_then(|ebs| ebs.volume_type())
        .map(|volume| volume.as_str().to_owned());

    Some(ImageSummary {
        image_id: image.image_id()?.to_owned(),
        architecture: image
            .architecture()
            .map(|arch| arch.as_str().to_owned())
            .unwrap_or_default(),
        root_volume_type,
        creation_date: image.creation_date().unwrap_or_default().to_owned(),
    })
}

impl AwsProvider {
    pub(super) async fn fetch_subnet(
        &self,
        subnet_id: &str,
    ) -> Result<Option<SubnetDetails>, ProviderError> {
        let output = self
            .ec2
            .describe_subnets()
            .subnet_ids(subnet_id)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        Ok(output.subnets().first().and_then(|subnet| {
            Some(SubnetDetails {
                availability_zone: subnet.availability_zone()?.to_owned(),
                cidr_block: subnet.cidr_block()?.to_owned(),
            })
        }))
    }

    pub(super) async fn fetch_images(
        &self,
        filter: &ImageFilter,
    ) -> Result<Vec<ImageSummary>, ProviderError> {
        let output = self
            .ec2
            .describe_images()
            .owners(&filter.owner)
            .filters(
                Filter::builder()
                    .name("name")
                    .values(&filter.name_pattern)
                    .build(),
            )
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        Ok(output.images().iter().filter_map(summarise).collect())
    }

    pub(super) async fn issue_key_pair(&self, name: &str) -> Result<String, ProviderError> {
        let output = self
            .ec2
            .create_key_pair()
            .key_name(name)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        output
            .key_material()
            .map(str::to_owned)
            .ok_or_else(|| missing_field("CreateKeyPair", "key material"))
    }

    pub(super) async fn revoke_key_pair(&self, name: &str) -> Result<(), ProviderError> {
        self.ec2
            .delete_key_pair()
            .key_name(name)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;
        Ok(())
    }
}
