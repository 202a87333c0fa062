//! IAM access key calls.

use super::AwsProvider;
use super::error::{Present, missing_field};
use crate::provider::{AccessKey, ProviderError};

impl AwsProvider {
    pub(super) async fn issue_access_key(&self, user: &str) -> Result<AccessKey, ProviderError> {
        let output = self
            .iam
            .create_access_key()
            .user_name(user)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        let key = output
            .access_key()
            .present()
            .ok_or_else(|| missing_field("CreateAccessKey", "an access key"))?;

        Ok(AccessKey {
            id: key.access_key_id().present().unwrap_or_default().to_owned(),
            secret: key
                .secret_access_key()
                .present()
                .unwrap_or_default()
                .to_owned(),
        })
    }

    pub(super) async fn fetch_access_key_ids(
        &self,
        user: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let output = self
            .iam
            .list_access_keys()
            .user_name(user)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;

        Ok(output
            .access_key_metadata()
            .iter()
            .filter_map(|metadata| metadata.access_key_id().present().map(str::to_owned))
            .collect())
    }

    pub(super) async fn revoke_access_key(
        &self,
        user: &str,
        key_id: &str,
    ) -> Result<(), ProviderError> {
        self.iam
            .delete_access_key()
            .user_name(user)
            .access_key_id(key_id)
            .send()
            .await
            .map_err(|err| ProviderError::from_sdk(&err))?;
        Ok(())
    }
}
