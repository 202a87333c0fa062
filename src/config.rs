//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::DEFAULT_CREDENTIAL_LENGTH;
use crate::manifest::{DEFAULT_INSTANCE_TYPE, ManifestAssembler};
use crate::provider::AwsProviderConfig;
use crate::software::DEFAULT_BOSH_IO_URL;

const DEFAULT_STACK_WAIT_TIMEOUT_SECS: u64 = 600;
const CONFIG_FILE: &str = "strata.toml";
const SECTION: &str = "strata";

/// Settings for reaching AWS and bosh.io, merged from defaults,
/// configuration files, and `STRATA_*` environment variables.
#[derive(Clone, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "STRATA",
    discovery(
        app_name = "strata",
        env_var = "STRATA_CONFIG_PATH",
        config_file_name = "strata.toml",
        dotfile_name = ".strata.toml",
        project_file_name = "strata.toml"
    )
)]
pub struct StrataConfig {
    /// AWS region hosting the environment. Required.
    #[ortho_config(default = String::new())]
    pub region: String,
    /// Static access key id. When both keys are absent the AWS default
    /// credential chain applies.
    pub access_key_id: Option<String>,
    /// Static secret access key paired with `access_key_id`.
    pub secret_access_key: Option<String>,
    /// Endpoint override for every AWS service, used against emulators.
    pub endpoint_url: Option<String>,
    /// Seconds each stack change may take before Boot or Destroy gives up.
    #[ortho_config(default = DEFAULT_STACK_WAIT_TIMEOUT_SECS)]
    pub stack_wait_timeout_secs: u64,
    /// Root of the bosh.io API.
    #[ortho_config(default = DEFAULT_BOSH_IO_URL.to_owned())]
    pub bosh_io_url: String,
    /// Length of each generated director secret.
    #[ortho_config(default = DEFAULT_CREDENTIAL_LENGTH)]
    pub credential_length: usize,
    /// EC2 instance type for the director VM.
    #[ortho_config(default = DEFAULT_INSTANCE_TYPE.to_owned())]
    pub director_instance_type: String,
}

impl std::fmt::Debug for StrataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrataConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("endpoint_url", &self.endpoint_url)
            .field("stack_wait_timeout_secs", &self.stack_wait_timeout_secs)
            .field("bosh_io_url", &self.bosh_io_url)
            .field("credential_length", &self.credential_length)
            .field("director_instance_type", &self.director_instance_type)
            .finish_non_exhaustive()
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn hint(&self) -> String {
        format!(
            "set {} or add {} to [{SECTION}] in {CONFIG_FILE}",
            self.env_var, self.toml_key
        )
    }
}

const REGION: FieldMetadata = FieldMetadata::new("AWS region", "STRATA_REGION", "region");
const ACCESS_KEY_ID: FieldMetadata =
    FieldMetadata::new("AWS access key id", "STRATA_ACCESS_KEY_ID", "access_key_id");
const SECRET_ACCESS_KEY: FieldMetadata = FieldMetadata::new(
    "AWS secret access key",
    "STRATA_SECRET_ACCESS_KEY",
    "secret_access_key",
);
const STACK_WAIT_TIMEOUT: FieldMetadata = FieldMetadata::new(
    "stack wait timeout",
    "STRATA_STACK_WAIT_TIMEOUT_SECS",
    "stack_wait_timeout_secs",
);
const BOSH_IO_URL: FieldMetadata =
    FieldMetadata::new("bosh.io URL", "STRATA_BOSH_IO_URL", "bosh_io_url");
const CREDENTIAL_LENGTH: FieldMetadata = FieldMetadata::new(
    "credential length",
    "STRATA_CREDENTIAL_LENGTH",
    "credential_length",
);
const DIRECTOR_INSTANCE_TYPE: FieldMetadata = FieldMetadata::new(
    "director instance type",
    "STRATA_DIRECTOR_INSTANCE_TYPE",
    "director_instance_type",
);

impl StrataConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("strata")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn reject_zero(is_zero: bool, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if is_zero {
            return Err(ConfigError::InvalidValue(format!(
                "{} must be greater than zero: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and the configuration file key that supply each value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required value is empty
    /// or only one of the two static keys is set, and
    /// [`ConfigError::InvalidValue`] when a numeric setting is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.region, &REGION)?;
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => {
                Self::require_field(id, &ACCESS_KEY_ID)?;
                Self::require_field(secret, &SECRET_ACCESS_KEY)?;
            }
            (Some(_), None) => Self::require_field("", &SECRET_ACCESS_KEY)?,
            (None, Some(_)) => Self::require_field("", &ACCESS_KEY_ID)?,
            (None, None) => {}
        }
        Self::require_field(&self.bosh_io_url, &BOSH_IO_URL)?;
        Self::require_field(&self.director_instance_type, &DIRECTOR_INSTANCE_TYPE)?;
        Self::reject_zero(self.stack_wait_timeout_secs == 0, &STACK_WAIT_TIMEOUT)?;
        Self::reject_zero(self.credential_length == 0, &CREDENTIAL_LENGTH)?;
        Ok(())
    }

    /// Connection settings for [`crate::provider::AwsProvider`].
    #[must_use]
    pub fn provider_config(&self) -> AwsProviderConfig {
        AwsProviderConfig {
            region: self.region.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    /// Manifest assembler sized for the configured director.
    #[must_use]
    pub fn manifest_assembler(&self) -> ManifestAssembler {
        ManifestAssembler::default().with_instance_type(self.director_instance_type.as_str())
    }

    /// Budget for one stack change to settle.
    #[must_use]
    pub const fn stack_timeout(&self) -> Duration {
        Duration::from_secs(self.stack_wait_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value is out of range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
