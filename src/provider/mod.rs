//! Cloud provider abstraction consumed by the stack lifecycle, resource
//! discovery, and provisioning pipeline.
//!
//! Every remote call funnels through [`CloudProvider`] so the orchestration
//! layers can be exercised against scripted doubles. Failures are normalised
//! into [`ProviderError`], which keeps the machine-readable code and the
//! human message the provider returned.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub mod aws;

pub use aws::{AwsProvider, AwsProviderConfig};

/// Error code the stack service uses for request validation failures.
pub const VALIDATION_ERROR_CODE: &str = "ValidationError";

const STACK_MISSING_PATTERN: &str = "does not exist";
const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Capability that must be acknowledged for templates creating IAM resources.
pub const CAPABILITY_IAM: &str = "CAPABILITY_IAM";

/// Future returned by provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Opaque failure reported by the remote provider.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{}", render_provider_error(.code.as_deref(), .message))]
pub struct ProviderError {
    /// Machine-readable error code, when the provider supplied one.
    pub code: Option<String>,
    /// Human-readable message returned by the provider.
    pub message: String,
}

fn render_provider_error(code: Option<&str>, message: &str) -> String {
    code.map_or_else(|| message.to_owned(), |value| format!("{value}: {message}"))
}

impl ProviderError {
    /// Builds an error carrying both a code and a message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Builds an error with no machine-readable code.
    #[must_use]
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Builds the error the stack service reports for an unknown stack.
    #[must_use]
    pub fn stack_missing(stack: &str) -> Self {
        Self::new(
            VALIDATION_ERROR_CODE,
            format!("Stack with id {stack} does not exist"),
        )
    }

    /// Builds the error the stack service reports for an update that would
    /// change nothing.
    #[must_use]
    pub fn no_updates() -> Self {
        Self::new(VALIDATION_ERROR_CODE, NO_UPDATES_MESSAGE)
    }

    /// Returns `true` when the provider reported that the stack is absent.
    #[must_use]
    pub fn is_stack_missing(&self) -> bool {
        self.code.as_deref() == Some(VALIDATION_ERROR_CODE)
            && self.message.contains(STACK_MISSING_PATTERN)
    }

    /// Returns `true` when the provider rejected an update because the
    /// template and parameters already match the deployed stack.
    #[must_use]
    pub fn is_no_op_update(&self) -> bool {
        self.code.as_deref() == Some(VALIDATION_ERROR_CODE) && self.message == NO_UPDATES_MESSAGE
    }
}

/// Snapshot of a stack returned by a describe call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StackDescription {
    /// Provider-assigned identifier, stable for this incarnation of the stack.
    pub stack_id: Option<String>,
    /// Raw status string reported by the provider.
    pub status: String,
}

/// Parameters for creating or updating a stack.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StackRequest {
    /// Stack name.
    pub name: String,
    /// Template document body.
    pub template_body: String,
    /// Template parameter values keyed by parameter name.
    pub parameters: BTreeMap<String, String>,
    /// Tags applied to the stack at creation.
    pub tags: BTreeMap<String, String>,
    /// Capabilities acknowledged on behalf of the template.
    pub capabilities: Vec<String>,
}

/// One resource row from a describe-resources call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StackResource {
    /// Logical name declared in the template.
    pub logical_id: String,
    /// Physical identifier assigned by the provider.
    pub physical_id: String,
    /// ARN of the stack that owns the resource.
    pub stack_id: String,
}

/// Subnet attributes returned by the secondary lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubnetDetails {
    /// Availability zone hosting the subnet.
    pub availability_zone: String,
    /// CIDR block assigned to the subnet.
    pub cidr_block: String,
}

/// Query used when searching for machine images.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageFilter {
    /// Image owner alias or account.
    pub owner: String,
    /// Glob matched against the image name.
    pub name_pattern: String,
}

/// Attributes of a candidate machine image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageSummary {
    /// Provider image identifier.
    pub image_id: String,
    /// CPU architecture label, for example `x86_64`.
    pub architecture: String,
    /// Volume type of the first block device, when it is EBS-backed.
    pub root_volume_type: Option<String>,
    /// ISO-8601 creation timestamp.
    pub creation_date: String,
}

/// Access key issued for an IAM identity.
#[derive(Clone, Eq, PartialEq)]
pub struct AccessKey {
    /// Public access key identifier.
    pub id: String,
    /// Secret half of the key pair.
    pub secret: String,
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKey")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Remote operations required to provision and tear down an environment.
pub trait CloudProvider {
    /// Describes a stack by name or provider identifier.
    fn describe_stack<'a>(&'a self, stack: &'a str) -> ProviderFuture<'a, StackDescription>;

    /// Starts creating a stack.
    fn create_stack<'a>(&'a self, request: &'a StackRequest) -> ProviderFuture<'a, ()>;

    /// Starts updating an existing stack.
    fn update_stack<'a>(&'a self, request: &'a StackRequest) -> ProviderFuture<'a, ()>;

    /// Starts deleting a stack.
    fn delete_stack<'a>(&'a self, stack: &'a str) -> ProviderFuture<'a, ()>;

    /// Lists the resources owned by a stack.
    fn describe_stack_resources<'a>(
        &'a self,
        stack: &'a str,
    ) -> ProviderFuture<'a, Vec<StackResource>>;

    /// Looks up a subnet, returning `None` when the provider knows nothing
    /// about it.
    fn describe_subnet<'a>(&'a self, subnet_id: &'a str)
    -> ProviderFuture<'a, Option<SubnetDetails>>;

    /// Lists images matching the filter.
    fn describe_images<'a>(&'a self, filter: &'a ImageFilter)
    -> ProviderFuture<'a, Vec<ImageSummary>>;

    /// Creates an SSH key pair and returns the PEM-encoded private key.
    fn create_key_pair<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, String>;

    /// Deletes an SSH key pair.
    fn delete_key_pair<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, ()>;

    /// Issues a new access key for an IAM user.
    fn create_access_key<'a>(&'a self, user: &'a str) -> ProviderFuture<'a, AccessKey>;

    /// Lists the access key identifiers owned by an IAM user.
    fn list_access_keys<'a>(&'a self, user: &'a str) -> ProviderFuture<'a, Vec<String>>;

    /// Revokes one access key owned by an IAM user.
    fn delete_access_key<'a>(&'a self, user: &'a str, key_id: &'a str)
    -> ProviderFuture<'a, ()>;
}
