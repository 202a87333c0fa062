//! Discovery of the physical resources behind a stack.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::provider::{CloudProvider, ProviderError, SubnetDetails};

mod arn;

pub use arn::{Arn, ArnParseError};

/// Pseudo-entry holding the account that owns the stack.
pub const ACCOUNT_ID_KEY: &str = "AccountID";
/// Pseudo-entry holding the region hosting the stack.
pub const REGION_KEY: &str = "AWSRegion";

/// Logical names the base stack template must declare.
pub mod base_logical_ids {
    /// Publicly routable subnet hosting the director.
    pub const SUBNET: &str = "BOSHSubnet";
    /// Security group applied to the director.
    pub const SECURITY_GROUP: &str = "BOSHSecurityGroup";
    /// Elastic IP reserved for the director.
    pub const DIRECTOR_IP: &str = "BOSHDirectorIP";
    /// IAM user the director authenticates as.
    pub const DIRECTOR_USER: &str = "BOSHDirectorUser";
    /// NAT instance routing traffic for private subnets.
    pub const NAT_INSTANCE: &str = "NATInstance";
    /// Elastic IP attached to the NAT instance.
    pub const NAT_IP: &str = "NATEIP";
    /// VPC containing every base resource.
    pub const VPC: &str = "VPC";
}

/// Errors raised while resolving stack resources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ResourceError {
    /// Raised when a required logical resource is absent.
    #[error("missing stack resource {logical_id}")]
    MissingResource {
        /// Logical resource name that was expected.
        logical_id: String,
    },
    /// Raised when a resource's stack identifier cannot be parsed.
    #[error(transparent)]
    MalformedArn(#[from] ArnParseError),
    /// Raised when the secondary subnet lookup returns nothing.
    #[error("subnet {subnet_id} was not found")]
    SubnetNotFound {
        /// Subnet identifier that was looked up.
        subnet_id: String,
    },
    /// Provider failure passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Logical to physical identifiers for one stack, plus the account and
/// region pseudo-entries derived from the stack ARN.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceMap {
    entries: BTreeMap<String, String>,
}

impl ResourceMap {
    /// Returns the physical id recorded for `logical_id`.
    #[must_use]
    pub fn get(&self, logical_id: &str) -> Option<&str> {
        self.entries.get(logical_id).map(String::as_str)
    }

    /// Returns the physical id recorded for `logical_id`, or a
    /// [`ResourceError::MissingResource`] naming it.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingResource`] when the entry is absent.
    pub fn require(&self, logical_id: &str) -> Result<&str, ResourceError> {
        self.get(logical_id)
            .ok_or_else(|| ResourceError::MissingResource {
                logical_id: logical_id.to_owned(),
            })
    }

    /// Account owning the stack, when any resource was listed.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.get(ACCOUNT_ID_KEY)
    }

    /// Region hosting the stack, when any resource was listed.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.get(REGION_KEY)
    }

    /// Number of entries, pseudo-entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the stack listed no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every entry in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl FromIterator<(String, String)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Identifiers discovered on the base stack.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BaseStackResources {
    /// Availability zone of the director subnet.
    pub availability_zone: String,
    /// CIDR block of the director subnet.
    pub subnet_cidr: String,
    /// Director subnet id.
    pub subnet_id: String,
    /// Elastic IP reserved for the director.
    pub director_ip: String,
    /// Director security group id.
    pub security_group: String,
    /// Account owning the stack.
    pub account_id: String,
    /// IAM user name the director authenticates as.
    pub director_user: String,
    /// Region hosting the stack.
    pub region: String,
    /// NAT instance id.
    pub nat_instance_id: String,
    /// Elastic IP attached to the NAT instance.
    pub nat_ip: String,
    /// VPC id.
    pub vpc_id: String,
}

/// Resolves stack resources through a borrowed provider.
#[derive(Debug)]
pub struct ResourceLocator<'a, P> {
    provider: &'a P,
}

impl<'a, P: CloudProvider> ResourceLocator<'a, P> {
    /// Creates a locator over `provider`.
    #[must_use]
    pub const fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Lists every resource of `stack` and merges the account and region
    /// parsed from each resource's stack ARN.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MalformedArn`] if any stack identifier fails
    /// to parse, and [`ResourceError::Provider`] if the listing fails.
    pub async fn get_stack_resources(&self, stack: &str) -> Result<ResourceMap, ResourceError> {
        let listed = self.provider.describe_stack_resources(stack).await?;
        let mut resources = ResourceMap::default();
        for resource in listed {
            let arn = Arn::parse(&resource.stack_id)?;
            resources.insert(resource.logical_id, resource.physical_id);
            resources.insert(ACCOUNT_ID_KEY, arn.account_id);
            resources.insert(REGION_KEY, arn.region);
        }
        debug!(stack, count = resources.len(), "resolved stack resources");
        Ok(resources)
    }

    /// Resolves the fixed set of base stack resources, then looks up the
    /// director subnet's availability zone and CIDR block.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingResource`] naming the first absent
    /// logical resource, [`ResourceError::SubnetNotFound`] when the subnet
    /// lookup comes back empty, or any error from
    /// [`Self::get_stack_resources`].
    pub async fn get_base_stack_resources(
        &self,
        stack: &str,
    ) -> Result<BaseStackResources, ResourceError> {
        let resources = self.get_stack_resources(stack).await?;

        let subnet_id = resources.require(base_logical_ids::SUBNET)?.to_owned();
        let security_group = resources.require(base_logical_ids::SECURITY_GROUP)?;
        let director_ip = resources.require(base_logical_ids::DIRECTOR_IP)?;
        let director_user = resources.require(base_logical_ids::DIRECTOR_USER)?;
        let nat_instance_id = resources.require(base_logical_ids::NAT_INSTANCE)?;
        let nat_ip = resources.require(base_logical_ids::NAT_IP)?;
        let vpc_id = resources.require(base_logical_ids::VPC)?;
        let account_id = resources.require(ACCOUNT_ID_KEY)?;
        let region = resources.require(REGION_KEY)?;

        let subnet = self.describe_subnet(&subnet_id).await?;

        Ok(BaseStackResources {
            availability_zone: subnet.availability_zone,
            subnet_cidr: subnet.cidr_block,
            subnet_id,
            director_ip: director_ip.to_owned(),
            security_group: security_group.to_owned(),
            account_id: account_id.to_owned(),
            director_user: director_user.to_owned(),
            region: region.to_owned(),
            nat_instance_id: nat_instance_id.to_owned(),
            nat_ip: nat_ip.to_owned(),
            vpc_id: vpc_id.to_owned(),
        })
    }

    /// Looks up a subnet's availability zone and CIDR block.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::SubnetNotFound`] when the provider returns no
    /// subnet, and [`ResourceError::Provider`] when the lookup fails.
    pub async fn describe_subnet(&self, subnet_id: &str) -> Result<SubnetDetails, ResourceError> {
        self.provider
            .describe_subnet(subnet_id)
            .await?
            .ok_or_else(|| ResourceError::SubnetNotFound {
                subnet_id: subnet_id.to_owned(),
            })
    }
}
