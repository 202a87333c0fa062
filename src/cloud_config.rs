//! Cloud config for deployments onto the application stack.
//!
//! The director needs to know which subnet, security group, and load
//! balancer the application stack created. [`CloudConfigAssembler`] turns
//! those physical ids into a cloud config document that `bosh
//! update-cloud-config` accepts, and records the director and admin
//! credentials the document is meant to be uploaded with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::{CidrError, DNS_OFFSET, GATEWAY_OFFSET, Ipv4Cidr};
use crate::resources::{ResourceError, ResourceMap};

/// Logical names the application stack template must declare.
pub mod application_logical_ids {
    /// Private subnet hosting application VMs.
    pub const SUBNET: &str = "ConcourseSubnet";
    /// Security group applied to application VMs.
    pub const SECURITY_GROUP: &str = "ConcourseSecurityGroup";
    /// Load balancer fronting the web VMs.
    pub const LOAD_BALANCER: &str = "LoadBalancer";
}

const ZONE: &str = "z1";
const NETWORK: &str = "concourse";
const VM_TYPE: &str = "default";
const DISK_TYPE: &str = "default";
const ELB_EXTENSION: &str = "elb";
const INSTANCE_TYPE: &str = "m3.large";
const EPHEMERAL_DISK_MB: u32 = 25_000;
const PERSISTENT_DISK_MB: u32 = 10_240;
const VOLUME_TYPE: &str = "gp2";
const COMPILATION_WORKERS: u32 = 3;
/// Addresses after the network address that the provider keeps for itself.
const PROVIDER_RESERVED: u32 = 3;

/// Errors raised while assembling the cloud config.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum CloudConfigError {
    /// Raised when the application stack lacks a required resource.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// Raised when the subnet CIDR is unusable.
    #[error(transparent)]
    Cidr(#[from] CidrError),
    /// Raised when YAML rendering fails.
    #[error("failed to render cloud config: {message}")]
    Render {
        /// Serialiser error text.
        message: String,
    },
}

/// Director a cloud config is uploaded to.
#[derive(Clone, Deserialize, Eq, PartialEq, Serialize)]
pub struct DirectorTarget {
    /// Address of the director.
    pub target: String,
    /// Operator user name.
    pub user: String,
    /// Operator password.
    pub password: String,
}

impl std::fmt::Debug for DirectorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorTarget")
            .field("target", &self.target)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Cloud config document.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CloudConfig {
    /// Director and credentials the document targets.
    pub director: DirectorTarget,
    /// Availability zones.
    pub azs: Vec<Zone>,
    /// VM sizes.
    pub vm_types: Vec<VmType>,
    /// Optional VM settings jobs can opt into.
    pub vm_extensions: Vec<VmExtension>,
    /// Persistent disk sizes.
    pub disk_types: Vec<DiskType>,
    /// Networks.
    pub networks: Vec<CloudNetwork>,
    /// Compilation VM settings.
    pub compilation: Compilation,
}

/// Availability zone mapping.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Zone {
    /// Zone name used inside BOSH.
    pub name: String,
    /// Provider placement.
    pub cloud_properties: ZoneCloudProperties,
}

/// Provider availability zone.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ZoneCloudProperties {
    /// AWS availability zone name.
    pub availability_zone: String,
}

/// VM size.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VmType {
    /// Type name.
    pub name: String,
    /// Provider sizing.
    pub cloud_properties: VmCloudProperties,
}

/// Provider sizing for a VM type.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VmCloudProperties {
    /// EC2 instance type.
    pub instance_type: String,
    /// Ephemeral disk.
    pub ephemeral_disk: crate::manifest::Disk,
}

/// VM extension.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VmExtension {
    /// Extension name.
    pub name: String,
    /// Provider settings merged into VMs using the extension.
    pub cloud_properties: ElbCloudProperties,
}

/// Load balancer registration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ElbCloudProperties {
    /// Classic load balancer names.
    pub elbs: Vec<String>,
}

/// Persistent disk size.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiskType {
    /// Type name.
    pub name: String,
    /// Size in megabytes.
    pub disk_size: u32,
    /// Provider disk properties.
    pub cloud_properties: crate::manifest::DiskCloudProperties,
}

/// Manual network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CloudNetwork {
    /// Network name.
    pub name: String,
    /// Network type.
    #[serde(rename = "type")]
    pub network_type: String,
    /// Subnets.
    pub subnets: Vec<CloudSubnet>,
}

/// Subnet of a manual network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CloudSubnet {
    /// CIDR block.
    pub range: String,
    /// Gateway address.
    pub gateway: String,
    /// DNS resolvers.
    pub dns: Vec<String>,
    /// Address ranges BOSH must not assign.
    pub reserved: Vec<String>,
    /// Zone the subnet lives in.
    pub az: String,
    /// Provider subnet and security groups.
    pub cloud_properties: CloudSubnetProperties,
}

/// Provider properties of a subnet.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CloudSubnetProperties {
    /// Physical subnet id.
    pub subnet: String,
    /// Security group ids.
    pub security_groups: Vec<String>,
}

/// Compilation settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Compilation {
    /// Concurrent compilation VMs.
    pub workers: u32,
    /// Keep compilation VMs between packages.
    pub reuse_compilation_vms: bool,
    /// Zone compilation VMs run in.
    pub az: String,
    /// VM type for compilation VMs.
    pub vm_type: String,
    /// Network compilation VMs join.
    pub network: String,
}

/// Builds the cloud config for the application stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct CloudConfigAssembler;

impl CloudConfigAssembler {
    /// Builds the cloud config from the application stack's resources, the
    /// CIDR of its subnet, the availability zone shared with the base
    /// stack, and the director it targets.
    ///
    /// # Errors
    ///
    /// Returns [`CloudConfigError::Resource`] naming the first missing
    /// logical resource, or [`CloudConfigError::Cidr`] when the CIDR is
    /// unusable.
    pub fn build(
        self,
        resources: &ResourceMap,
        subnet_cidr: &str,
        availability_zone: &str,
        director: &DirectorTarget,
    ) -> Result<CloudConfig, CloudConfigError> {
        let subnet_id = resources.require(application_logical_ids::SUBNET)?;
        let security_group = resources.require(application_logical_ids::SECURITY_GROUP)?;
        let load_balancer = resources.require(application_logical_ids::LOAD_BALANCER)?;

        let block = Ipv4Cidr::parse(subnet_cidr)?;
        let reserved = format!(
            "{}-{}",
            block.nth(GATEWAY_OFFSET)?,
            block.nth(PROVIDER_RESERVED)?
        );

        Ok(CloudConfig {
            director: director.clone(),
            azs: vec![Zone {
                name: ZONE.to_owned(),
                cloud_properties: ZoneCloudProperties {
                    availability_zone: availability_zone.to_owned(),
                },
            }],
            vm_types: vec![VmType {
                name: VM_TYPE.to_owned(),
                cloud_properties: VmCloudProperties {
                    instance_type: INSTANCE_TYPE.to_owned(),
                    ephemeral_disk: crate::manifest::Disk {
                        size: EPHEMERAL_DISK_MB,
                        volume_type: VOLUME_TYPE.to_owned(),
                    },
                },
            }],
            vm_extensions: vec![VmExtension {
                name: ELB_EXTENSION.to_owned(),
                cloud_properties: ElbCloudProperties {
                    elbs: vec![load_balancer.to_owned()],
                },
            }],
            disk_types: vec![DiskType {
                name: DISK_TYPE.to_owned(),
                disk_size: PERSISTENT_DISK_MB,
                cloud_properties: crate::manifest::DiskCloudProperties {
                    volume_type: VOLUME_TYPE.to_owned(),
                },
            }],
            networks: vec![CloudNetwork {
                name: NETWORK.to_owned(),
                network_type: "manual".to_owned(),
                subnets: vec![CloudSubnet {
                    range: block.to_string(),
                    gateway: block.nth(GATEWAY_OFFSET)?.to_string(),
                    dns: vec![block.nth(DNS_OFFSET)?.to_string()],
                    reserved: vec![reserved],
                    az: ZONE.to_owned(),
                    cloud_properties: CloudSubnetProperties {
                        subnet: subnet_id.to_owned(),
                        security_groups: vec![security_group.to_owned()],
                    },
                }],
            }],
            compilation: Compilation {
                workers: COMPILATION_WORKERS,
                reuse_compilation_vms: true,
                az: ZONE.to_owned(),
                vm_type: VM_TYPE.to_owned(),
                network: NETWORK.to_owned(),
            },
        })
    }

    /// Renders a cloud config as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`CloudConfigError::Render`] if serialisation fails.
    pub fn render(config: &CloudConfig) -> Result<String, CloudConfigError> {
        serde_yaml::to_string(config).map_err(|err| CloudConfigError::Render {
            message: err.to_string(),
        })
    }
}
