//! Serialisable shape of the director deployment manifest.
//!
//! Field names follow the bosh-init manifest schema and are consumed by
//! external tooling, so renames here are breaking changes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level director manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DirectorManifest {
    /// Deployment name.
    pub name: String,
    /// Releases installed on the director VM.
    pub releases: Vec<Release>,
    /// Resource pools the job can be placed in.
    pub resource_pools: Vec<ResourcePool>,
    /// Persistent disk pools.
    pub disk_pools: Vec<DiskPool>,
    /// Networks the job attaches to.
    pub networks: Vec<Network>,
    /// Jobs deployed on the VM.
    pub jobs: Vec<Job>,
    /// CPI configuration used by bosh-init itself.
    pub cloud_provider: CloudProvider,
}

/// Release reference with its download location.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Release {
    /// Release name.
    pub name: String,
    /// Download URL.
    pub url: String,
    /// SHA1 checksum.
    pub sha1: String,
}

/// Resource pool for the director VM.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourcePool {
    /// Pool name.
    pub name: String,
    /// Network the pool's VMs attach to by default.
    pub network: String,
    /// Stemcell booted by the pool's VMs.
    pub stemcell: Stemcell,
    /// Provider-specific VM properties.
    pub cloud_properties: ResourcePoolCloudProperties,
}

/// Stemcell reference.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Stemcell {
    /// Download URL.
    pub url: String,
    /// SHA1 checksum.
    pub sha1: String,
}

/// VM sizing and placement.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourcePoolCloudProperties {
    /// EC2 instance type.
    pub instance_type: String,
    /// Ephemeral disk attached to each VM.
    pub ephemeral_disk: Disk,
    /// Availability zone for the VM.
    pub availability_zone: String,
}

/// Disk sizing in megabytes plus volume type.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Disk {
    /// Size in megabytes.
    pub size: u32,
    /// EBS volume type.
    #[serde(rename = "type")]
    pub volume_type: String,
}

/// Persistent disk pool.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiskPool {
    /// Pool name.
    pub name: String,
    /// Size in megabytes.
    pub disk_size: u32,
    /// Provider-specific disk properties.
    pub cloud_properties: DiskCloudProperties,
}

/// EBS properties for a disk pool.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DiskCloudProperties {
    /// EBS volume type.
    #[serde(rename = "type")]
    pub volume_type: String,
}

/// Network definition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Network {
    /// Network name.
    pub name: String,
    /// Network type: `manual`, `dynamic`, or `vip`.
    #[serde(rename = "type")]
    pub network_type: String,
    /// Subnets of a manual network.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<Subnet>,
}

/// Subnet of a manual network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Subnet {
    /// CIDR block.
    pub range: String,
    /// Gateway address.
    pub gateway: String,
    /// DNS resolvers.
    pub dns: Vec<String>,
    /// Provider-specific subnet properties.
    pub cloud_properties: SubnetCloudProperties,
}

/// Provider subnet reference.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubnetCloudProperties {
    /// Physical subnet id.
    pub subnet: String,
}

/// Job placed on the director VM.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Job {
    /// Job name.
    pub name: String,
    /// Instance count.
    pub instances: u32,
    /// Job templates and their releases.
    pub templates: Vec<Template>,
    /// Resource pool name.
    pub resource_pool: String,
    /// Disk pool name for persistent storage.
    pub persistent_disk_pool: String,
    /// Networks and static addresses.
    pub networks: Vec<NetworkReference>,
    /// Per-service configuration.
    pub properties: Value,
}

/// Job attachment to a network.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkReference {
    /// Network name.
    pub name: String,
    /// Static addresses on that network.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_ips: Vec<String>,
    /// Defaults (`dns`, `gateway`) this network provides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<String>,
}

/// Job template reference.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Template {
    /// Template name.
    pub name: String,
    /// Release providing the template.
    pub release: String,
}

/// CPI configuration for bosh-init.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CloudProvider {
    /// CPI template.
    pub template: Template,
    /// SSH tunnel to the new VM.
    pub ssh_tunnel: SshTunnel,
    /// Message bus URL of the bootstrap agent.
    pub mbus: String,
    /// CPI properties.
    pub properties: Value,
}

/// SSH tunnel settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SshTunnel {
    /// Host to connect to.
    pub host: String,
    /// SSH port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Path to the private key, relative to the manifest.
    pub private_key: String,
}
