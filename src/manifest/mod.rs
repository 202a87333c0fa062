//! Assembly of the director deployment manifest.
//!
//! [`ManifestAssembler::build`] is a pure transform: software artifacts,
//! generated credentials, and the discovered base stack resources go in,
//! a [`DirectorManifest`] comes out. Rendering to YAML is a separate step
//! so callers and tests can inspect the structure directly.

use serde_json::{Value, json};
use thiserror::Error;

use crate::credentials::DirectorCredentials;
use crate::provider::AccessKey;
use crate::resources::BaseStackResources;
use crate::software::Software;

mod network;
mod types;

pub use network::{
    CidrError, DIRECTOR_OFFSET, DNS_OFFSET, GATEWAY_OFFSET, Ipv4Cidr, SubnetAddressing,
};
pub use types::{
    CloudProvider, DirectorManifest, Disk, DiskCloudProperties, DiskPool, Job, Network,
    NetworkReference, Release, ResourcePool, ResourcePoolCloudProperties, SshTunnel, Stemcell,
    Subnet, SubnetCloudProperties, Template,
};

/// Instance type used for the director VM.
pub const DEFAULT_INSTANCE_TYPE: &str = "m3.xlarge";
/// Path of the SSH private key, relative to the manifest.
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "./ssh-key";

const DEPLOYMENT_NAME: &str = "bosh";
const DIRECTOR_NAME: &str = "my-bosh";
const DIRECTOR_RELEASE_NAME: &str = "bosh";
const CPI_RELEASE_NAME: &str = "bosh-aws-cpi";
const CPI_JOB: &str = "aws_cpi";
const PRIVATE_NETWORK: &str = "private";
const PUBLIC_NETWORK: &str = "public";
const RESOURCE_POOL: &str = "vms";
const DISK_POOL: &str = "disks";
const LOOPBACK: &str = "127.0.0.1";
const REGISTRY_PORT: u16 = 25_777;
const BLOBSTORE_PORT: u16 = 25_250;
const AGENT_PORT: u16 = 6_868;
const NATS_PORT: u16 = 4_222;
const SSH_PORT: u16 = 22;
const SSH_USER: &str = "vcap";
const EPHEMERAL_DISK_MB: u32 = 25_000;
const PERSISTENT_DISK_MB: u32 = 20_000;
const VOLUME_TYPE: &str = "gp2";
const NTP_SERVERS: [&str; 2] = ["0.pool.ntp.org", "1.pool.ntp.org"];

/// Errors raised while assembling or rendering the manifest.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ManifestError {
    /// Raised when the director access key id is empty.
    #[error("missing access key")]
    MissingAccessKey,
    /// Raised when the director secret access key is empty.
    #[error("missing secret key")]
    MissingSecretKey,
    /// Raised when the director subnet CIDR cannot be used.
    #[error(transparent)]
    Cidr(#[from] CidrError),
    /// Raised when YAML rendering fails.
    #[error("failed to render manifest: {message}")]
    Render {
        /// Serialiser error text.
        message: String,
    },
}

/// Everything the assembler needs for one environment.
#[derive(Clone, Copy, Debug)]
pub struct ManifestInputs<'a> {
    /// Name of the EC2 key pair the director VM boots with.
    pub key_name: &'a str,
    /// Resolved releases and stemcell.
    pub software: &'a Software,
    /// Freshly generated director secrets.
    pub credentials: &'a DirectorCredentials,
    /// Resources discovered on the base stack.
    pub resources: &'a BaseStackResources,
    /// Access key issued to the director IAM user.
    pub access_key: &'a AccessKey,
}

/// Builds director manifests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManifestAssembler {
    instance_type: String,
    private_key_path: String,
}

impl Default for ManifestAssembler {
    fn default() -> Self {
        Self {
            instance_type: DEFAULT_INSTANCE_TYPE.to_owned(),
            private_key_path: DEFAULT_PRIVATE_KEY_PATH.to_owned(),
        }
    }
}

impl ManifestAssembler {
    /// Overrides the director instance type.
    #[must_use]
    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    /// Builds the manifest for `inputs`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::MissingAccessKey`] or
    /// [`ManifestError::MissingSecretKey`] when either half of the access
    /// key is empty, and [`ManifestError::Cidr`] when the subnet CIDR is
    /// malformed or too small to hold the director address.
    pub fn build(&self, inputs: &ManifestInputs<'_>) -> Result<DirectorManifest, ManifestError> {
        if inputs.access_key.id.is_empty() {
            return Err(ManifestError::MissingAccessKey);
        }
        if inputs.access_key.secret.is_empty() {
            return Err(ManifestError::MissingSecretKey);
        }

        let resources = inputs.resources;
        let addressing = SubnetAddressing::from_cidr(&resources.subnet_cidr)?;
        let director_ip = addressing.director_ip.to_string();
        let elastic_ip = resources.director_ip.as_str();
        let aws = aws_properties(inputs);

        let private_network = Network {
            name: PRIVATE_NETWORK.to_owned(),
            network_type: "manual".to_owned(),
            subnets: vec![Subnet {
                range: addressing.range.clone(),
                gateway: addressing.gateway.to_string(),
                dns: vec![addressing.dns.to_string()],
                cloud_properties: SubnetCloudProperties {
                    subnet: resources.subnet_id.clone(),
                },
            }],
        };
        let public_network = Network {
            name: PUBLIC_NETWORK.to_owned(),
            network_type: "vip".to_owned(),
            subnets: Vec::new(),
        };

        let software = inputs.software;
        let releases = vec![
            Release {
                name: DIRECTOR_RELEASE_NAME.to_owned(),
                url: software.director_release.url.clone(),
                sha1: software.director_release.sha1.clone(),
            },
            Release {
                name: CPI_RELEASE_NAME.to_owned(),
                url: software.cpi_release.url.clone(),
                sha1: software.cpi_release.sha1.clone(),
            },
        ];

        let resource_pool = ResourcePool {
            name: RESOURCE_POOL.to_owned(),
            network: PRIVATE_NETWORK.to_owned(),
            stemcell: Stemcell {
                url: software.stemcell.url.clone(),
                sha1: software.stemcell.sha1.clone(),
            },
            cloud_properties: ResourcePoolCloudProperties {
                instance_type: self.instance_type.clone(),
                ephemeral_disk: Disk {
                    size: EPHEMERAL_DISK_MB,
                    volume_type: VOLUME_TYPE.to_owned(),
                },
                availability_zone: resources.availability_zone.clone(),
            },
        };

        let disk_pool = DiskPool {
            name: DISK_POOL.to_owned(),
            disk_size: PERSISTENT_DISK_MB,
            cloud_properties: DiskCloudProperties {
                volume_type: VOLUME_TYPE.to_owned(),
            },
        };

        let job = Job {
            name: DEPLOYMENT_NAME.to_owned(),
            instances: 1,
            templates: job_templates(),
            resource_pool: RESOURCE_POOL.to_owned(),
            persistent_disk_pool: DISK_POOL.to_owned(),
            networks: vec![
                NetworkReference {
                    name: PRIVATE_NETWORK.to_owned(),
                    static_ips: vec![director_ip.clone()],
                    default: vec!["dns".to_owned(), "gateway".to_owned()],
                },
                NetworkReference {
                    name: PUBLIC_NETWORK.to_owned(),
                    static_ips: vec![elastic_ip.to_owned()],
                    default: Vec::new(),
                },
            ],
            properties: job_properties(inputs.credentials, &director_ip, &aws),
        };

        let credentials = inputs.credentials;
        let cloud_provider = CloudProvider {
            template: Template {
                name: CPI_JOB.to_owned(),
                release: CPI_RELEASE_NAME.to_owned(),
            },
            ssh_tunnel: SshTunnel {
                host: elastic_ip.to_owned(),
                port: SSH_PORT,
                user: SSH_USER.to_owned(),
                private_key: self.private_key_path.clone(),
            },
            mbus: mbus_url(&credentials.mbus, elastic_ip),
            properties: json!({
                "aws": aws,
                "agent": { "mbus": mbus_url(&credentials.mbus, "0.0.0.0") },
                "blobstore": {
                    "provider": "local",
                    "path": "/var/vcap/micro_bosh/data/cache",
                },
                "ntp": NTP_SERVERS,
            }),
        };

        Ok(DirectorManifest {
            name: DEPLOYMENT_NAME.to_owned(),
            releases,
            resource_pools: vec![resource_pool],
            disk_pools: vec![disk_pool],
            networks: vec![private_network, public_network],
            jobs: vec![job],
            cloud_provider,
        })
    }

    /// Renders a manifest as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Render`] if serialisation fails.
    pub fn render(manifest: &DirectorManifest) -> Result<String, ManifestError> {
        serde_yaml::to_string(manifest).map_err(|err| ManifestError::Render {
            message: err.to_string(),
        })
    }
}

fn mbus_url(password: &str, host: &str) -> String {
    format!("https://mbus:{password}@{host}:{AGENT_PORT}")
}

fn aws_properties(inputs: &ManifestInputs<'_>) -> Value {
    json!({
        "access_key_id": inputs.access_key.id,
        "secret_access_key": inputs.access_key.secret,
        "default_key_name": inputs.key_name,
        "default_security_groups": [inputs.resources.security_group],
        "region": inputs.resources.region,
    })
}

fn job_templates() -> Vec<Template> {
    let director = [
        "nats",
        "redis",
        "postgres",
        "blobstore",
        "director",
        "health_monitor",
        "registry",
    ]
    .into_iter()
    .map(|name| Template {
        name: name.to_owned(),
        release: DIRECTOR_RELEASE_NAME.to_owned(),
    });
    director
        .chain(std::iter::once(Template {
            name: CPI_JOB.to_owned(),
            release: CPI_RELEASE_NAME.to_owned(),
        }))
        .collect()
}

fn job_properties(credentials: &DirectorCredentials, director_ip: &str, aws: &Value) -> Value {
    let postgres = json!({
        "listen_address": LOOPBACK,
        "host": LOOPBACK,
        "user": "postgres",
        "password": credentials.postgres,
        "database": "bosh",
        "adapter": "postgres",
    });

    json!({
        "nats": {
            "address": LOOPBACK,
            "user": "nats",
            "password": credentials.nats,
        },
        "redis": {
            "listen_address": LOOPBACK,
            "address": LOOPBACK,
            "password": credentials.redis,
        },
        "postgres": postgres,
        "registry": {
            "address": director_ip,
            "host": director_ip,
            "db": postgres,
            "http": {
                "user": "admin",
                "password": credentials.registry,
                "port": REGISTRY_PORT,
            },
            "username": "admin",
            "password": credentials.registry,
            "port": REGISTRY_PORT,
        },
        "blobstore": {
            "address": director_ip,
            "port": BLOBSTORE_PORT,
            "provider": "dav",
            "director": {
                "user": "director",
                "password": credentials.blobstore_director,
            },
            "agent": {
                "user": "agent",
                "password": credentials.blobstore_agent,
            },
        },
        "director": {
            "address": LOOPBACK,
            "name": DIRECTOR_NAME,
            "db": postgres,
            "cpi_job": CPI_JOB,
            "max_threads": 10,
            "user_management": {
                "provider": "local",
                "local": {
                    "users": [
                        { "name": "admin", "password": credentials.admin },
                        { "name": "hm", "password": credentials.health_monitor },
                    ],
                },
            },
        },
        "hm": {
            "director_account": {
                "user": "hm",
                "password": credentials.health_monitor,
            },
            "resurrector_enabled": true,
        },
        "aws": aws,
        "agent": {
            "mbus": format!("nats://nats:{}@{director_ip}:{NATS_PORT}", credentials.nats),
        },
        "ntp": NTP_SERVERS,
    })
}

#[cfg(test)]
mod tests;
