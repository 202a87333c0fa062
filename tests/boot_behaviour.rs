//! Behavioural tests for Boot against scripted doubles.

use std::collections::BTreeMap;
use std::time::Duration;

use rstest::{fixture, rstest};
use strata::artifact_store::keys;
use strata::images::nat_image_filter;
use strata::manifest::{DirectorManifest, ManifestAssembler};
use strata::pipeline::PipelineError;
use strata::provider::{ProviderError, StackRequest};
use strata::software::SoftwareError;
use strata::stack::StackError;
use strata::templates::{APPLICATION_STACK_TEMPLATE, BASE_STACK_TEMPLATE};
use strata::test_support::{
    MemoryArtifactStore, ProviderCall, ProviderOperation, RecordingClock, ScriptedProvider,
    StaticSoftwareSource, sample_nat_image, sample_private_key, sample_stack_id, scripted_pipeline,
    scripted_pipeline_with_software,
};

const NAME: &str = "demo";
const BASE: &str = "demo-base";
const APPLICATION: &str = "demo-concourse";
const DIRECTOR_USER: &str = "demo-base-BOSHDirectorUser";

struct World {
    provider: ScriptedProvider,
    store: MemoryArtifactStore,
    clock: RecordingClock,
}

impl World {
    async fn boot(&self) -> Result<(), PipelineError> {
        scripted_pipeline(&self.provider, &self.store, &self.clock)
            .boot(NAME)
            .await
    }
}

#[fixture]
fn world() -> World {
    let provider = ScriptedProvider::new();
    provider.script_environment(NAME);
    World {
        provider,
        store: MemoryArtifactStore::new(),
        clock: RecordingClock::new(),
    }
}

fn stack_request(name: &str, template: &str, parameters: &[(&str, &str)]) -> StackRequest {
    StackRequest {
        name: name.to_owned(),
        template_body: template.to_owned(),
        parameters: parameters
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
        tags: BTreeMap::from([("Name".to_owned(), name.to_owned())]),
        capabilities: vec!["CAPABILITY_IAM".to_owned()],
    }
}

#[rstest]
#[tokio::test]
async fn boot_drives_provider_in_order(world: World) {
    world
        .boot()
        .await
        .unwrap_or_else(|err| panic!("boot: {err}"));

    assert_eq!(
        world.provider.calls(),
        vec![
            ProviderCall::CreateKeyPair(NAME.to_owned()),
            ProviderCall::DescribeImages(nat_image_filter()),
            ProviderCall::DescribeStack(BASE.to_owned()),
            ProviderCall::CreateStack(stack_request(
                BASE,
                BASE_STACK_TEMPLATE,
                &[("KeyName", NAME), ("NATInstanceAMI", "ami-nat")],
            )),
            ProviderCall::DescribeStack(BASE.to_owned()),
            ProviderCall::DescribeStack(sample_stack_id(BASE)),
            ProviderCall::DescribeStackResources(BASE.to_owned()),
            ProviderCall::DescribeSubnet("subnet-base".to_owned()),
            ProviderCall::CreateAccessKey(DIRECTOR_USER.to_owned()),
            ProviderCall::DescribeStack(APPLICATION.to_owned()),
            ProviderCall::CreateStack(stack_request(
                APPLICATION,
                APPLICATION_STACK_TEMPLATE,
                &[
                    ("AvailabilityZone", "us-east-1a"),
                    ("NATInstance", "i-nat"),
                    ("PubliclyRoutableSubnetID", "subnet-base"),
                    ("VPCID", "vpc-base"),
                ],
            )),
            ProviderCall::DescribeStack(APPLICATION.to_owned()),
            ProviderCall::DescribeStack(sample_stack_id(APPLICATION)),
            ProviderCall::DescribeStackResources(APPLICATION.to_owned()),
            ProviderCall::DescribeSubnet("subnet-concourse".to_owned()),
        ]
    );
    assert_eq!(
        world.clock.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(5)]
    );
}

#[rstest]
#[tokio::test]
async fn boot_persists_every_artifact(world: World) {
    world
        .boot()
        .await
        .unwrap_or_else(|err| panic!("boot: {err}"));

    assert_eq!(
        world.store.written_keys(),
        vec![
            keys::SSH_KEY,
            keys::BOSH_IP,
            keys::NAT_IP,
            keys::DIRECTOR_MANIFEST,
            keys::BOSH_PASSWORD,
            keys::BOSH_ENVIRONMENT,
            keys::CLOUD_CONFIG,
        ]
    );
    assert_eq!(
        world.store.text(keys::SSH_KEY),
        Some(sample_private_key(NAME))
    );
    assert_eq!(world.store.text(keys::BOSH_IP).as_deref(), Some("52.0.0.10"));
    assert_eq!(world.store.text(keys::NAT_IP).as_deref(), Some("52.0.0.11"));

    let password = world
        .store
        .text(keys::BOSH_PASSWORD)
        .unwrap_or_else(|| panic!("bosh-password should be written"));
    assert_eq!(password.len(), 12);
    assert_eq!(
        world.store.text(keys::BOSH_ENVIRONMENT),
        Some(format!(
            "export BOSH_TARGET=52.0.0.10\n\
             export BOSH_USER=admin\n\
             export BOSH_PASSWORD={password}\n\
             export NAT_IP=52.0.0.11"
        ))
    );
}

#[rstest]
#[tokio::test]
async fn boot_manifest_carries_issued_access_key(world: World) {
    world
        .boot()
        .await
        .unwrap_or_else(|err| panic!("boot: {err}"));

    let rendered = world
        .store
        .text(keys::DIRECTOR_MANIFEST)
        .unwrap_or_else(|| panic!("director.yml should be written"));
    let manifest: DirectorManifest = serde_yaml::from_str(&rendered)
        .unwrap_or_else(|err| panic!("director.yml should parse: {err}"));

    let aws = &manifest.cloud_provider.properties["aws"];
    assert_eq!(aws["access_key_id"], "AKIA1");
    assert_eq!(aws["secret_access_key"], "secret-1");
    assert_eq!(aws["default_key_name"], NAME);
    assert_eq!(aws["region"], "us-east-1");
    assert_eq!(world.provider.access_keys(DIRECTOR_USER), vec!["AKIA1"]);
}

#[rstest]
#[tokio::test]
async fn boot_writes_cloud_config_for_application_subnet(world: World) {
    world
        .boot()
        .await
        .unwrap_or_else(|err| panic!("boot: {err}"));

    let rendered = world
        .store
        .text(keys::CLOUD_CONFIG)
        .unwrap_or_else(|| panic!("cloud-config.yml should be written"));
    let config: serde_yaml::Value = serde_yaml::from_str(&rendered)
        .unwrap_or_else(|err| panic!("cloud-config.yml should parse: {err}"));

    let subnet = &config["networks"][0]["subnets"][0];
    assert_eq!(subnet["range"].as_str(), Some("10.0.16.0/24"));
    assert_eq!(
        subnet["cloud_properties"]["subnet"].as_str(),
        Some("subnet-concourse")
    );
    assert_eq!(
        config["vm_extensions"][0]["cloud_properties"]["elbs"][0].as_str(),
        Some("concourse-elb")
    );
    assert_eq!(
        config["azs"][0]["cloud_properties"]["availability_zone"].as_str(),
        Some("us-east-1a")
    );

    let password = world.store.text(keys::BOSH_PASSWORD);
    assert_eq!(config["director"]["target"].as_str(), Some("52.0.0.10"));
    assert_eq!(config["director"]["user"].as_str(), Some("admin"));
    assert_eq!(config["director"]["password"].as_str(), password.as_deref());
}

#[rstest]
#[tokio::test]
async fn boot_sizes_director_from_manifest_assembler(world: World) {
    scripted_pipeline(&world.provider, &world.store, &world.clock)
        .with_manifest_assembler(ManifestAssembler::default().with_instance_type("m5.large"))
        .boot(NAME)
        .await
        .unwrap_or_else(|err| panic!("boot: {err}"));

    let rendered = world
        .store
        .text(keys::DIRECTOR_MANIFEST)
        .unwrap_or_else(|| panic!("director.yml should be written"));
    let manifest: DirectorManifest = serde_yaml::from_str(&rendered)
        .unwrap_or_else(|err| panic!("director.yml should parse: {err}"));

    let Some(pool) = manifest.resource_pools.first() else {
        panic!("manifest has no resource pools");
    };
    assert_eq!(pool.cloud_properties.instance_type, "m5.large");
}

#[rstest]
#[tokio::test]
async fn boot_rejects_non_empty_state_before_any_call(world: World) {
    world.store.seed(keys::BOSH_IP, b"10.0.0.6");

    let result = world.boot().await;

    let Err(err) = result else {
        panic!("boot should refuse a non-empty state directory");
    };
    assert_eq!(err, PipelineError::StateNotEmpty);
    assert_eq!(err.to_string(), "state directory must be empty");
    assert!(world.provider.calls().is_empty());
    assert!(world.store.written_keys().is_empty());
}

#[rstest]
#[tokio::test]
async fn boot_rejects_invalid_name_before_any_call(world: World) {
    let result = scripted_pipeline(&world.provider, &world.store, &world.clock)
        .boot("9lives")
        .await;

    assert_eq!(
        result,
        Err(PipelineError::InvalidName {
            name: "9lives".to_owned(),
        })
    );
    assert!(world.provider.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn boot_stops_when_base_stack_rolls_back(world: World) {
    let failing = ScriptedProvider::new();
    failing.set_images(vec![sample_nat_image()]);
    failing.push_missing(BASE);
    failing.push_statuses(BASE, &["CREATE_IN_PROGRESS", "ROLLBACK_IN_PROGRESS"]);

    let result = scripted_pipeline(&failing, &world.store, &world.clock)
        .boot(NAME)
        .await;

    assert_eq!(
        result,
        Err(PipelineError::Stack(StackError::Unhealthy {
            stack: BASE.to_owned(),
            status: "ROLLBACK_IN_PROGRESS".to_owned(),
        }))
    );
    assert!(failing.calls_of(ProviderOperation::CreateAccessKey).is_empty());
    assert!(failing.calls_of(ProviderOperation::DescribeStackResources).is_empty());
    assert_eq!(world.store.written_keys(), vec![keys::SSH_KEY]);
}

#[rstest]
#[tokio::test]
async fn boot_keeps_completed_steps_when_key_issuance_fails(world: World) {
    let failure = ProviderError::new("LimitExceeded", "too many access keys");
    world
        .provider
        .fail(ProviderOperation::CreateAccessKey, failure.clone());

    let result = world.boot().await;

    assert_eq!(result, Err(PipelineError::Provider(failure)));
    assert_eq!(
        world.store.written_keys(),
        vec![keys::SSH_KEY, keys::BOSH_IP, keys::NAT_IP]
    );
    assert_eq!(
        world.provider.position(|call| matches!(call, ProviderCall::DeleteKeyPair(_))),
        None
    );
    let application_describe = ProviderCall::DescribeStack(APPLICATION.to_owned());
    assert_eq!(
        world.provider.position(|call| *call == application_describe),
        None
    );
}

#[rstest]
#[tokio::test]
async fn boot_surfaces_software_lookup_failure(world: World) {
    let failure = SoftwareError::EmptyResult {
        url: "https://bosh.example/api".to_owned(),
    };
    let software = StaticSoftwareSource::failing(failure.clone());

    let result =
        scripted_pipeline_with_software(&world.provider, &world.store, &world.clock, software)
            .boot(NAME)
            .await;

    assert_eq!(result, Err(PipelineError::Software(failure)));
    assert!(world.store.text(keys::DIRECTOR_MANIFEST).is_none());
    assert_eq!(
        world.provider.calls_of(ProviderOperation::CreateAccessKey).len(),
        1
    );
}

#[rstest]
#[tokio::test]
async fn boot_surfaces_store_write_failure(world: World) {
    world.store.fail_writes_to(keys::DIRECTOR_MANIFEST);

    let Err(err) = world.boot().await else {
        panic!("boot should fail when director.yml cannot be written");
    };

    assert!(matches!(err, PipelineError::Store(_)), "unexpected error: {err}");
    assert!(world.store.text(keys::BOSH_PASSWORD).is_none());
}
