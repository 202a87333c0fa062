//! Tests for layered configuration loading.

use std::time::Duration;

use strata::config::StrataConfig;
use strata::credentials::DEFAULT_CREDENTIAL_LENGTH;
use strata::manifest::{DEFAULT_INSTANCE_TYPE, ManifestAssembler};
use strata::software::DEFAULT_BOSH_IO_URL;
use strata::test_support::EnvGuard;

const UNSET: &[EnvPair] = &[
    ("STRATA_ACCESS_KEY_ID", None),
    ("STRATA_SECRET_ACCESS_KEY", None),
    ("STRATA_ENDPOINT_URL", None),
    ("STRATA_BOSH_IO_URL", None),
    ("STRATA_CREDENTIAL_LENGTH", None),
    ("STRATA_DIRECTOR_INSTANCE_TYPE", None),
];

type EnvPair = (&'static str, Option<&'static str>);

fn with_unset(pairs: &[EnvPair]) -> Vec<EnvPair> {
    pairs.iter().chain(UNSET).copied().collect()
}

#[tokio::test]
async fn environment_overrides_defaults() {
    let _guard = EnvGuard::set_vars(&with_unset(&[
        ("STRATA_REGION", Some("eu-west-1")),
        ("STRATA_STACK_WAIT_TIMEOUT_SECS", Some("120")),
    ]))
    .await;

    let config = StrataConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(config.region, "eu-west-1");
    assert_eq!(config.stack_timeout(), Duration::from_secs(120));
    assert_eq!(config.bosh_io_url, DEFAULT_BOSH_IO_URL);
    assert_eq!(config.credential_length, DEFAULT_CREDENTIAL_LENGTH);
    assert_eq!(config.access_key_id, None);
    assert_eq!(config.director_instance_type, DEFAULT_INSTANCE_TYPE);
    assert_eq!(config.validate(), Ok(()));
}

#[tokio::test]
async fn environment_selects_director_instance_type() {
    let _guard = EnvGuard::set_vars(&[
        ("STRATA_REGION", Some("us-east-1")),
        ("STRATA_ACCESS_KEY_ID", None),
        ("STRATA_SECRET_ACCESS_KEY", None),
        ("STRATA_STACK_WAIT_TIMEOUT_SECS", None),
        ("STRATA_DIRECTOR_INSTANCE_TYPE", Some("m5.large")),
    ])
    .await;

    let config = StrataConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));

    assert_eq!(config.director_instance_type, "m5.large");
    assert_eq!(
        config.manifest_assembler(),
        ManifestAssembler::default().with_instance_type("m5.large")
    );
}

#[tokio::test]
async fn missing_region_fails_validation_with_guidance() {
    let _guard = EnvGuard::set_vars(&with_unset(&[
        ("STRATA_REGION", None),
        ("STRATA_STACK_WAIT_TIMEOUT_SECS", None),
    ]))
    .await;

    let config = StrataConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));
    let Err(err) = config.validate() else {
        panic!("region should be required");
    };

    let message = err.to_string();
    assert!(message.contains("STRATA_REGION"), "message: {message}");
    assert!(message.contains("strata.toml"), "message: {message}");
}

#[tokio::test]
async fn static_keys_load_as_a_pair() {
    let _guard = EnvGuard::set_vars(&[
        ("STRATA_REGION", Some("us-east-1")),
        ("STRATA_ACCESS_KEY_ID", Some("AKIAEXAMPLE")),
        ("STRATA_SECRET_ACCESS_KEY", Some("secret")),
        ("STRATA_STACK_WAIT_TIMEOUT_SECS", None),
    ])
    .await;

    let config = StrataConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load: {err}"));
    let provider = config.provider_config();

    assert_eq!(provider.access_key_id.as_deref(), Some("AKIAEXAMPLE"));
    assert_eq!(provider.secret_access_key.as_deref(), Some("secret"));
    assert_eq!(config.validate(), Ok(()));
}
