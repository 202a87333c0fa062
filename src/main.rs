//! Binary entry point for the strata CLI.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use strata::artifact_store::{ArtifactStoreError, FilesystemArtifactStore};
use strata::config::{ConfigError, StrataConfig};
use strata::credentials::{CredentialGenerator, CredentialsError};
use strata::pipeline::{Pipeline, PipelineError, ShowField, show_artifacts, validate_name};
use strata::provider::AwsProvider;
use strata::software::BoshIoClient;
use strata::stack::StackManager;

mod cli;

use cli::{Cli, Command, ShowCommand};

const ENVIRONMENTS_DIR: &str = "environments";

#[derive(Debug, Error)]
enum CliError {
    #[error("missing --name")]
    MissingName,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("credential configuration error: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("state directory error: {0}")]
    StateDir(String),
    #[error(transparent)]
    Store(#[from] ArtifactStoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let name = cli.name.ok_or(CliError::MissingName)?;
    validate_name(&name)?;
    let access = match cli.command {
        Command::Show(_) => StateAccess::ReadOnly,
        Command::Up | Command::Down => StateAccess::CreateDefault,
    };
    let store = open_state_dir(&name, cli.state_dir.as_deref(), access)?;

    match cli.command {
        Command::Up => {
            let mut pipeline = build_pipeline(store).await?;
            pipeline.boot(&name).await?;
        }
        Command::Down => {
            let pipeline = build_pipeline(store).await?;
            pipeline.destroy(&name).await?;
        }
        Command::Show(flags) => {
            let mut stdout = io::stdout().lock();
            show_artifacts(&store, &selected_fields(&flags), &mut stdout)?;
        }
    }
    Ok(())
}

async fn build_pipeline(
    store: FilesystemArtifactStore,
) -> Result<Pipeline<AwsProvider, FilesystemArtifactStore, BoshIoClient, StdRng>, CliError> {
    let config = StrataConfig::load_without_cli_args()?;
    config.validate()?;

    let provider = AwsProvider::connect(&config.provider_config()).await;
    let credentials = CredentialGenerator::new(StdRng::from_entropy(), config.credential_length)?;
    Ok(Pipeline::new(
        StackManager::new(provider),
        store,
        BoshIoClient::new(config.bosh_io_url.clone()),
        credentials,
    )
    .with_stack_timeout(config.stack_timeout())
    .with_manifest_assembler(config.manifest_assembler()))
}

/// Whether the default state directory may be created.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StateAccess {
    ReadOnly,
    CreateDefault,
}

/// Opens `--state-dir` when given, which must already exist; otherwise
/// opens `environments/<name>` under the working directory.
fn open_state_dir(
    name: &str,
    state_dir: Option<&Path>,
    access: StateAccess,
) -> Result<FilesystemArtifactStore, CliError> {
    if let Some(explicit) = state_dir {
        let root = utf8_path(explicit.to_path_buf())?;
        return Ok(FilesystemArtifactStore::open(&root)?);
    }

    let cwd = env::current_dir().map_err(|err| CliError::StateDir(err.to_string()))?;
    open_default_state_dir(&utf8_path(cwd)?, name, access)
}

fn open_default_state_dir(
    base: &Utf8Path,
    name: &str,
    access: StateAccess,
) -> Result<FilesystemArtifactStore, CliError> {
    let root = base.join(ENVIRONMENTS_DIR).join(name);
    let store = match access {
        StateAccess::ReadOnly => FilesystemArtifactStore::open(&root)?,
        StateAccess::CreateDefault => FilesystemArtifactStore::create(&root)?,
    };
    Ok(store)
}

fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, CliError> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|path| CliError::StateDir(format!("{} is not valid UTF-8", path.display())))
}

fn selected_fields(flags: &ShowCommand) -> Vec<ShowField> {
    [
        (flags.ssh, ShowField::SshKey),
        (flags.bosh_ip, ShowField::BoshIp),
        (flags.bosh_password, ShowField::BoshPassword),
        (flags.bosh_environment, ShowField::BoshEnvironment),
    ]
    .into_iter()
    .filter_map(|(selected, field)| selected.then_some(field))
    .collect()
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
