//! Command-line interface definitions for the `strata` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI for the `strata` binary.
#[derive(Debug, Parser)]
#[command(
    name = "strata",
    about = "Provision and tear down a layered BOSH environment on AWS",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Environment name; prefixes both stacks and names the key pair.
    #[arg(long, global = true, value_name = "NAME")]
    pub(crate) name: Option<String>,
    /// Directory holding the environment's artifacts. Defaults to
    /// `environments/<NAME>` under the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub(crate) state_dir: Option<PathBuf>,
    /// Action to perform.
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Actions available on an environment.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create or update the environment and write its artifacts.
    #[command(name = "up", about = "Create or update the environment")]
    Up,
    /// Tear the environment down. The state directory is left in place.
    #[command(name = "down", about = "Tear the environment down")]
    Down,
    /// Print stored artifacts.
    #[command(name = "show", about = "Print stored artifacts")]
    Show(ShowCommand),
}

/// Arguments for the `strata show` subcommand.
#[derive(Debug, Parser)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag selects one independent artifact"
)]
pub(crate) struct ShowCommand {
    /// Print the private SSH key.
    #[arg(long)]
    pub(crate) ssh: bool,
    /// Print the director IP address.
    #[arg(long)]
    pub(crate) bosh_ip: bool,
    /// Print the director admin password.
    #[arg(long)]
    pub(crate) bosh_password: bool,
    /// Print shell exports for targeting the director.
    #[arg(long)]
    pub(crate) bosh_environment: bool,
}
