use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "claimsync",
    about = "Resolve content-addressed claims into the claim index",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the resolution scheduler until interrupted
    Run(RunArgs),
    /// Print the content address a claim would be stored under
    Address(AddressArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// File of addresses to register as unresolved, one per line
    #[arg(long)]
    pub addresses: Option<PathBuf>,
    /// File of JSON claims, one per line, to place in the content store
    /// as if another node had published them
    #[arg(long)]
    pub claims: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddressArgs {
    /// Claim JSON document
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
