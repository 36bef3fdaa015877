use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use claimsync_events::InMemoryEventBus;
use claimsync_index::InMemoryEntryStore;
use claimsync_store::{ContentHasher, ContentStore, InMemoryContentStore};
use claimsync_sync::{ClaimSynchronizer, PollingScheduler, SyncConfig};
use claimsync_types::{Address, Claim};
use colored::Colorize;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Address(args) => cmd_address(args),
        Command::Config(args) => cmd_config(args),
    }
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let entries = Arc::new(InMemoryEntryStore::new());
    let content = Arc::new(InMemoryContentStore::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let synchronizer = Arc::new(ClaimSynchronizer::new(entries, content.clone(), bus));

    let mut addresses = Vec::new();
    if let Some(path) = &args.claims {
        for claim in parse_claims(&read(path)?)? {
            let bytes = claim.to_canonical_bytes()?;
            addresses.push(content.put(Bytes::from(bytes)).await?);
        }
    }
    if let Some(path) = &args.addresses {
        addresses.extend(parse_addresses(&read(path)?)?);
    }
    if !addresses.is_empty() {
        let outcome = synchronizer.register_addresses(&addresses).await?;
        println!(
            "{} Registered {} addresses ({} already known)",
            "✓".green().bold(),
            outcome.inserted.to_string().bold(),
            outcome.ignored
        );
    }

    let scheduler = PollingScheduler::from_config(synchronizer.clone(), &config)?;
    anyhow::ensure!(scheduler.start(), "scheduler failed to start");
    println!(
        "Polling every {}s. Press {} to stop.",
        config.download_interval_secs,
        "Ctrl-C".bold()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    scheduler.stop();

    let policy = config.retry_policy();
    let summary = synchronizer.summary(&policy).await?;
    println!();
    println!("Entries: {}", summary.total.to_string().bold());
    println!("  resolved:    {}", summary.resolved.to_string().green());
    println!("  eligible:    {}", summary.eligible.to_string().cyan());
    println!("  backing off: {}", summary.backing_off.to_string().yellow());
    println!("  exhausted:   {}", summary.exhausted.to_string().red());

    let stuck = synchronizer.stuck_entries(&policy).await?;
    if !stuck.is_empty() {
        println!("\n{} {} entries exceeded {} attempts:", "!".red().bold(), stuck.len(), policy.max_attempts);
        for entry in &stuck {
            println!("  {} ({} attempts)", entry.address.as_str().yellow(), entry.attempt_count);
        }
    }
    Ok(())
}

fn cmd_address(args: AddressArgs) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let claim = Claim::from_slice(&raw)?;
    let address = claim_address(&claim)?;
    println!("{}  {}", address.as_str().yellow(), claim.id);
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// The address [`InMemoryContentStore`] assigns to a claim's canonical bytes.
fn claim_address(claim: &Claim) -> anyhow::Result<Address> {
    Ok(ContentHasher::CLAIM.address(&claim.to_canonical_bytes()?))
}

/// One address per line; blank lines and `#` comments are skipped.
fn parse_addresses(text: &str) -> anyhow::Result<Vec<Address>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.parse::<Address>().map_err(anyhow::Error::from))
        .collect()
}

/// One JSON claim per line.
fn parse_claims(text: &str) -> anyhow::Result<Vec<Claim>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            Claim::from_slice(line.as_bytes()).with_context(|| format!("line {}", n + 1))
        })
        .collect()
}
