use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Remove a previously registered source
#[derive(Parser, Debug)]
pub struct RemoveSource {
    /// identifier of the source to remove
    pub name: String,
}

pub fn run(args: RemoveSource, manager: &GuestManager) -> Result<()> {
    manager
        .remove_source(&args.name)
        .with_context(|| format!("failed to remove source {}", args.name))
}
