use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Register a new source from which guest images may be fetched
#[derive(Parser, Debug)]
pub struct AddSource {
    /// identifier used to reference this source in future commands
    pub name: String,
    /// root URL under which image archives are published, e.g.
    /// https://downloads.toganlabs.com/oryx/0.2/guests
    pub url: String,
}

pub fn run(args: AddSource, manager: &GuestManager) -> Result<()> {
    manager
        .add_source(&args.name, &args.url)
        .with_context(|| format!("failed to add source {}", args.name))
}
