use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Show details of a previously registered source in JSON format
#[derive(Parser, Debug)]
pub struct ShowSource {
    /// identifier of the source to show
    pub name: String,
}

pub fn run(args: ShowSource, manager: &GuestManager) -> Result<()> {
    let source = manager
        .show_source(&args.name)
        .with_context(|| format!("failed to show source {}", args.name))?;
    super::print_json(&source)
}
