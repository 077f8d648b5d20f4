use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Show details of a previously registered guest in JSON format
#[derive(Parser, Debug)]
pub struct ShowGuest {
    /// identifier of the guest to show
    pub name: String,
}

pub fn run(args: ShowGuest, manager: &GuestManager) -> Result<()> {
    let guest = manager
        .show_guest(&args.name)
        .with_context(|| format!("failed to show guest {}", args.name))?;
    super::print_json(&guest)
}
