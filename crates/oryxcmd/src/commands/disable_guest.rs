use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Disable auto-start of a guest during system boot
#[derive(Parser, Debug)]
pub struct DisableGuest {
    /// identifier of the guest to disable
    pub name: String,
}

pub fn run(args: DisableGuest, manager: &GuestManager) -> Result<()> {
    manager
        .disable_guest(&args.name)
        .with_context(|| format!("failed to disable guest {}", args.name))
}
