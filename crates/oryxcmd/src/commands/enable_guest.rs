use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Enable auto-start of a guest during system boot
#[derive(Parser, Debug)]
pub struct EnableGuest {
    /// identifier of the guest to enable
    pub name: String,
}

pub fn run(args: EnableGuest, manager: &GuestManager) -> Result<()> {
    manager
        .enable_guest(&args.name)
        .with_context(|| format!("failed to enable guest {}", args.name))
}
