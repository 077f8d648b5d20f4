use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Delete an existing guest container and its on-disk data
#[derive(Parser, Debug)]
pub struct RemoveGuest {
    /// identifier of the guest to remove
    pub name: String,
}

pub fn run(args: RemoveGuest, manager: &GuestManager) -> Result<()> {
    manager
        .remove_guest(&args.name)
        .with_context(|| format!("failed to remove guest {}", args.name))
}
