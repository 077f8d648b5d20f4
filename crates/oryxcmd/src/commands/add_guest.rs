use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Create a new guest container from an image
#[derive(Parser, Debug)]
pub struct AddGuest {
    /// identifier used to reference this guest in future commands
    pub name: String,
    /// fully-qualified image reference in the form "<source>:<image>"
    pub image: String,
}

pub fn run(args: AddGuest, manager: &GuestManager) -> Result<()> {
    manager
        .add_guest(&args.name, &args.image)
        .with_context(|| format!("failed to add guest {} from {}", args.name, args.image))
}
