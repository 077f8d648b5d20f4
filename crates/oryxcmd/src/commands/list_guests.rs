use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// List all currently registered guests
#[derive(Parser, Debug)]
pub struct ListGuests {}

pub fn run(_: ListGuests, manager: &GuestManager) -> Result<()> {
    for name in manager.list_guests().context("failed to list guests")? {
        println!("{name}");
    }
    Ok(())
}
