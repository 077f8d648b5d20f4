use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// List all currently registered sources
#[derive(Parser, Debug)]
pub struct ListSources {}

pub fn run(_: ListSources, manager: &GuestManager) -> Result<()> {
    for name in manager
        .list_sources()
        .context("failed to list sources")?
    {
        println!("{name}");
    }
    Ok(())
}
