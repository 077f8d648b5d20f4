use anyhow::{Context, Result};
use clap::Parser;
use liboryx::GuestManager;

/// Execute the external OCI runtime for an existing guest; see the
/// runtime's own documentation for the accepted arguments
#[derive(Parser, Debug)]
pub struct Runc {
    /// identifier of the guest the runtime is invoked for
    pub name: String,
    /// arguments passed through to the runtime verbatim
    #[clap(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub fn run(args: Runc, manager: &GuestManager) -> Result<()> {
    manager
        .runtime(&args.name, &args.args)
        .with_context(|| format!("failed to invoke runtime for guest {}", args.name))
}
