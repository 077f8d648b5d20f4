//! # oryxcmd
//! Control plane CLI for guest containers on an Oryx host. Registers
//! image sources, installs guests from them, and toggles autostart;
//! everything that actually runs a container is delegated to the
//! external OCI runtime.
mod commands;
mod observability;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use liboryx::{GuestManager, ManagerConfig};

#[derive(Parser, Debug)]
#[clap(version, author = env!("CARGO_PKG_AUTHORS"))]
struct Opts {
    #[clap(flatten)]
    global: GlobalOpts,

    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
struct GlobalOpts {
    /// set the log file to write oryxcmd logs to (default is '/dev/stderr')
    #[clap(short, long)]
    log: Option<PathBuf>,
    /// change log level to debug, but the `log-level` flag takes precedence
    #[clap(short = 'v', long)]
    debug: bool,
    /// set the log level (default: 'info')
    #[clap(long)]
    log_level: Option<String>,
    /// set the log format ('text' (default), or 'json')
    #[clap(long)]
    log_format: Option<String>,
    /// root directory for the state file and guest data
    #[clap(short, long)]
    root: Option<PathBuf>,
}

// One subcommand per registry operation; the verbs are the stable
// scripting surface, so they keep their snake_case spelling.
#[derive(Parser, Debug)]
#[clap(rename_all = "snake_case")]
enum SubCommand {
    AddSource(commands::add_source::AddSource),
    RemoveSource(commands::remove_source::RemoveSource),
    ListSources(commands::list_sources::ListSources),
    ShowSource(commands::show_source::ShowSource),
    AddGuest(commands::add_guest::AddGuest),
    RemoveGuest(commands::remove_guest::RemoveGuest),
    ListGuests(commands::list_guests::ListGuests),
    ShowGuest(commands::show_guest::ShowGuest),
    EnableGuest(commands::enable_guest::EnableGuest),
    DisableGuest(commands::disable_guest::DisableGuest),
    Runc(commands::runc::Runc),
}

fn main() -> Result<()> {
    let opts = Opts::parse();

    if let Err(err) = observability::init(&opts.global) {
        eprintln!("log init failed: {err:?}");
    }
    tracing::debug!(args = ?std::env::args_os(), "started");

    let config = match &opts.global.root {
        Some(root) => ManagerConfig::with_root(root.clone()),
        None => ManagerConfig::default(),
    };
    let manager = GuestManager::new(config);

    match opts.subcmd {
        SubCommand::AddSource(args) => commands::add_source::run(args, &manager),
        SubCommand::RemoveSource(args) => commands::remove_source::run(args, &manager),
        SubCommand::ListSources(args) => commands::list_sources::run(args, &manager),
        SubCommand::ShowSource(args) => commands::show_source::run(args, &manager),
        SubCommand::AddGuest(args) => commands::add_guest::run(args, &manager),
        SubCommand::RemoveGuest(args) => commands::remove_guest::run(args, &manager),
        SubCommand::ListGuests(args) => commands::list_guests::run(args, &manager),
        SubCommand::ShowGuest(args) => commands::show_guest::run(args, &manager),
        SubCommand::EnableGuest(args) => commands::enable_guest::run(args, &manager),
        SubCommand::DisableGuest(args) => commands::disable_guest::run(args, &manager),
        SubCommand::Runc(args) => commands::runc::run(args, &manager),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Opts::command().debug_assert();
    }

    #[test]
    fn test_verbs_keep_snake_case_spelling() {
        let opts = Opts::try_parse_from(["oryxcmd", "add_source", "s", "http://host/guests"])
            .expect("add_source should parse");
        assert!(matches!(opts.subcmd, SubCommand::AddSource(_)));

        let opts = Opts::try_parse_from(["oryxcmd", "list_guests"]).expect("should parse");
        assert!(matches!(opts.subcmd, SubCommand::ListGuests(_)));

        // Wrong arity is rejected before anything runs.
        assert!(Opts::try_parse_from(["oryxcmd", "add_source", "s"]).is_err());
        assert!(Opts::try_parse_from(["oryxcmd", "list_sources", "extra"]).is_err());
    }

    #[test]
    fn test_runc_passes_hyphenated_args_through() {
        let opts = Opts::try_parse_from(["oryxcmd", "runc", "g", "kill", "--all", "g"])
            .expect("runc passthrough should parse");
        let SubCommand::Runc(args) = opts.subcmd else {
            panic!("expected runc subcommand");
        };
        assert_eq!(args.name, "g");
        assert_eq!(args.args, ["kill", "--all", "g"]);
    }
}
