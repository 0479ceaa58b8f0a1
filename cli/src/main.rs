use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use dotlink::cli::{Cli, Command};
use dotlink::error::DotlinkError;
use dotlink::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    if matches!(args.command, Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let name = args.command.name();
    logging::init_subscriber(args.verbose, name);
    let log = Arc::new(logging::Logger::new(name));

    let result = match &args.command {
        Command::Link => commands::link::run(&args.global, &log),
        Command::Unlink => commands::unlink::run(&args.global, &log),
        Command::Prune => commands::prune::run(&args.global, &log),
        Command::Status => commands::status::run(&args.global, &log),
        Command::Adopt(opts) => commands::adopt::run(&args.global, opts, &log),
        Command::Orphan(opts) => commands::orphan::run(&args.global, opts, &log),
        Command::Version => Ok(()),
    };

    if let Err(err) = &result
        && let Some(hint) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<DotlinkError>())
            .and_then(DotlinkError::hint)
    {
        log.info(&format!("hint: {hint}"));
    }
    result
}
