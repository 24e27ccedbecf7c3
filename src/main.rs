use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::{error, warn};

use ecslookup::{args, input, utils, Args, LookupConfig};

fn main() -> Result<()> {
    let (argv, unknown) = args::split_unknown_flags(std::env::args().collect());
    let args = Args::parse_from(argv);
    utils::setup_logging(args.verbose);

    for parameter in &unknown {
        warn!(action = "parse", component = "arguments", parameter = %parameter, "Unknown parameter, ignoring");
    }

    let config = match LookupConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            warn!(action = "validate", component = "config", error = %e, "Nothing to look up");
            Args::command().print_help()?;
            return Ok(());
        }
    };

    let lists = input::load_subnet_lists(&config.inputs);
    if lists.is_empty() {
        error!(action = "load", component = "input", "No subnet list could be read");
        std::process::exit(1);
    }

    match ecslookup::run_lookup(&config, &lists) {
        Ok(report) => {
            ecslookup::print_report(&report);
            Ok(())
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!(action = "complete", component = "lookup", error = %message, "Lookup failed");
            std::process::exit(1);
        }
    }
}
