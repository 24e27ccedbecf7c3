use clap::{ArgAction, Command, CommandFactory, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ecslookup",
    about = "Resolve a domain through DoH resolvers once per EDNS client subnet and count the returned IPs",
    version,
    long_about = None,
    disable_help_flag = true
)]
pub struct Args {
    /// Subnet list file, one CIDR per line (repeatable)
    #[arg(short, long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Domain or hostname to resolve
    #[arg(short = 'h', long, num_args = 0..=1, default_missing_value = "")]
    pub host: Option<String>,

    /// DNS over HTTPS JSON API url (repeatable, default: https://doh.pub/dns-query)
    #[arg(short = 'd', long = "dns", value_name = "URL")]
    pub dns: Vec<String>,

    /// Number of worker threads (default: 32)
    #[arg(short, long, value_name = "N")]
    pub thread: Option<String>,

    /// Attempts per resolver before giving up on a subnet (default: 3)
    #[arg(short, long, value_name = "N")]
    pub attempts: Option<String>,

    /// Connect and read timeout per attempt, in seconds (default: 7)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<String>,

    /// Numeric DNS record type to query (default: 1)
    #[arg(short = 'r', long = "type", value_name = "TYPE")]
    pub record_type: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// Separate tokens the CLI does not know about from the ones it does.
///
/// The first token is the program name and is always kept. Values that follow
/// a known option are kept with it unless they are themselves a known flag.
/// Bundled short switches such as `-vx` are split, so `-v` is kept and `-x`
/// reported. Everything else unrecognized, including stray positional words,
/// is returned in the second vector.
pub fn split_unknown_flags(argv: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut command = Args::command();
    command.build();

    let mut known = Vec::with_capacity(argv.len());
    let mut unknown = Vec::new();
    let mut tokens = argv.into_iter().peekable();

    if let Some(program) = tokens.next() {
        known.push(program);
    }

    while let Some(token) = tokens.next() {
        let wants_value = if let Some(long) = token.strip_prefix("--") {
            match long_flag(&command, long) {
                Some(wants_value) => {
                    known.push(token);
                    wants_value
                }
                None => {
                    unknown.push(token);
                    false
                }
            }
        } else if let Some(cluster) = token.strip_prefix('-').filter(|c| !c.is_empty()) {
            expand_short_cluster(&command, cluster, &mut known, &mut unknown)
        } else {
            unknown.push(token);
            false
        };

        if wants_value {
            if let Some(value) = tokens.next_if(|next| !is_known_flag(&command, next)) {
                known.push(value);
            }
        }
    }

    (known, unknown)
}

/// `Some(true)` when the long option still needs its value from the next token.
fn long_flag(command: &Command, long: &str) -> Option<bool> {
    let (name, inline) = match long.split_once('=') {
        Some((name, _)) => (name, true),
        None => (long, false),
    };
    let arg = command.get_arguments().find(|a| a.get_long() == Some(name))?;
    Some(arg.get_action().takes_values() && !inline)
}

/// Push each flag of a short cluster to `known` or `unknown`. A value-taking
/// flag ends the cluster; the remainder is its inline value. Returns true
/// when that flag still needs its value from the next token.
fn expand_short_cluster(
    command: &Command,
    cluster: &str,
    known: &mut Vec<String>,
    unknown: &mut Vec<String>,
) -> bool {
    for (i, flag) in cluster.char_indices() {
        let Some(arg) = command.get_arguments().find(|a| a.get_short() == Some(flag)) else {
            unknown.push(format!("-{}", flag));
            continue;
        };
        if arg.get_action().takes_values() {
            let value = &cluster[i + flag.len_utf8()..];
            known.push(format!("-{}{}", flag, value));
            return value.is_empty();
        }
        known.push(format!("-{}", flag));
    }
    false
}

fn is_known_flag(command: &Command, token: &str) -> bool {
    if let Some(long) = token.strip_prefix("--") {
        return long_flag(command, long).is_some();
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(flag)) => command.get_arguments().any(|a| a.get_short() == Some(flag)),
        _ => false,
    }
}
