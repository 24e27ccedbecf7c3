use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::error::ConfigError;
use crate::resolver::{RecordType, Timeouts};
use crate::Args;

pub const DEFAULT_ENDPOINT: &str = "https://doh.pub/dns-query";
pub const DEFAULT_PARALLELISM: usize = 32;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 7;
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Validated settings for one lookup run.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub domain: String,
    pub inputs: Vec<PathBuf>,
    pub endpoints: Vec<Url>,
    pub parallelism: usize,
    pub max_attempts: u32,
    pub timeouts: Timeouts,
    pub record_type: RecordType,
}

impl LookupConfig {
    /// Build the run configuration. Bad endpoints, bad numeric values and
    /// missing input files are reported and skipped; only a missing host or
    /// the absence of any usable input file is an error.
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let inputs: Vec<PathBuf> = args
            .inputs
            .iter()
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    warn!(action = "validate", component = "config", file_path = ?path, "Input file does not exist, skipping");
                }
                exists
            })
            .cloned()
            .collect();

        let mut endpoints: Vec<Url> = args.dns.iter().filter_map(|raw| parse_endpoint(raw)).collect();
        if endpoints.is_empty() {
            endpoints.push(default_endpoint());
        }

        let parallelism = setting(args.thread.as_deref(), "--thread", DEFAULT_PARALLELISM, parse_at_least_one);
        let max_attempts = setting(args.attempts.as_deref(), "--attempts", DEFAULT_MAX_ATTEMPTS, parse_at_least_one);
        let timeout_secs = setting(args.timeout.as_deref(), "--timeout", DEFAULT_TIMEOUT_SECS, |raw| {
            parse_at_least_one::<u64>(raw).filter(|&secs| secs <= MAX_TIMEOUT_SECS)
        });
        let record_type = setting(args.record_type.as_deref(), "--type", RecordType::A.0, parse_at_least_one);

        let domain = args.host.as_deref().map(str::trim).unwrap_or_default();
        if domain.is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if inputs.is_empty() {
            return Err(ConfigError::MissingInput);
        }

        Ok(Self {
            domain: domain.to_string(),
            inputs,
            endpoints,
            parallelism,
            max_attempts,
            timeouts: Timeouts::uniform(Duration::from_secs(timeout_secs)),
            record_type: RecordType(record_type),
        })
    }
}

pub fn default_endpoint() -> Url {
    Url::parse(DEFAULT_ENDPOINT).unwrap_or_else(|_| unreachable!("default endpoint is a valid URL"))
}

/// Accept absolute `http`/`https` URLs only.
pub fn parse_endpoint(raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
        Ok(_) => {
            warn!(action = "validate", component = "config", endpoint = raw, "Not a DoH API url, skipping");
            None
        }
        Err(e) => {
            warn!(action = "validate", component = "config", endpoint = raw, error = %e, "Not a DoH API url, skipping");
            None
        }
    }
}

/// Parse an optional numeric flag, falling back to `fallback` with a warning
/// when the value is unusable.
fn setting<T, F>(raw: Option<&str>, flag: &'static str, fallback: T, parse: F) -> T
where
    T: Copy + fmt::Display,
    F: Fn(&str) -> Option<T>,
{
    let Some(raw) = raw else {
        return fallback;
    };
    parse(raw).unwrap_or_else(|| {
        warn!(action = "validate", component = "config", flag, value = raw, fallback = %fallback, "Invalid value, using default");
        fallback
    })
}

fn parse_at_least_one<T>(raw: &str) -> Option<T>
where
    T: FromStr + PartialOrd + From<u8>,
{
    raw.trim().parse::<T>().ok().filter(|n| *n >= T::from(1))
}
