pub mod aggregate;
pub mod args;
pub mod config;
pub mod error;
pub mod input;
pub mod lookup;
pub mod progress;
pub mod resolver;
pub mod scheduler;
pub mod stats;
pub mod utils;

pub use aggregate::CountMap;
pub use args::Args;
pub use config::LookupConfig;
pub use error::{ConfigError, ParseError, TransportError};
pub use input::SubnetList;
pub use lookup::{print_report, render_report, run_lookup};
pub use progress::{LogProgress, ProgressObserver, ProgressSnapshot, ProgressTracker, SilentProgress};
pub use resolver::{DohQuery, HttpTransport, RecordType, Resolution, Resolver, Timeouts, Transport};
pub use scheduler::Scheduler;
pub use stats::{ListReport, ListStats, LookupReport};
