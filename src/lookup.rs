use anyhow::{Context, Result};
use std::fmt::Write;
use std::time::Instant;
use tracing::info;

use crate::aggregate::CountMap;
use crate::config::LookupConfig;
use crate::input::SubnetList;
use crate::progress::LogProgress;
use crate::resolver::{HttpTransport, Resolver};
use crate::scheduler::Scheduler;
use crate::stats::LookupReport;
use crate::utils::format_number;

/// Resolve `config.domain` for every subnet of every list over HTTP.
pub fn run_lookup(config: &LookupConfig, lists: &[SubnetList]) -> Result<LookupReport> {
    let total_start_time = Instant::now();
    let endpoints: Vec<&str> = config.endpoints.iter().map(|e| e.as_str()).collect();
    info!(
        action = "start",
        component = "lookup",
        domain = %config.domain,
        lists = lists.len(),
        endpoints = ?endpoints,
        record_type = %config.record_type,
        "Starting subnet lookup"
    );

    let transport = HttpTransport::new(config.timeouts).context("Failed to build HTTP client")?;
    let resolver = Resolver::new(transport, config.max_attempts);
    let scheduler = Scheduler::new(
        resolver,
        config.domain.clone(),
        config.endpoints.clone(),
        config.parallelism,
    )?
    .with_record_type(config.record_type);

    let report = scheduler.run_all(lists, &LogProgress);

    info!(
        action = "complete",
        component = "lookup",
        distinct_ips = report.global.len(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Lookup completed"
    );
    Ok(report)
}

pub fn render_report(report: &LookupReport) -> String {
    let mut out = String::new();
    for list in &report.lists {
        render_counts(&mut out, &list.id, &list.counts);
    }
    render_counts(&mut out, "all", &report.global);
    out
}

fn render_counts(out: &mut String, label: &str, counts: &CountMap) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{} results: ({})", format_number(counts.len() as u64), label);
    for (ip, count) in counts.sorted() {
        let _ = writeln!(out, "{}\t\t\ttotal: {}", ip, format_number(count));
    }
}

pub fn print_report(report: &LookupReport) {
    print!("{}", render_report(report));
}
