use anyhow::{Context, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::aggregate::CountMap;
use crate::error::ParseError;
use crate::input::SubnetList;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::resolver::{DohQuery, RecordType, Resolution, Resolver, Transport};
use crate::stats::{ListReport, ListStats, LookupReport};

/// Counts and statistics collected for one subnet list.
#[derive(Debug, Default)]
pub struct ListOutcome {
    pub counts: CountMap,
    pub stats: ListStats,
}

impl ListOutcome {
    fn combined(self, other: ListOutcome) -> ListOutcome {
        ListOutcome {
            counts: self.counts.combined(other.counts),
            stats: self.stats.combined(other.stats),
        }
    }
}

/// Result of querying every endpoint for one subnet.
enum TaskOutcome {
    Merged {
        ips: Vec<String>,
        answered: u64,
        exhausted: u64,
    },
    Fatal {
        endpoint: Url,
        error: ParseError,
    },
}

/// Runs one resolution task per subnet on a bounded worker pool.
pub struct Scheduler<T> {
    resolver: Resolver<T>,
    domain: String,
    record_type: RecordType,
    endpoints: Vec<Url>,
    pool: ThreadPool,
}

impl<T: Transport> Scheduler<T> {
    pub fn new(
        resolver: Resolver<T>,
        domain: impl Into<String>,
        endpoints: Vec<Url>,
        parallelism: usize,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(parallelism.max(1))
            .thread_name(|index| format!("ecs-worker-{}", index))
            .build()
            .context("Failed to build resolver thread pool")?;

        Ok(Self {
            resolver,
            domain: domain.into(),
            record_type: RecordType::default(),
            endpoints,
            pool,
        })
    }

    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    pub fn parallelism(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Resolve every list in order and fold each finished list into the
    /// global counts. Lists whose id was already seen are skipped.
    pub fn run_all(&self, lists: &[SubnetList], observer: &dyn ProgressObserver) -> LookupReport {
        let mut seen = HashSet::new();
        let unique: Vec<&SubnetList> = lists
            .iter()
            .filter(|list| {
                let first = seen.insert(list.id.as_str());
                if !first {
                    warn!(
                        action = "skip",
                        component = "scheduler",
                        list = %list.id,
                        "Subnet list given more than once, skipping lookup"
                    );
                }
                first
            })
            .collect();

        let total = unique.iter().map(|list| list.subnets.len() as u64).sum();
        let tracker = ProgressTracker::new(total);
        let mut report = LookupReport::default();

        for list in unique {
            let outcome = self.run_list(list, &tracker, observer);
            report.global.merge_map(&outcome.counts);
            report.lists.push(ListReport {
                id: list.id.clone(),
                counts: outcome.counts,
                stats: outcome.stats,
            });
        }

        report
    }

    /// Resolve one list. Returns once every subnet task has finished.
    pub fn run_list(
        &self,
        list: &SubnetList,
        tracker: &ProgressTracker,
        observer: &dyn ProgressObserver,
    ) -> ListOutcome {
        let start_time = Instant::now();
        info!(
            action = "start",
            component = "scheduler",
            list = %list.id,
            domain = %self.domain,
            subnets = list.subnets.len(),
            endpoints = self.endpoints.len(),
            workers = self.parallelism(),
            "Resolving subnet list"
        );
        tracker.start_list(list.subnets.len() as u64);

        let outcome = self.pool.install(|| {
            list.subnets
                .par_iter()
                .fold(ListOutcome::default, |mut acc, subnet| {
                    acc.stats.tasks += 1;
                    match self.run_task(subnet) {
                        TaskOutcome::Merged {
                            ips,
                            answered,
                            exhausted,
                        } => {
                            acc.counts.merge(&ips);
                            acc.stats.answered += answered;
                            acc.stats.exhausted += exhausted;
                        }
                        TaskOutcome::Fatal { endpoint, error } => {
                            warn!(
                                action = "parse",
                                component = "scheduler",
                                list = %list.id,
                                subnet = %subnet,
                                endpoint = %endpoint,
                                error = %error,
                                "Unparseable DoH response, dropping subnet"
                            );
                            acc.stats.failed_tasks += 1;
                        }
                    }
                    observer.task_completed(&list.id, tracker.complete_task());
                    acc
                })
                .reduce(ListOutcome::default, ListOutcome::combined)
        });

        info!(
            action = "complete",
            component = "scheduler",
            list = %list.id,
            distinct_ips = outcome.counts.len(),
            answered = outcome.stats.answered,
            exhausted = outcome.stats.exhausted,
            failed_tasks = outcome.stats.failed_tasks,
            duration_ms = start_time.elapsed().as_millis(),
            "Subnet list resolved"
        );
        outcome
    }

    /// Query every endpoint in order for `subnet`. A parse failure on any
    /// endpoint discards the whole task.
    fn run_task(&self, subnet: &str) -> TaskOutcome {
        let query = DohQuery {
            domain: &self.domain,
            subnet,
            record_type: self.record_type,
        };
        let mut ips = Vec::new();
        let mut answered = 0;
        let mut exhausted = 0;

        for endpoint in &self.endpoints {
            match self.resolver.resolve(endpoint, &query) {
                Resolution::Answered(found) => {
                    answered += 1;
                    ips.extend(found);
                }
                Resolution::Exhausted { .. } => exhausted += 1,
                Resolution::Fatal(error) => {
                    return TaskOutcome::Fatal {
                        endpoint: endpoint.clone(),
                        error,
                    }
                }
            }
        }

        TaskOutcome::Merged {
            ips,
            answered,
            exhausted,
        }
    }
}
