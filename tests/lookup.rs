use std::io;
use std::sync::Mutex;

use ecslookup::{
    CountMap, DohQuery, ProgressObserver, ProgressSnapshot, RecordType, Resolver, Scheduler,
    SilentProgress, SubnetList, Transport, TransportError,
};
use url::Url;

struct FnTransport<F>(F);

impl<F> Transport for FnTransport<F>
where
    F: Fn(&Url, &DohQuery<'_>) -> Result<String, TransportError> + Send + Sync,
{
    fn fetch(&self, endpoint: &Url, query: &DohQuery<'_>) -> Result<String, TransportError> {
        (self.0)(endpoint, query)
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<(String, ProgressSnapshot)>>);

impl ProgressObserver for Recorder {
    fn task_completed(&self, list: &str, progress: ProgressSnapshot) {
        self.0.lock().unwrap().push((list.to_string(), progress));
    }
}

fn answer(ips: &[&str]) -> String {
    let entries: Vec<String> = ips
        .iter()
        .map(|ip| format!(r#"{{"name":"example.com.","type":1,"TTL":300,"data":"{}"}}"#, ip))
        .collect();
    format!(r#"{{"Status":0,"Answer":[{}]}}"#, entries.join(","))
}

fn endpoint(host: &str) -> Url {
    Url::parse(&format!("https://{}/dns-query", host)).unwrap()
}

fn list(id: &str, subnets: &[&str]) -> SubnetList {
    SubnetList::new(id, subnets.iter().map(|s| s.to_string()).collect())
}

fn scheduler<F>(transport: F, endpoints: Vec<Url>, parallelism: usize) -> Scheduler<FnTransport<F>>
where
    F: Fn(&Url, &DohQuery<'_>) -> Result<String, TransportError> + Send + Sync,
{
    Scheduler::new(
        Resolver::new(FnTransport(transport), 3),
        "example.com",
        endpoints,
        parallelism,
    )
    .unwrap()
}

#[test]
fn same_ip_for_every_subnet() {
    let scheduler = scheduler(
        |_, query| {
            assert_eq!(query.domain, "example.com");
            assert_eq!(query.record_type, RecordType::A);
            Ok(answer(&["9.9.9.9"]))
        },
        vec![endpoint("doh.example")],
        32,
    );

    let report = scheduler.run_all(
        &[list("ct.txt", &["1.0.1.0/24", "1.0.2.0/23", "1.0.8.0/21"])],
        &SilentProgress,
    );

    assert_eq!(report.lists.len(), 1);
    assert_eq!(report.lists[0].id, "ct.txt");
    assert_eq!(report.lists[0].counts.get("9.9.9.9"), 3);
    assert_eq!(report.lists[0].counts.len(), 1);
    assert_eq!(report.global.get("9.9.9.9"), 3);
}

#[test]
fn global_sums_per_list_counts() {
    let scheduler = scheduler(
        |_, query| {
            Ok(match query.subnet {
                "10.0.0.0/24" | "10.0.1.0/24" | "10.0.2.0/24" => answer(&["1.1.1.1"]),
                "10.0.3.0/24" => answer(&["2.2.2.2"]),
                _ => "{}".to_string(),
            })
        },
        vec![endpoint("doh.example")],
        4,
    );

    let report = scheduler.run_all(
        &[
            list("a.txt", &["10.0.0.0/24", "10.0.1.0/24"]),
            list("b.txt", &["10.0.2.0/24", "10.0.3.0/24", "10.0.4.0/24"]),
        ],
        &SilentProgress,
    );

    let expected_a: CountMap = [("1.1.1.1", 2)].into_iter().collect();
    let expected_b: CountMap = [("1.1.1.1", 1), ("2.2.2.2", 1)].into_iter().collect();
    let expected_global: CountMap = [("1.1.1.1", 3), ("2.2.2.2", 1)].into_iter().collect();

    assert_eq!(report.lists[0].counts, expected_a);
    assert_eq!(report.lists[1].counts, expected_b);
    assert_eq!(report.global, expected_global);
}

#[test]
fn duplicate_list_is_counted_once() {
    let scheduler = scheduler(|_, _| Ok(answer(&["9.9.9.9"])), vec![endpoint("doh.example")], 8);
    let recorder = Recorder::default();

    let report = scheduler.run_all(
        &[
            list("ct.txt", &["1.0.1.0/24", "1.0.2.0/23"]),
            list("ct.txt", &["1.0.1.0/24", "1.0.2.0/23"]),
        ],
        &recorder,
    );

    assert_eq!(report.lists.len(), 1);
    assert_eq!(report.global.get("9.9.9.9"), 2);

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|(_, p)| p.total == 2));
}

#[test]
fn unparseable_response_drops_only_that_subnet() {
    let scheduler = scheduler(
        |endpoint, query| match (endpoint.host_str(), query.subnet) {
            (Some("second.example"), "10.0.1.0/24") => Ok("<html>bad gateway</html>".to_string()),
            _ => Ok(answer(&["1.1.1.1"])),
        },
        vec![endpoint("first.example"), endpoint("second.example")],
        4,
    );

    let report = scheduler.run_all(
        &[list("a.txt", &["10.0.0.0/24", "10.0.1.0/24", "10.0.2.0/24"])],
        &SilentProgress,
    );

    let stats = report.lists[0].stats;
    assert_eq!(stats.tasks, 3);
    assert_eq!(stats.failed_tasks, 1);
    assert_eq!(stats.answered, 4);
    // two surviving subnets, each answered by both endpoints
    assert_eq!(report.global.get("1.1.1.1"), 4);
}

#[test]
fn unreachable_endpoint_falls_through_to_next() {
    let scheduler = scheduler(
        |endpoint, _| match endpoint.host_str() {
            Some("down.example") => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out").into())
            }
            _ => Ok(answer(&["8.8.8.8", "8.8.4.4"])),
        },
        vec![endpoint("down.example"), endpoint("up.example")],
        2,
    );

    let report = scheduler.run_all(&[list("a.txt", &["10.0.0.0/24"])], &SilentProgress);

    let stats = report.lists[0].stats;
    assert_eq!(stats.exhausted, 1);
    assert_eq!(stats.answered, 1);
    assert_eq!(report.global.get("8.8.8.8"), 1);
    assert_eq!(report.global.get("8.8.4.4"), 1);
}

#[test]
fn counts_are_stable_under_parallel_workers() {
    let subnets: Vec<String> = (0..512).map(|i| format!("10.{}.{}.0/24", i / 256, i % 256)).collect();
    let lists = vec![
        SubnetList::new("a.txt", subnets[..300].to_vec()),
        SubnetList::new("b.txt", subnets[300..].to_vec()),
    ];
    let scheduler = scheduler(
        |_, query| {
            let octet: u32 = query.subnet.split('.').nth(2).unwrap().parse().unwrap();
            Ok(answer(&[if octet % 2 == 0 { "1.1.1.1" } else { "2.2.2.2" }, "3.3.3.3"]))
        },
        vec![endpoint("doh.example")],
        16,
    );
    let recorder = Recorder::default();

    let report = scheduler.run_all(&lists, &recorder);

    assert_eq!(report.global.get("1.1.1.1"), 256);
    assert_eq!(report.global.get("2.2.2.2"), 256);
    assert_eq!(report.global.get("3.3.3.3"), 512);
    for ip in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
        let per_list: u64 = report.lists.iter().map(|l| l.counts.get(ip)).sum();
        assert_eq!(report.global.get(ip), per_list);
    }

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 512);
    let last_of_b = events.iter().filter(|(id, _)| id == "b.txt").map(|(_, p)| p.list_completed).max();
    assert_eq!(last_of_b, Some(212));
    assert_eq!(events.iter().map(|(_, p)| p.completed).max(), Some(512));
}
