//! Occurrence counting for resolved IPs.
//!
//! One [`CountMap`] is built per subnet list and a second one accumulates the
//! union of all lists. Merging is plain addition, so the final contents do not
//! depend on the order in which workers finish.

use std::collections::HashMap;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CountMap {
    counts: HashMap<String, u64>,
}

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of every IP in `ips`.
    pub fn merge<I, S>(&mut self, ips: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ip in ips {
            let ip = ip.as_ref();
            match self.counts.get_mut(ip) {
                Some(count) => *count += 1,
                None => {
                    self.counts.insert(ip.to_string(), 1);
                }
            }
        }
    }

    /// Add every counter of `other` into this map.
    pub fn merge_map(&mut self, other: &CountMap) {
        for (ip, count) in &other.counts {
            *self.counts.entry(ip.clone()).or_insert(0) += count;
        }
    }

    /// Combine two maps, reusing the larger allocation.
    pub fn combined(self, other: CountMap) -> CountMap {
        let (mut into, from) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        into.merge_map(&from);
        into
    }

    pub fn get(&self, ip: &str) -> u64 {
        self.counts.get(ip).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(ip, count)| (ip.as_str(), *count))
    }

    /// Entries ordered by count (highest first), ties broken by IP.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for CountMap {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        let mut map = CountMap::new();
        for (ip, count) in iter {
            *map.counts.entry(ip.into()).or_insert(0) += count;
        }
        map
    }
}
