use crate::aggregate::CountMap;

/// Query outcomes for one subnet list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListStats {
    /// Subnet tasks run.
    pub tasks: u64,
    /// Endpoint queries that got a response.
    pub answered: u64,
    /// Endpoint queries that ran out of attempts.
    pub exhausted: u64,
    /// Subnet tasks dropped because a response could not be parsed.
    pub failed_tasks: u64,
}

impl ListStats {
    pub fn combined(self, other: ListStats) -> ListStats {
        ListStats {
            tasks: self.tasks + other.tasks,
            answered: self.answered + other.answered,
            exhausted: self.exhausted + other.exhausted,
            failed_tasks: self.failed_tasks + other.failed_tasks,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListReport {
    pub id: String,
    pub counts: CountMap,
    pub stats: ListStats,
}

#[derive(Debug, Default, Clone)]
pub struct LookupReport {
    pub lists: Vec<ListReport>,
    pub global: CountMap,
}
