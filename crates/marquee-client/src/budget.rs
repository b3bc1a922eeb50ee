//! Failure budgets for the reset policy.

/// A counter with a fixed limit.
///
/// Every reset trigger in the client (strange replies, silent reads, failed
/// credential cycles) is the same shape: count occurrences, act when the
/// count reaches a limit, clear on recovery. One value object serves all of
/// them.
#[derive(Debug, Clone)]
pub struct FailureBudget {
    count: u32,
    limit: u32,
}

impl FailureBudget {
    /// Create a budget that is exhausted at `limit` recorded failures.
    pub fn new(limit: u32) -> Self {
        FailureBudget { count: 0, limit }
    }

    /// Record one failure. Returns true when the budget is exhausted.
    pub fn record(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count >= self.limit
    }

    /// Forget all recorded failures.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Failures recorded since the last clear.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Failures tolerated before the budget is exhausted.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}
