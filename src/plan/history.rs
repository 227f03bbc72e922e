//! Bounded, most-recent-first log of execution results.

use std::collections::VecDeque;

use crate::plan::types::ExecutionResult;

/// Default number of execution results retained.
pub const HISTORY_CAPACITY: usize = 100;

/// Fixed-capacity deque of [`ExecutionResult`]s, newest first.
/// Eviction is O(1).
#[derive(Debug)]
pub struct ExecutionHistory {
    entries: VecDeque<ExecutionResult>,
    capacity: usize,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a result to the front, evicting the oldest entry past
    /// capacity.
    pub fn push(&mut self, result: ExecutionResult) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(result);
    }

    /// The most recent `limit` results, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ExecutionResult> {
        self.entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn result(plan_id: &str) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            plan_id: plan_id.to_string(),
            steps: Vec::new(),
            success: true,
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut history = ExecutionHistory::new(10);
        history.push(result("first"));
        history.push(result("second"));

        let recent = history.recent(10);

        assert_eq!(recent[0].plan_id, "second");
        assert_eq!(recent[1].plan_id, "first");
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut history = ExecutionHistory::new(3);
        for i in 0..5 {
            history.push(result(&format!("plan-{i}")));
        }

        assert_eq!(history.len(), 3);
        let recent = history.recent(10);
        assert_eq!(recent[0].plan_id, "plan-4");
        assert_eq!(recent[2].plan_id, "plan-2");
    }

    #[test]
    fn test_recent_respects_limit() {
        let mut history = ExecutionHistory::new(10);
        for i in 0..8 {
            history.push(result(&format!("plan-{i}")));
        }

        assert_eq!(history.recent(3).len(), 3);
    }
}
