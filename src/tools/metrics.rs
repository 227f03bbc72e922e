//! Per-tool usage, timing, and error metrics.
//!
//! The registry owns one [`ToolMetrics`] entry per known tool for the
//! process lifetime. [`RegistryMetrics`] is the aggregated snapshot
//! handed to an external observability pipeline.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of a tool's most recent dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct LastExecution {
    pub at: DateTime<Utc>,
    pub success: bool,
    pub correlation_id: Uuid,
}

/// Detail of a tool's most recent failure.
#[derive(Debug, Clone, Serialize)]
pub struct LastError {
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Metrics for a single tool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolMetrics {
    pub calls: u64,
    pub failures: u64,
    pub total_time: Duration,
    pub avg_time: Duration,
    pub last_execution: Option<LastExecution>,
    pub last_error: Option<LastError>,
}

impl ToolMetrics {
    /// Fraction of calls that succeeded; 0 when the tool never ran.
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            (self.calls - self.failures) as f64 / self.calls as f64
        }
    }
}

/// Book of per-tool metrics behind the registry's lock.
#[derive(Debug, Default)]
pub(crate) struct MetricsBook {
    tools: HashMap<String, ToolMetrics>,
}

impl MetricsBook {
    /// Ensure a metrics entry exists for a registered name.
    pub fn touch(&mut self, name: &str) {
        self.tools.entry(name.to_string()).or_default();
    }

    pub fn record_success(&mut self, name: &str, duration: Duration, correlation_id: Uuid) {
        let metrics = self.tools.entry(name.to_string()).or_default();
        metrics.calls += 1;
        metrics.total_time += duration;
        metrics.avg_time = metrics.total_time / metrics.calls as u32;
        metrics.last_execution = Some(LastExecution {
            at: Utc::now(),
            success: true,
            correlation_id,
        });
    }

    pub fn record_failure(
        &mut self,
        name: &str,
        error: &str,
        duration: Duration,
        correlation_id: Uuid,
    ) {
        let now = Utc::now();
        let metrics = self.tools.entry(name.to_string()).or_default();
        metrics.calls += 1;
        metrics.failures += 1;
        metrics.total_time += duration;
        metrics.avg_time = metrics.total_time / metrics.calls as u32;
        metrics.last_execution = Some(LastExecution {
            at: now,
            success: false,
            correlation_id,
        });
        metrics.last_error = Some(LastError {
            message: error.to_string(),
            at: now,
        });
    }

    pub fn get(&self, name: &str) -> Option<ToolMetrics> {
        self.tools.get(name).cloned()
    }

    /// Reset all counters, preserving the set of known tool names.
    pub fn clear(&mut self) {
        for metrics in self.tools.values_mut() {
            *metrics = ToolMetrics::default();
        }
    }

    /// Aggregate the book into an export snapshot.
    pub fn snapshot(&self, registered_tools: Vec<String>) -> RegistryMetrics {
        let executions: u64 = self.tools.values().map(|m| m.calls).sum();
        let errors: u64 = self.tools.values().map(|m| m.failures).sum();
        let total_execution_time: Duration = self.tools.values().map(|m| m.total_time).sum();

        let average_execution_time = if executions == 0 {
            Duration::ZERO
        } else {
            total_execution_time / executions as u32
        };

        let last_execution = self
            .tools
            .values()
            .filter_map(|m| m.last_execution.as_ref())
            .max_by_key(|e| e.at)
            .cloned();

        let last_error = self
            .tools
            .values()
            .filter_map(|m| m.last_error.as_ref())
            .max_by_key(|e| e.at)
            .cloned();

        let success_rate = if executions == 0 {
            0.0
        } else {
            (executions - errors) as f64 / executions as f64
        };

        RegistryMetrics {
            executions,
            errors,
            tool_usage: self.tools.clone(),
            average_execution_time,
            total_execution_time,
            last_execution,
            last_error,
            success_rate,
            tool_count: registered_tools.len(),
            registered_tools,
            timestamp: Utc::now(),
        }
    }
}

/// Aggregated snapshot of registry activity.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryMetrics {
    pub executions: u64,
    pub errors: u64,
    pub tool_usage: HashMap<String, ToolMetrics>,
    pub average_execution_time: Duration,
    pub total_execution_time: Duration,
    pub last_execution: Option<LastExecution>,
    pub last_error: Option<LastError>,
    pub success_rate: f64,
    pub registered_tools: Vec<String>,
    pub tool_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut book = MetricsBook::default();

        book.record_success("tool1", Duration::from_secs(1), Uuid::new_v4());
        book.record_success("tool1", Duration::from_secs(3), Uuid::new_v4());
        book.record_failure("tool2", "timeout", Duration::from_secs(5), Uuid::new_v4());

        let tool1 = book.get("tool1").unwrap();
        assert_eq!(tool1.calls, 2);
        assert_eq!(tool1.failures, 0);
        assert_eq!(tool1.avg_time, Duration::from_secs(2));

        let tool2 = book.get("tool2").unwrap();
        assert_eq!(tool2.failures, 1);
        assert_eq!(tool2.last_error.unwrap().message, "timeout");
    }

    #[test]
    fn test_success_rate() {
        let mut book = MetricsBook::default();

        book.record_success("tool", Duration::from_secs(1), Uuid::new_v4());
        book.record_success("tool", Duration::from_secs(1), Uuid::new_v4());
        book.record_failure("tool", "error", Duration::from_secs(1), Uuid::new_v4());

        let rate = book.get("tool").unwrap().success_rate();
        assert!((rate - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_snapshot_aggregates() {
        let mut book = MetricsBook::default();
        book.touch("idle");
        book.record_success("a", Duration::from_secs(2), Uuid::new_v4());
        book.record_failure("b", "boom", Duration::from_secs(4), Uuid::new_v4());

        let snapshot = book.snapshot(vec!["a".into(), "b".into(), "idle".into()]);

        assert_eq!(snapshot.executions, 2);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.total_execution_time, Duration::from_secs(6));
        assert_eq!(snapshot.average_execution_time, Duration::from_secs(3));
        assert_eq!(snapshot.tool_count, 3);
        assert_eq!(snapshot.success_rate, 0.5);
        assert_eq!(snapshot.last_error.unwrap().message, "boom");
    }

    #[test]
    fn test_clear_preserves_names() {
        let mut book = MetricsBook::default();
        book.record_success("tool", Duration::from_secs(1), Uuid::new_v4());

        book.clear();

        let metrics = book.get("tool").unwrap();
        assert_eq!(metrics.calls, 0);
        assert!(metrics.last_execution.is_none());
    }
}
