//! Types for critical path results.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::Serialize;

use crate::graph::TaskIdx;

/// Per-task timing from the forward and backward passes, in days from project start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest possible start (forward pass).
    pub earliest_start: i64,
    /// Earliest possible finish (forward pass).
    pub earliest_finish: i64,
    /// Latest allowable start (backward pass).
    pub latest_start: i64,
    /// Latest allowable finish (backward pass).
    pub latest_finish: i64,
    /// Total float = latest_start - earliest_start.
    pub total_float: i64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.total_float == 0
    }
}

/// A task on the critical path, as reported to the host.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriticalTask {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub task_name: String,
    #[pyo3(get)]
    pub duration: i64,
    /// Project start + earliest start.
    #[pyo3(get)]
    pub start_date: NaiveDate,
    /// Project start + earliest finish.
    #[pyo3(get)]
    pub end_date: NaiveDate,
}

#[pymethods]
impl CriticalTask {
    fn __repr__(&self) -> String {
        format!(
            "CriticalTask(task_id={:?}, duration={}, start={}, end={})",
            self.task_id, self.duration, self.start_date, self.end_date
        )
    }
}

/// Slack of one task, for the schedule float listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskSlack {
    pub task_id: String,
    pub earliest_start: i64,
    pub earliest_finish: i64,
    pub latest_start: i64,
    pub latest_finish: i64,
    pub total_float: i64,
}

/// Result of a critical path calculation over a whole graph.
#[derive(Clone, Debug)]
pub struct CriticalPathResult {
    /// Timings indexed by task index.
    pub timings: Vec<TaskTiming>,
    /// Zero-float tasks in topological order.
    pub critical_tasks: Vec<TaskIdx>,
    /// Makespan: the maximum earliest finish over all tasks.
    pub project_duration: i64,
}

impl CriticalPathResult {
    #[inline]
    pub fn timing(&self, task: TaskIdx) -> &TaskTiming {
        &self.timings[task as usize]
    }

    #[inline]
    pub fn is_critical(&self, task: TaskIdx) -> bool {
        self.timings[task as usize].is_critical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_timing_critical() {
        let timing = TaskTiming {
            earliest_start: 0,
            earliest_finish: 5,
            latest_start: 0,
            latest_finish: 5,
            total_float: 0,
        };
        assert!(timing.is_critical());

        let timing_with_slack = TaskTiming {
            earliest_start: 0,
            earliest_finish: 5,
            latest_start: 2,
            latest_finish: 7,
            total_float: 2,
        };
        assert!(!timing_with_slack.is_critical());
    }
}
