//! Critical path calculation using forward and backward passes.

use chrono::{Days, NaiveDate};

use crate::error::OptimizerError;
use crate::graph::{Link, TaskGraph, TaskIdx};
use crate::log_trace;
use crate::models::DependencyType;

use super::types::{CriticalPathResult, CriticalTask, TaskSlack, TaskTiming};

/// Lower bound a predecessor places on its successor's earliest start.
fn earliest_start_bound(pred: &TaskTiming, link: &Link, successor_duration: i64) -> i64 {
    match link.relation {
        DependencyType::FinishToStart => pred.earliest_finish + link.lag_days,
        DependencyType::StartToStart => pred.earliest_start + link.lag_days,
        DependencyType::FinishToFinish => {
            pred.earliest_finish + link.lag_days - successor_duration
        }
        DependencyType::StartToFinish => pred.earliest_start + link.lag_days - successor_duration,
    }
}

/// Upper bound a successor places on its predecessor's latest finish.
fn latest_finish_bound(succ: &TaskTiming, link: &Link, predecessor_duration: i64) -> i64 {
    match link.relation {
        DependencyType::FinishToStart => succ.latest_start - link.lag_days,
        DependencyType::StartToStart => succ.latest_start - link.lag_days + predecessor_duration,
        DependencyType::FinishToFinish => succ.latest_finish - link.lag_days,
        DependencyType::StartToFinish => {
            succ.latest_finish - link.lag_days + predecessor_duration
        }
    }
}

/// Run the Critical Path Method over the whole graph.
///
/// The graph is acyclic and its durations are validated, so this cannot fail.
/// Earliest starts are floored at day 0 (the project start) and latest
/// finishes are capped at the makespan, which keeps every float >= 0.
pub fn calculate_critical_path(graph: &TaskGraph, verbosity: u8) -> CriticalPathResult {
    let n = graph.len();
    let mut timings = vec![TaskTiming::default(); n];

    // Forward pass
    for &task in graph.topological_order() {
        let duration = graph.node(task).duration_days;
        let earliest_start = graph
            .predecessors(task)
            .iter()
            .map(|link| earliest_start_bound(&timings[link.task as usize], link, duration))
            .max()
            .unwrap_or(0)
            .max(0);

        let timing = &mut timings[task as usize];
        timing.earliest_start = earliest_start;
        timing.earliest_finish = earliest_start + duration;
    }

    let project_duration = timings.iter().map(|t| t.earliest_finish).max().unwrap_or(0);

    // Backward pass
    for &task in graph.topological_order().iter().rev() {
        let duration = graph.node(task).duration_days;
        let latest_finish = graph
            .successors(task)
            .iter()
            .map(|link| latest_finish_bound(&timings[link.task as usize], link, duration))
            .fold(project_duration, i64::min);

        let timing = &mut timings[task as usize];
        timing.latest_finish = latest_finish;
        timing.latest_start = latest_finish - duration;
        timing.total_float = timing.latest_start - timing.earliest_start;

        log_trace!(
            verbosity,
            "cpm {}: ES={} EF={} LS={} LF={} float={}",
            graph.node(task).id,
            timing.earliest_start,
            timing.earliest_finish,
            timing.latest_start,
            timing.latest_finish,
            timing.total_float
        );
    }

    let critical_tasks: Vec<TaskIdx> = graph
        .topological_order()
        .iter()
        .copied()
        .filter(|&task| timings[task as usize].is_critical())
        .collect();

    CriticalPathResult {
        timings,
        critical_tasks,
        project_duration,
    }
}

impl CriticalPathResult {
    /// Critical tasks with calendar dates anchored at `project_start`.
    ///
    /// # Errors
    /// * `ScheduleOutOfRange` if a date falls outside the calendar chrono supports
    pub fn critical_path(
        &self,
        graph: &TaskGraph,
        project_start: NaiveDate,
    ) -> Result<Vec<CriticalTask>, OptimizerError> {
        self.critical_tasks
            .iter()
            .map(|&task| {
                let node = graph.node(task);
                let timing = self.timing(task);
                let offset = |days: i64| {
                    u64::try_from(days)
                        .ok()
                        .and_then(|days| project_start.checked_add_days(Days::new(days)))
                        .ok_or_else(|| OptimizerError::ScheduleOutOfRange {
                            task_id: node.id.clone(),
                        })
                };
                Ok(CriticalTask {
                    task_id: node.id.clone(),
                    task_name: node.name.clone(),
                    duration: node.duration_days,
                    start_date: offset(timing.earliest_start)?,
                    end_date: offset(timing.earliest_finish)?,
                })
            })
            .collect()
    }

    /// Float of every task, in topological order.
    pub fn slack_report(&self, graph: &TaskGraph) -> Vec<TaskSlack> {
        graph
            .topological_order()
            .iter()
            .map(|&task| {
                let timing = self.timing(task);
                TaskSlack {
                    task_id: graph.node(task).id.clone(),
                    earliest_start: timing.earliest_start,
                    earliest_finish: timing.earliest_finish,
                    latest_start: timing.latest_start,
                    latest_finish: timing.latest_finish,
                    total_float: timing.total_float,
                }
            })
            .collect()
    }
}
