//! Task dependency graph: the single construction point for graph state.
//!
//! Tasks are validated and interned into a dense arena; dependencies become
//! predecessor/successor adjacency lists indexed by task index. Construction
//! fails on missing references, invalid fields and cycles, so every
//! `TaskGraph` in existence is acyclic and carries a topological order.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::error::OptimizerError;
use crate::interner::{IdIndex, IdInterner};
use crate::log_trace;
use crate::models::{Dependency, DependencyType, Task, TaskPriority, TaskStatus};

/// Index of a task in the graph arena.
pub type TaskIdx = IdIndex;

/// Longest task duration and largest absolute lag accepted, in days (100 years).
pub const MAX_SPAN_DAYS: i64 = 36_500;

/// A validated task.
#[derive(Clone, Debug)]
pub struct TaskNode {
    pub id: String,
    pub name: String,
    pub duration_days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: TaskStatus,
}

impl TaskNode {
    /// Completed and cancelled tasks no longer consume schedule or resources.
    pub fn is_closed(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// One end of a dependency, as seen from the task that owns the adjacency list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    /// The task at the other end (predecessor in `predecessors`, successor in `successors`).
    pub task: TaskIdx,
    pub relation: DependencyType,
    pub lag_days: i64,
}

/// Immutable, acyclic dependency graph over a project's tasks.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    index: IdInterner,
    nodes: Vec<TaskNode>,
    predecessors: Vec<Vec<Link>>,
    successors: Vec<Vec<Link>>,
    topo_order: Vec<TaskIdx>,
}

fn validate_task(task: &Task) -> Result<TaskNode, OptimizerError> {
    if !(0..=MAX_SPAN_DAYS).contains(&task.duration_days) {
        return Err(OptimizerError::InvalidDuration {
            task_id: task.id.clone(),
            duration: task.duration_days,
        });
    }
    if task.end_date < task.start_date {
        return Err(OptimizerError::InvalidDateRange {
            entity: "task",
            id: task.id.clone(),
        });
    }
    if !(0.0..=100.0).contains(&task.progress) {
        return Err(invalid_task_value(task, "progress", task.progress.to_string()));
    }
    let status = TaskStatus::parse(&task.status)
        .ok_or_else(|| invalid_task_value(task, "status", task.status.clone()))?;
    TaskPriority::parse(&task.priority)
        .ok_or_else(|| invalid_task_value(task, "priority", task.priority.clone()))?;

    Ok(TaskNode {
        id: task.id.clone(),
        name: task.name.clone(),
        duration_days: task.duration_days,
        start_date: task.start_date,
        end_date: task.end_date,
        status,
    })
}

fn invalid_task_value(task: &Task, field: &'static str, value: String) -> OptimizerError {
    OptimizerError::InvalidValue {
        entity: "task",
        id: task.id.clone(),
        field,
        value,
    }
}

impl TaskGraph {
    /// Validate tasks and dependencies and build the graph.
    ///
    /// # Errors
    /// * `InvalidDuration`, `InvalidDateRange`, `InvalidValue`, `DuplicateId` for bad tasks
    /// * `MissingReference` if a dependency names an unknown task
    /// * `CycleDetected` naming a task that lies on a cycle
    pub fn build(
        tasks: &[Task],
        dependencies: &[Dependency],
        verbosity: u8,
    ) -> Result<Self, OptimizerError> {
        let mut index = IdInterner::with_capacity(tasks.len());
        let mut nodes = Vec::with_capacity(tasks.len());
        for task in tasks {
            let node = validate_task(task)?;
            if index.insert_new(&task.id).is_none() {
                return Err(OptimizerError::DuplicateId {
                    entity: "task",
                    id: task.id.clone(),
                });
            }
            nodes.push(node);
        }

        let n = nodes.len();
        let mut predecessors: Vec<Vec<Link>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<Link>> = vec![Vec::new(); n];

        for dep in dependencies {
            let successor = index
                .get(&dep.task_id)
                .ok_or_else(|| OptimizerError::MissingReference {
                    entity: "task",
                    id: dep.task_id.clone(),
                    referenced_by: format!(
                        "dependency on predecessor {}",
                        dep.predecessor_task_id
                    ),
                })?;
            let predecessor =
                index
                    .get(&dep.predecessor_task_id)
                    .ok_or_else(|| OptimizerError::MissingReference {
                        entity: "task",
                        id: dep.predecessor_task_id.clone(),
                        referenced_by: format!("dependency of task {}", dep.task_id),
                    })?;
            let relation = DependencyType::parse(&dep.dependency_type).ok_or_else(|| {
                OptimizerError::InvalidValue {
                    entity: "dependency",
                    id: format!("{}->{}", dep.predecessor_task_id, dep.task_id),
                    field: "dependency_type",
                    value: dep.dependency_type.clone(),
                }
            })?;
            if !(-MAX_SPAN_DAYS..=MAX_SPAN_DAYS).contains(&dep.lag_days) {
                return Err(OptimizerError::InvalidValue {
                    entity: "dependency",
                    id: format!("{}->{}", dep.predecessor_task_id, dep.task_id),
                    field: "lag_days",
                    value: dep.lag_days.to_string(),
                });
            }

            predecessors[successor as usize].push(Link {
                task: predecessor,
                relation,
                lag_days: dep.lag_days,
            });
            successors[predecessor as usize].push(Link {
                task: successor,
                relation,
                lag_days: dep.lag_days,
            });
        }

        let topo_order = topological_sort(&predecessors, &successors)
            .map_err(|on_cycle| OptimizerError::CycleDetected {
                task_id: index.resolve(on_cycle).unwrap_or_default().to_string(),
            })?;

        log_trace!(
            verbosity,
            "graph: {} tasks, {} dependencies, topological order {:?}",
            n,
            dependencies.len(),
            topo_order
                .iter()
                .map(|&t| nodes[t as usize].id.as_str())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            index,
            nodes,
            predecessors,
            successors,
            topo_order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, task: TaskIdx) -> &TaskNode {
        &self.nodes[task as usize]
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    /// Look up a task index by id.
    #[inline]
    pub fn task_index(&self, id: &str) -> Option<TaskIdx> {
        self.index.get(id)
    }

    #[inline]
    pub fn predecessors(&self, task: TaskIdx) -> &[Link] {
        &self.predecessors[task as usize]
    }

    #[inline]
    pub fn successors(&self, task: TaskIdx) -> &[Link] {
        &self.successors[task as usize]
    }

    /// Task indices such that every predecessor precedes its successors.
    pub fn topological_order(&self) -> &[TaskIdx] {
        &self.topo_order
    }

    /// Transitive predecessors of every task, indexed by task.
    pub fn ancestor_sets(&self) -> Vec<FxHashSet<TaskIdx>> {
        let mut ancestors: Vec<FxHashSet<TaskIdx>> = vec![FxHashSet::default(); self.len()];
        for &task in &self.topo_order {
            let mut set = FxHashSet::default();
            for link in self.predecessors(task) {
                set.insert(link.task);
                set.extend(ancestors[link.task as usize].iter().copied());
            }
            ancestors[task as usize] = set;
        }
        ancestors
    }
}

/// Kahn's algorithm over the adjacency lists.
///
/// Ready tasks are taken in input order so the result is deterministic. On
/// failure returns the index of a task that lies on a cycle.
fn topological_sort(
    predecessors: &[Vec<Link>],
    successors: &[Vec<Link>],
) -> Result<Vec<TaskIdx>, TaskIdx> {
    let n = predecessors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(|p| p.len()).collect();

    let mut queue: VecDeque<TaskIdx> = (0..n as TaskIdx)
        .filter(|&t| in_degree[t as usize] == 0)
        .collect();

    let mut result: Vec<TaskIdx> = Vec::with_capacity(n);

    while let Some(task) = queue.pop_front() {
        result.push(task);
        for link in &successors[task as usize] {
            let degree = &mut in_degree[link.task as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(link.task);
            }
        }
    }

    if result.len() == n {
        return Ok(result);
    }

    // Every unsorted task still has an unsorted predecessor, so walking
    // predecessors from any of them must revisit a task on a cycle.
    let mut visited = vec![false; n];
    let mut current = (0..n).find(|&t| in_degree[t] > 0).unwrap_or(0);
    while !visited[current] {
        visited[current] = true;
        match predecessors[current]
            .iter()
            .find(|link| in_degree[link.task as usize] > 0)
        {
            Some(link) => current = link.task as usize,
            None => break,
        }
    }
    Err(current as TaskIdx)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_task(id: &str, duration: i64) -> Task {
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        Task {
            id: id.to_string(),
            name: format!("Task {}", id),
            duration_days: duration,
            start_date: start,
            end_date: start + chrono::Duration::days(duration.max(0)),
            progress: 0.0,
            status: "not_started".to_string(),
            priority: "medium".to_string(),
        }
    }

    pub(crate) fn make_dep(task: &str, predecessor: &str, kind: &str, lag: i64) -> Dependency {
        Dependency {
            task_id: task.to_string(),
            predecessor_task_id: predecessor.to_string(),
            dependency_type: kind.to_string(),
            lag_days: lag,
        }
    }

    fn ids(graph: &TaskGraph, order: &[TaskIdx]) -> Vec<String> {
        order.iter().map(|&t| graph.node(t).id.clone()).collect()
    }

    #[test]
    fn test_chain_topological_order() {
        // Listed out of order on purpose
        let tasks = vec![make_task("c", 2), make_task("a", 5), make_task("b", 3)];
        let deps = vec![make_dep("b", "a", "FS", 0), make_dep("c", "b", "FS", 0)];
        let graph = TaskGraph::build(&tasks, &deps, 0).unwrap();

        assert_eq!(ids(&graph, graph.topological_order()), vec!["a", "b", "c"]);
        let b = graph.task_index("b").unwrap();
        assert_eq!(graph.predecessors(b).len(), 1);
        assert_eq!(graph.successors(b).len(), 1);
        assert_eq!(
            graph.predecessors(b)[0].relation,
            DependencyType::FinishToStart
        );
    }

    #[test]
    fn test_independent_tasks_keep_input_order() {
        let tasks = vec![make_task("x", 1), make_task("y", 1), make_task("z", 1)];
        let graph = TaskGraph::build(&tasks, &[], 0).unwrap();
        assert_eq!(ids(&graph, graph.topological_order()), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_two_task_cycle() {
        let tasks = vec![make_task("a", 1), make_task("b", 1)];
        let deps = vec![make_dep("a", "b", "FS", 0), make_dep("b", "a", "FS", 0)];
        let err = TaskGraph::build(&tasks, &deps, 0).unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::CycleDetected { ref task_id } if task_id == "a" || task_id == "b"
        ));
    }

    #[test]
    fn test_cycle_reports_task_on_cycle_not_downstream() {
        // d depends on the b<->c cycle but is not part of it
        let tasks = vec![
            make_task("d", 1),
            make_task("a", 1),
            make_task("b", 1),
            make_task("c", 1),
        ];
        let deps = vec![
            make_dep("b", "a", "FS", 0),
            make_dep("c", "b", "FS", 0),
            make_dep("b", "c", "FS", 0),
            make_dep("d", "c", "FS", 0),
        ];
        match TaskGraph::build(&tasks, &deps, 0) {
            Err(OptimizerError::CycleDetected { task_id }) => {
                assert!(task_id == "b" || task_id == "c", "got {}", task_id)
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let tasks = vec![make_task("a", 1)];
        let deps = vec![make_dep("a", "a", "FS", 0)];
        assert_eq!(
            TaskGraph::build(&tasks, &deps, 0).unwrap_err(),
            OptimizerError::CycleDetected {
                task_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_missing_predecessor() {
        let tasks = vec![make_task("a", 1)];
        let deps = vec![make_dep("a", "ghost", "FS", 0)];
        match TaskGraph::build(&tasks, &deps, 0) {
            Err(OptimizerError::MissingReference { entity, id, .. }) => {
                assert_eq!(entity, "task");
                assert_eq!(id, "ghost");
            }
            other => panic!("expected missing reference, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let mut task = make_task("a", 1);
        task.duration_days = -2;
        assert_eq!(
            TaskGraph::build(&[task], &[], 0).unwrap_err(),
            OptimizerError::InvalidDuration {
                task_id: "a".to_string(),
                duration: -2
            }
        );

        let mut task = make_task("a", 1);
        task.status = "finished".to_string();
        assert!(matches!(
            TaskGraph::build(&[task], &[], 0),
            Err(OptimizerError::InvalidValue { field: "status", .. })
        ));

        let mut task = make_task("a", 3);
        task.end_date = task.start_date - chrono::Duration::days(1);
        assert!(matches!(
            TaskGraph::build(&[task], &[], 0),
            Err(OptimizerError::InvalidDateRange { .. })
        ));

        let tasks = vec![make_task("a", 1), make_task("b", 1)];
        let deps = vec![make_dep("b", "a", "QQ", 0)];
        assert!(matches!(
            TaskGraph::build(&tasks, &deps, 0),
            Err(OptimizerError::InvalidValue {
                field: "dependency_type",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_task_id() {
        let tasks = vec![make_task("a", 1), make_task("a", 2)];
        assert_eq!(
            TaskGraph::build(&tasks, &[], 0).unwrap_err(),
            OptimizerError::DuplicateId {
                entity: "task",
                id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_ancestor_sets_are_transitive() {
        let tasks = vec![
            make_task("a", 1),
            make_task("b", 1),
            make_task("c", 1),
            make_task("d", 1),
        ];
        let deps = vec![make_dep("b", "a", "FS", 0), make_dep("c", "b", "SS", 2)];
        let graph = TaskGraph::build(&tasks, &deps, 0).unwrap();
        let ancestors = graph.ancestor_sets();

        let a = graph.task_index("a").unwrap();
        let c = graph.task_index("c").unwrap();
        let d = graph.task_index("d").unwrap();
        assert!(ancestors[c as usize].contains(&a));
        assert!(ancestors[a as usize].is_empty());
        assert!(ancestors[d as usize].is_empty());
    }

    #[test]
    fn test_oversized_duration_and_lag_rejected() {
        let mut task = make_task("a", 1);
        task.duration_days = 200_000_000;
        assert_eq!(
            TaskGraph::build(&[task], &[], 0).unwrap_err(),
            OptimizerError::InvalidDuration {
                task_id: "a".to_string(),
                duration: 200_000_000
            }
        );

        let tasks = vec![make_task("a", 1), make_task("b", 1)];
        for lag in [i64::MIN, -(MAX_SPAN_DAYS + 1), MAX_SPAN_DAYS + 1] {
            assert!(matches!(
                TaskGraph::build(&tasks, &[make_dep("b", "a", "FS", lag)], 0),
                Err(OptimizerError::InvalidValue { field: "lag_days", .. })
            ));
        }
        assert!(TaskGraph::build(&tasks, &[make_dep("b", "a", "FS", -MAX_SPAN_DAYS)], 0).is_ok());
    }

    #[test]
    fn test_closed_status() {
        let mut done = make_task("done", 2);
        done.status = "Completed".to_string();
        let mut dropped = make_task("dropped", 2);
        dropped.status = "cancelled".to_string();
        let mut paused = make_task("paused", 2);
        paused.status = "on-hold".to_string();
        let graph = TaskGraph::build(&[done, dropped, paused], &[], 0).unwrap();

        let closed: Vec<bool> = graph.nodes().iter().map(TaskNode::is_closed).collect();
        assert_eq!(closed, vec![true, true, false]);
    }
}
