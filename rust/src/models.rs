//! Input records handed over by the host platform.
//!
//! Enumerated fields (status, priority, dependency type, resource type) stay
//! strings here so the host can pass its database values through untouched;
//! they are parsed into the enums below when the snapshot is prepared.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Note: We use std HashMap here for PyO3 interface compatibility

fn default_status() -> String {
    "not_started".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_dependency_type() -> String {
    "FS".to_string()
}

fn default_optimization_type() -> String {
    "time".to_string()
}

/// A schedulable task.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub duration_days: i64,
    #[pyo3(get, set)]
    pub start_date: NaiveDate,
    #[pyo3(get, set)]
    pub end_date: NaiveDate,
    #[pyo3(get, set)]
    #[serde(default)]
    pub progress: f64,
    #[pyo3(get, set)]
    #[serde(default = "default_status")]
    pub status: String,
    #[pyo3(get, set)]
    #[serde(default = "default_priority")]
    pub priority: String,
}

#[pymethods]
impl Task {
    #[new]
    #[pyo3(signature = (
        id,
        name,
        duration_days,
        start_date,
        end_date,
        progress=0.0,
        status=default_status(),
        priority=default_priority()
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: String,
        name: String,
        duration_days: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        progress: f64,
        status: String,
        priority: String,
    ) -> Self {
        Self {
            id,
            name,
            duration_days,
            start_date,
            end_date,
            progress,
            status,
            priority,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={:?}, name={:?}, duration_days={}, status={:?})",
            self.id, self.name, self.duration_days, self.status
        )
    }
}

/// A dependency edge: `task_id` cannot proceed until `predecessor_task_id` allows it.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dependency {
    #[pyo3(get, set)]
    pub task_id: String,
    #[pyo3(get, set)]
    pub predecessor_task_id: String,
    /// One of FS, SS, FF, SF (long snake_case names are accepted too).
    #[pyo3(get, set)]
    #[serde(default = "default_dependency_type")]
    pub dependency_type: String,
    /// Lag in days; negative values model lead time.
    #[pyo3(get, set)]
    #[serde(default)]
    pub lag_days: i64,
}

#[pymethods]
impl Dependency {
    #[new]
    #[pyo3(signature = (task_id, predecessor_task_id, dependency_type=default_dependency_type(), lag_days=0))]
    fn new(
        task_id: String,
        predecessor_task_id: String,
        dependency_type: String,
        lag_days: i64,
    ) -> Self {
        Self {
            task_id,
            predecessor_task_id,
            dependency_type,
            lag_days,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Dependency({:?} -> {:?}, type={}, lag_days={})",
            self.predecessor_task_id, self.task_id, self.dependency_type, self.lag_days
        )
    }
}

/// A labor, equipment or material resource in the project pool.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Resource {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    #[serde(rename = "type")]
    pub resource_type: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub unit_cost: f64,
    #[pyo3(get, set)]
    #[serde(default)]
    pub total_quantity: f64,
    #[pyo3(get, set)]
    #[serde(default)]
    pub available_quantity: f64,
}

#[pymethods]
impl Resource {
    #[new]
    #[pyo3(signature = (id, name, resource_type, unit_cost=0.0, total_quantity=0.0, available_quantity=0.0))]
    fn new(
        id: String,
        name: String,
        resource_type: String,
        unit_cost: f64,
        total_quantity: f64,
        available_quantity: f64,
    ) -> Self {
        Self {
            id,
            name,
            resource_type,
            unit_cost,
            total_quantity,
            available_quantity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Resource(id={:?}, type={}, unit_cost={}, total={}, available={})",
            self.id, self.resource_type, self.unit_cost, self.total_quantity, self.available_quantity
        )
    }
}

/// Quantity of a resource assigned to a task.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceAssignment {
    #[pyo3(get, set)]
    pub task_id: String,
    #[pyo3(get, set)]
    pub resource_id: String,
    #[pyo3(get, set)]
    pub quantity: f64,
}

#[pymethods]
impl ResourceAssignment {
    #[new]
    fn new(task_id: String, resource_id: String, quantity: f64) -> Self {
        Self {
            task_id,
            resource_id,
            quantity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ResourceAssignment(task={:?}, resource={:?}, quantity={})",
            self.task_id, self.resource_id, self.quantity
        )
    }
}

/// Project-level calendar and budget.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub start_date: NaiveDate,
    #[pyo3(get, set)]
    pub end_date: NaiveDate,
    #[pyo3(get, set)]
    #[serde(default)]
    pub budget: Option<f64>,
}

#[pymethods]
impl Project {
    #[new]
    #[pyo3(signature = (id, start_date, end_date, budget=None))]
    fn new(id: String, start_date: NaiveDate, end_date: NaiveDate, budget: Option<f64>) -> Self {
        Self {
            id,
            start_date,
            end_date,
            budget,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Project(id={:?}, start={}, end={})",
            self.id, self.start_date, self.end_date
        )
    }
}

/// Everything the engine needs for one invocation.
#[pyclass]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[pyo3(get, set)]
    pub project: Project,
    #[pyo3(get, set)]
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[pyo3(get, set)]
    #[serde(default)]
    pub assignments: Vec<ResourceAssignment>,
    /// "time", "cost" or "resource".
    #[pyo3(get, set)]
    #[serde(default = "default_optimization_type")]
    pub optimization_type: String,
    /// Named overrides for `OptimizerConfig` fields (e.g. "crew_size_factor").
    #[pyo3(get, set)]
    #[serde(default)]
    pub parameters: HashMap<String, f64>,
}

#[pymethods]
impl ProjectSnapshot {
    #[new]
    #[pyo3(signature = (
        project,
        tasks,
        dependencies=Vec::new(),
        resources=Vec::new(),
        assignments=Vec::new(),
        optimization_type=default_optimization_type(),
        parameters=None
    ))]
    fn new(
        project: Project,
        tasks: Vec<Task>,
        dependencies: Vec<Dependency>,
        resources: Vec<Resource>,
        assignments: Vec<ResourceAssignment>,
        optimization_type: String,
        parameters: Option<HashMap<String, f64>>,
    ) -> Self {
        Self {
            project,
            tasks,
            dependencies,
            resources,
            assignments,
            optimization_type,
            parameters: parameters.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ProjectSnapshot(project={:?}, tasks={}, deps={}, resources={}, type={:?})",
            self.project.id,
            self.tasks.len(),
            self.dependencies.len(),
            self.resources.len(),
            self.optimization_type
        )
    }
}

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    Cancelled,
}

impl TaskStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "on_hold" => Some(Self::OnHold),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Which timing markers of predecessor and successor a dependency couples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl DependencyType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "fs" | "finish_to_start" => Some(Self::FinishToStart),
            "ss" | "start_to_start" => Some(Self::StartToStart),
            "ff" | "finish_to_finish" => Some(Self::FinishToFinish),
            "sf" | "start_to_finish" => Some(Self::StartToFinish),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Labor,
    Equipment,
    Material,
}

impl ResourceType {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize(value).as_str() {
            "labor" | "labour" => Some(Self::Labor),
            "equipment" => Some(Self::Equipment),
            "material" => Some(Self::Material),
            _ => None,
        }
    }
}

/// Lowercase and fold '-' and ' ' into '_' so "In-Progress" and "in progress" match.
fn normalize(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
