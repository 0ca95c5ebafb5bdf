//! Snapshot boundary: validation of a `ProjectSnapshot` into indexed form.
//!
//! Everything past this point works on `PreparedSnapshot`, whose ids are all
//! known to resolve and whose enumerated fields are parsed.

use chrono::NaiveDate;

use crate::error::OptimizerError;
use crate::graph::{TaskGraph, TaskIdx};
use crate::interner::{IdIndex, IdInterner};
use crate::models::{ProjectSnapshot, Resource, ResourceType};

pub type ResourceIdx = IdIndex;

/// A validated resource.
#[derive(Clone, Debug)]
pub struct ResourceNode {
    pub id: String,
    pub name: String,
    pub kind: ResourceType,
    pub unit_cost: f64,
    pub total_quantity: f64,
    pub available_quantity: f64,
}

/// A validated assignment; both ends are arena indices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssignmentEdge {
    pub task: TaskIdx,
    pub resource: ResourceIdx,
    pub quantity: f64,
}

/// Validated, indexed view of one snapshot.
#[derive(Clone, Debug)]
pub struct PreparedSnapshot {
    pub project_id: String,
    pub project_start: NaiveDate,
    pub project_end: NaiveDate,
    pub graph: TaskGraph,
    pub resources: Vec<ResourceNode>,
    pub assignments: Vec<AssignmentEdge>,
    /// Assignment indices per task, in input order.
    task_assignments: Vec<Vec<usize>>,
    /// Assignment indices per resource, in input order.
    resource_assignments: Vec<Vec<usize>>,
}

fn validate_resource(resource: &Resource) -> Result<ResourceNode, OptimizerError> {
    let invalid = |field: &'static str, value: String| OptimizerError::InvalidValue {
        entity: "resource",
        id: resource.id.clone(),
        field,
        value,
    };

    let kind = ResourceType::parse(&resource.resource_type)
        .ok_or_else(|| invalid("type", resource.resource_type.clone()))?;
    for (field, value) in [
        ("unit_cost", resource.unit_cost),
        ("total_quantity", resource.total_quantity),
        ("available_quantity", resource.available_quantity),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(field, value.to_string()));
        }
    }

    Ok(ResourceNode {
        id: resource.id.clone(),
        name: resource.name.clone(),
        kind,
        unit_cost: resource.unit_cost,
        total_quantity: resource.total_quantity,
        available_quantity: resource.available_quantity,
    })
}

impl PreparedSnapshot {
    /// Validate the snapshot and build the task graph and resource tables.
    pub fn prepare(snapshot: &ProjectSnapshot, verbosity: u8) -> Result<Self, OptimizerError> {
        if snapshot.project.end_date < snapshot.project.start_date {
            return Err(OptimizerError::InvalidDateRange {
                entity: "project",
                id: snapshot.project.id.clone(),
            });
        }
        let graph = TaskGraph::build(&snapshot.tasks, &snapshot.dependencies, verbosity)?;

        let mut resource_index = IdInterner::with_capacity(snapshot.resources.len());
        let mut resources = Vec::with_capacity(snapshot.resources.len());
        for resource in &snapshot.resources {
            let node = validate_resource(resource)?;
            if resource_index.insert_new(&resource.id).is_none() {
                return Err(OptimizerError::DuplicateId {
                    entity: "resource",
                    id: resource.id.clone(),
                });
            }
            resources.push(node);
        }

        let mut assignments = Vec::with_capacity(snapshot.assignments.len());
        let mut task_assignments = vec![Vec::new(); graph.len()];
        let mut resource_assignments = vec![Vec::new(); resources.len()];

        for assignment in &snapshot.assignments {
            let task = graph.task_index(&assignment.task_id).ok_or_else(|| {
                OptimizerError::MissingReference {
                    entity: "task",
                    id: assignment.task_id.clone(),
                    referenced_by: format!("assignment of resource {}", assignment.resource_id),
                }
            })?;
            let resource = resource_index.get(&assignment.resource_id).ok_or_else(|| {
                OptimizerError::MissingReference {
                    entity: "resource",
                    id: assignment.resource_id.clone(),
                    referenced_by: format!("assignment to task {}", assignment.task_id),
                }
            })?;
            if !assignment.quantity.is_finite() || assignment.quantity < 0.0 {
                return Err(OptimizerError::InvalidValue {
                    entity: "assignment",
                    id: format!("{}/{}", assignment.task_id, assignment.resource_id),
                    field: "quantity",
                    value: assignment.quantity.to_string(),
                });
            }

            task_assignments[task as usize].push(assignments.len());
            resource_assignments[resource as usize].push(assignments.len());
            assignments.push(AssignmentEdge {
                task,
                resource,
                quantity: assignment.quantity,
            });
        }

        Ok(Self {
            project_id: snapshot.project.id.clone(),
            project_start: snapshot.project.start_date,
            project_end: snapshot.project.end_date,
            graph,
            resources,
            assignments,
            task_assignments,
            resource_assignments,
        })
    }

    #[inline]
    pub fn resource(&self, resource: ResourceIdx) -> &ResourceNode {
        &self.resources[resource as usize]
    }

    /// Assignments of a task, in input order.
    pub fn assignments_of_task(&self, task: TaskIdx) -> impl Iterator<Item = &AssignmentEdge> {
        self.task_assignments[task as usize]
            .iter()
            .map(move |&i| &self.assignments[i])
    }

    /// Assignments drawing on a resource, in input order.
    pub fn assignments_of_resource(
        &self,
        resource: ResourceIdx,
    ) -> impl Iterator<Item = &AssignmentEdge> {
        self.resource_assignments[resource as usize]
            .iter()
            .map(move |&i| &self.assignments[i])
    }

    /// Distinct resources assigned to a task, sorted by resource index.
    pub fn resource_set_of_task(&self, task: TaskIdx) -> Vec<ResourceIdx> {
        let mut set: Vec<ResourceIdx> = self.assignments_of_task(task).map(|a| a.resource).collect();
        set.sort_unstable();
        set.dedup();
        set
    }
}
