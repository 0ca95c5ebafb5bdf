//! Error taxonomy for the optimization engine.
//!
//! Every variant is raised before any partial result is assembled.

use thiserror::Error;

/// Errors that can occur while validating a snapshot or optimizing it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    #[error("No tasks found for optimization")]
    NoTasks,
    #[error("Unsupported optimization type: {0}")]
    UnsupportedOptimizationType(String),
    #[error("Circular dependency detected involving task {task_id}")]
    CycleDetected { task_id: String },
    #[error("{referenced_by} references unknown {entity} {id}")]
    MissingReference {
        entity: &'static str,
        id: String,
        referenced_by: String,
    },
    #[error("Task {task_id} has invalid duration {duration}")]
    InvalidDuration { task_id: String, duration: i64 },
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: String },
    #[error("Invalid {field} for {entity} {id}: {value}")]
    InvalidValue {
        entity: &'static str,
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("{entity} {id} ends before it starts")]
    InvalidDateRange { entity: &'static str, id: String },
    #[error("Task {task_id} would be scheduled past the supported calendar range")]
    ScheduleOutOfRange { task_id: String },
    #[error("Malformed snapshot: {0}")]
    InvalidSnapshot(String),
}

impl From<serde_json::Error> for OptimizerError {
    fn from(err: serde_json::Error) -> Self {
        OptimizerError::InvalidSnapshot(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = OptimizerError::CycleDetected {
            task_id: "t7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected involving task t7"
        );

        let err = OptimizerError::MissingReference {
            entity: "task",
            id: "t9".to_string(),
            referenced_by: "dependency of t1".to_string(),
        };
        assert_eq!(err.to_string(), "dependency of t1 references unknown task t9");
    }

    #[test]
    fn test_json_error_maps_to_invalid_snapshot() {
        let err: OptimizerError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, OptimizerError::InvalidSnapshot(_)));
    }
}
