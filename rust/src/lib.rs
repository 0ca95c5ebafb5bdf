//! Rust implementation of the sitesched schedule optimization engine.
//!
//! Critical path analysis and time, cost and resource advisories over a
//! construction project snapshot, exposed to Python as `sitesched.rust`.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod config;
pub mod critical_path;
mod error;
pub mod graph;
pub mod interner;
pub mod logging;
mod models;
pub mod optimizer;
pub mod snapshot;

pub use config::OptimizerConfig;
pub use critical_path::{calculate_critical_path, CriticalPathResult, CriticalTask, TaskSlack};
pub use error::OptimizerError;
pub use graph::TaskGraph;
pub use models::{
    Dependency, DependencyType, Project, ProjectSnapshot, Resource, ResourceAssignment,
    ResourceType, Task, TaskPriority, TaskStatus,
};
pub use optimizer::{optimize, optimize_at, OptimizationPayload, OptimizationResult, OptimizationType, Suggestion};
pub use snapshot::PreparedSnapshot;

fn to_py_err(e: OptimizerError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(e.to_string())
}

/// Optimize a snapshot for its requested objective.
///
/// # Arguments
/// * `snapshot` - Tasks, dependencies, resources and assignments to analyse
/// * `config` - Thresholds and caps (defaults when omitted)
///
/// # Returns
/// * The optimization result serialized as JSON
///
/// # Raises
/// * ValueError on an unsupported type, an empty snapshot, a circular
///   dependency or any invalid reference
#[pyfunction]
#[pyo3(signature = (snapshot, config=None))]
fn optimize_schedule(snapshot: ProjectSnapshot, config: Option<OptimizerConfig>) -> PyResult<String> {
    let config = config.unwrap_or_default();
    optimize(&snapshot, &config)
        .and_then(|result| result.to_json())
        .map_err(to_py_err)
}

/// Same as `optimize_schedule`, taking the snapshot as a JSON document.
#[pyfunction]
#[pyo3(signature = (snapshot_json, config=None))]
fn optimize_schedule_json(snapshot_json: &str, config: Option<OptimizerConfig>) -> PyResult<String> {
    let config = config.unwrap_or_default();
    serde_json::from_str::<ProjectSnapshot>(snapshot_json)
        .map_err(OptimizerError::from)
        .and_then(|snapshot| optimize(&snapshot, &config))
        .and_then(|result| result.to_json())
        .map_err(to_py_err)
}

/// Critical tasks of a snapshot, in dependency order.
#[pyfunction]
#[pyo3(name = "find_critical_path", signature = (snapshot, config=None))]
fn py_find_critical_path(
    snapshot: ProjectSnapshot,
    config: Option<OptimizerConfig>,
) -> PyResult<Vec<CriticalTask>> {
    let config = config.unwrap_or_default();
    optimizer::find_critical_path(&snapshot, &config).map_err(to_py_err)
}

/// The sitesched.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Snapshot types
    m.add_class::<Project>()?;
    m.add_class::<Task>()?;
    m.add_class::<Dependency>()?;
    m.add_class::<Resource>()?;
    m.add_class::<ResourceAssignment>()?;
    m.add_class::<ProjectSnapshot>()?;

    // Config and result types
    m.add_class::<OptimizerConfig>()?;
    m.add_class::<CriticalTask>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(optimize_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(optimize_schedule_json, m)?)?;
    m.add_function(wrap_pyfunction!(py_find_critical_path, m)?)?;

    Ok(())
}
