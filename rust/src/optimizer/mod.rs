//! Optimization facade.
//!
//! One call optimizes for exactly one objective. The snapshot is fully
//! validated (graph built, cycles rejected) before any optimizer runs, so a
//! caller either gets a complete result or an error.

mod cost;
mod resource;
mod suggestion;
mod time;

pub use cost::{optimize_for_cost, CostOptimization};
pub use resource::{optimize_for_resources, Recommendation, ResourceBreakdown, ResourceOptimization};
pub use suggestion::{Level, Suggestion};
pub use time::{optimize_for_time, TimeOptimization};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::critical_path::{calculate_critical_path, CriticalTask};
use crate::error::OptimizerError;
use crate::{log_decisions, log_summary};
use crate::models::ProjectSnapshot;
use crate::snapshot::PreparedSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    Time,
    Cost,
    Resource,
}

impl OptimizationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Cost => "cost",
            Self::Resource => "resource",
        }
    }
}

impl FromStr for OptimizationType {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "cost" => Ok(Self::Cost),
            "resource" | "resources" => Ok(Self::Resource),
            _ => Err(OptimizerError::UnsupportedOptimizationType(s.to_string())),
        }
    }
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload; serialized without a wrapper since
/// `optimization_type` already names it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptimizationPayload {
    Time(TimeOptimization),
    Cost(CostOptimization),
    Resource(ResourceOptimization),
}

impl OptimizationPayload {
    pub fn optimizations(&self) -> &[Suggestion] {
        match self {
            Self::Time(r) => &r.optimizations,
            Self::Cost(r) => &r.optimizations,
            Self::Resource(r) => &r.optimizations,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub optimization_type: OptimizationType,
    pub project_id: String,
    pub generated_at: DateTime<Utc>,
    pub results: OptimizationPayload,
}

impl OptimizationResult {
    pub fn to_json(&self) -> Result<String, OptimizerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Run the optimizer named by `snapshot.optimization_type`.
pub fn optimize(
    snapshot: &ProjectSnapshot,
    config: &OptimizerConfig,
) -> Result<OptimizationResult, OptimizerError> {
    optimize_at(snapshot, config, Utc::now())
}

/// Same as [`optimize`] with a caller-supplied generation timestamp.
pub fn optimize_at(
    snapshot: &ProjectSnapshot,
    config: &OptimizerConfig,
    generated_at: DateTime<Utc>,
) -> Result<OptimizationResult, OptimizerError> {
    let optimization_type: OptimizationType = snapshot.optimization_type.parse()?;
    if snapshot.tasks.is_empty() {
        return Err(OptimizerError::NoTasks);
    }

    let config = config.with_overrides(&snapshot.parameters)?;
    let prepared = PreparedSnapshot::prepare(snapshot, config.verbosity)?;

    let results = match optimization_type {
        OptimizationType::Time => {
            let cpm = calculate_critical_path(&prepared.graph, config.verbosity);
            let result = optimize_for_time(&prepared, &cpm, &config)?;
            log_summary!(
                config.verbosity,
                "time: {} suggestion(s), {:.1} day(s) saved, {} -> {:.1} days",
                result.optimizations.len(),
                result.potential_time_savings_days,
                result.current_duration_days,
                result.optimized_duration_days
            );
            OptimizationPayload::Time(result)
        }
        OptimizationType::Cost => {
            let result = optimize_for_cost(&prepared, &config);
            log_summary!(
                config.verbosity,
                "cost: {} suggestion(s), {:.2} saved of {:.2} ({:.1}%)",
                result.optimizations.len(),
                result.potential_cost_savings,
                result.current_estimated_cost,
                result.savings_percentage
            );
            OptimizationPayload::Cost(result)
        }
        OptimizationType::Resource => {
            let result = optimize_for_resources(&prepared, &config);
            log_summary!(
                config.verbosity,
                "resource: {} suggestion(s), conflicts {} -> {}",
                result.optimizations.len(),
                result.current_conflict_count,
                result.optimized_conflict_count
            );
            OptimizationPayload::Resource(result)
        }
    };
    for suggestion in results.optimizations() {
        log_decisions!(config.verbosity, "suggest: {}", suggestion.description());
    }

    Ok(OptimizationResult {
        optimization_type,
        project_id: prepared.project_id,
        generated_at,
        results,
    })
}

/// Build the graph and return the critical tasks in topological order.
pub fn find_critical_path(
    snapshot: &ProjectSnapshot,
    config: &OptimizerConfig,
) -> Result<Vec<CriticalTask>, OptimizerError> {
    let prepared = PreparedSnapshot::prepare(snapshot, config.verbosity)?;
    let cpm = calculate_critical_path(&prepared.graph, config.verbosity);
    log_summary!(
        config.verbosity,
        "critical path: {} task(s), {} day(s)",
        cpm.critical_tasks.len(),
        cpm.project_duration
    );
    cpm.critical_path(&prepared.graph, prepared.project_start)
}
