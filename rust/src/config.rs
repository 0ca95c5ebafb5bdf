//! Heuristic thresholds for the optimizers.
//!
//! The values are advisory cutoffs carried over unchanged from the planning
//! platform; each can be overridden per call from Python or through the
//! snapshot's `parameters` map.

use pyo3::prelude::*;
use std::collections::HashMap;

use crate::error::OptimizerError;
use crate::log_decisions;

pub const UNDER_UTILIZATION_THRESHOLD: f64 = 0.70;
pub const OVER_UTILIZATION_THRESHOLD: f64 = 0.95;
pub const REDUCE_BUFFER: f64 = 1.1;
pub const INCREASE_BUFFER: f64 = 1.2;
pub const SUBSTITUTION_MIN_UNIT_COST: f64 = 100.0;
pub const SUBSTITUTION_PRICE_RATIO: f64 = 0.8;
pub const STAGGERING_FLAT_SAVINGS: f64 = 5000.0;
pub const COMPRESSION_MIN_DURATION_DAYS: i64 = 3;
pub const COMPRESSION_RATIO: f64 = 0.2;
pub const COMPRESSION_MAX_DAYS: f64 = 2.0;
pub const COMPRESSION_COST_PER_DAY: f64 = 100.0;
pub const LOW_AVAILABILITY_RATIO: f64 = 0.10;
pub const CAPACITY_INCREASE_RATIO: f64 = 0.20;

/// Thresholds and caps used by the time, cost and resource optimizers.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerConfig {
    /// Utilization below this suggests shrinking the resource.
    #[pyo3(get, set)]
    pub under_utilization_threshold: f64,
    /// Utilization above this suggests growing the resource.
    #[pyo3(get, set)]
    pub over_utilization_threshold: f64,
    /// Recommended quantity = assigned * buffer when shrinking.
    #[pyo3(get, set)]
    pub reduce_buffer: f64,
    /// Recommended quantity = assigned * buffer when growing.
    #[pyo3(get, set)]
    pub increase_buffer: f64,
    /// Only resources costlier than this are considered for substitution.
    #[pyo3(get, set)]
    pub substitution_min_unit_cost: f64,
    /// An alternative must cost less than this fraction of the original.
    #[pyo3(get, set)]
    pub substitution_price_ratio: f64,
    #[pyo3(get, set)]
    pub max_substitutions: usize,
    /// Distinct resources a task needs to count as resource-intensive.
    #[pyo3(get, set)]
    pub staggering_min_resources: usize,
    /// Resource-intensive tasks needed before staggering is suggested.
    #[pyo3(get, set)]
    pub staggering_min_tasks: usize,
    /// Tasks named in the staggering suggestion.
    #[pyo3(get, set)]
    pub staggering_max_listed_tasks: usize,
    #[pyo3(get, set)]
    pub staggering_flat_savings: f64,
    /// Only tasks longer than this are fast-tracking candidates.
    #[pyo3(get, set)]
    pub compression_min_duration_days: i64,
    #[pyo3(get, set)]
    pub compression_ratio: f64,
    #[pyo3(get, set)]
    pub compression_max_days: f64,
    /// Estimated extra cost per day of task duration when fast-tracking.
    #[pyo3(get, set)]
    pub compression_cost_per_day: f64,
    /// Scales fast-tracking cost estimates for larger or smaller crews.
    #[pyo3(get, set)]
    pub crew_size_factor: f64,
    #[pyo3(get, set)]
    pub max_parallelizations: usize,
    #[pyo3(get, set)]
    pub max_compressions: usize,
    #[pyo3(get, set)]
    pub max_reallocations: usize,
    #[pyo3(get, set)]
    pub reallocation_days_saved: f64,
    /// Largest gap in days between two windows still counted as back-to-back.
    #[pyo3(get, set)]
    pub adjacency_gap_days: i64,
    #[pyo3(get, set)]
    pub max_conflicts: usize,
    /// available / total below this suggests a capacity increase.
    #[pyo3(get, set)]
    pub low_availability_ratio: f64,
    #[pyo3(get, set)]
    pub capacity_increase_ratio: f64,
    /// Verbosity level: 0=silent, 1=summary, 2=decisions, 3=trace.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            under_utilization_threshold: UNDER_UTILIZATION_THRESHOLD,
            over_utilization_threshold: OVER_UTILIZATION_THRESHOLD,
            reduce_buffer: REDUCE_BUFFER,
            increase_buffer: INCREASE_BUFFER,
            substitution_min_unit_cost: SUBSTITUTION_MIN_UNIT_COST,
            substitution_price_ratio: SUBSTITUTION_PRICE_RATIO,
            max_substitutions: 2,
            staggering_min_resources: 3,
            staggering_min_tasks: 2,
            staggering_max_listed_tasks: 3,
            staggering_flat_savings: STAGGERING_FLAT_SAVINGS,
            compression_min_duration_days: COMPRESSION_MIN_DURATION_DAYS,
            compression_ratio: COMPRESSION_RATIO,
            compression_max_days: COMPRESSION_MAX_DAYS,
            compression_cost_per_day: COMPRESSION_COST_PER_DAY,
            crew_size_factor: 1.0,
            max_parallelizations: 5,
            max_compressions: 3,
            max_reallocations: 3,
            reallocation_days_saved: 1.0,
            adjacency_gap_days: 1,
            max_conflicts: 3,
            low_availability_ratio: LOW_AVAILABILITY_RATIO,
            capacity_increase_ratio: CAPACITY_INCREASE_RATIO,
            verbosity: 0,
        }
    }
}

impl OptimizerConfig {
    /// Apply named overrides from a snapshot's `parameters` map.
    ///
    /// Unknown names are ignored (and logged at decisions level). Known names
    /// with a negative or non-finite value are rejected.
    pub fn with_overrides(&self, parameters: &HashMap<String, f64>) -> Result<Self, OptimizerError> {
        let mut config = self.clone();

        // Sorted so rejection and logging order do not depend on hash order
        let mut names: Vec<&String> = parameters.keys().collect();
        names.sort();

        for name in names {
            let value = parameters[name];
            if !value.is_finite() || value < 0.0 {
                return Err(OptimizerError::InvalidValue {
                    entity: "parameter",
                    id: name.clone(),
                    field: "value",
                    value: value.to_string(),
                });
            }
            let count = value.round() as usize;
            match name.as_str() {
                "under_utilization_threshold" => config.under_utilization_threshold = value,
                "over_utilization_threshold" => config.over_utilization_threshold = value,
                "reduce_buffer" => config.reduce_buffer = value,
                "increase_buffer" => config.increase_buffer = value,
                "substitution_min_unit_cost" => config.substitution_min_unit_cost = value,
                "substitution_price_ratio" => config.substitution_price_ratio = value,
                "max_substitutions" => config.max_substitutions = count,
                "staggering_min_resources" => config.staggering_min_resources = count,
                "staggering_min_tasks" => config.staggering_min_tasks = count,
                "staggering_max_listed_tasks" => config.staggering_max_listed_tasks = count,
                "staggering_flat_savings" => config.staggering_flat_savings = value,
                "compression_min_duration_days" => {
                    config.compression_min_duration_days = value.round() as i64
                }
                "compression_ratio" => config.compression_ratio = value,
                "compression_max_days" => config.compression_max_days = value,
                "compression_cost_per_day" => config.compression_cost_per_day = value,
                "crew_size_factor" => config.crew_size_factor = value,
                "max_parallelizations" => config.max_parallelizations = count,
                "max_compressions" => config.max_compressions = count,
                "max_reallocations" => config.max_reallocations = count,
                "reallocation_days_saved" => config.reallocation_days_saved = value,
                "adjacency_gap_days" => config.adjacency_gap_days = value.round() as i64,
                "max_conflicts" => config.max_conflicts = count,
                "low_availability_ratio" => config.low_availability_ratio = value,
                "capacity_increase_ratio" => config.capacity_increase_ratio = value,
                "verbosity" => config.verbosity = count.min(u8::MAX as usize) as u8,
                _ => {
                    log_decisions!(config.verbosity, "ignoring unknown parameter {:?}", name);
                }
            }
        }

        Ok(config)
    }
}

#[pymethods]
impl OptimizerConfig {
    #[new]
    #[pyo3(signature = (
        under_utilization_threshold=UNDER_UTILIZATION_THRESHOLD,
        over_utilization_threshold=OVER_UTILIZATION_THRESHOLD,
        reduce_buffer=REDUCE_BUFFER,
        increase_buffer=INCREASE_BUFFER,
        substitution_min_unit_cost=SUBSTITUTION_MIN_UNIT_COST,
        substitution_price_ratio=SUBSTITUTION_PRICE_RATIO,
        max_substitutions=2,
        staggering_min_resources=3,
        staggering_min_tasks=2,
        staggering_max_listed_tasks=3,
        staggering_flat_savings=STAGGERING_FLAT_SAVINGS,
        compression_min_duration_days=COMPRESSION_MIN_DURATION_DAYS,
        compression_ratio=COMPRESSION_RATIO,
        compression_max_days=COMPRESSION_MAX_DAYS,
        compression_cost_per_day=COMPRESSION_COST_PER_DAY,
        crew_size_factor=1.0,
        max_parallelizations=5,
        max_compressions=3,
        max_reallocations=3,
        reallocation_days_saved=1.0,
        adjacency_gap_days=1,
        max_conflicts=3,
        low_availability_ratio=LOW_AVAILABILITY_RATIO,
        capacity_increase_ratio=CAPACITY_INCREASE_RATIO,
        verbosity=0
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        under_utilization_threshold: f64,
        over_utilization_threshold: f64,
        reduce_buffer: f64,
        increase_buffer: f64,
        substitution_min_unit_cost: f64,
        substitution_price_ratio: f64,
        max_substitutions: usize,
        staggering_min_resources: usize,
        staggering_min_tasks: usize,
        staggering_max_listed_tasks: usize,
        staggering_flat_savings: f64,
        compression_min_duration_days: i64,
        compression_ratio: f64,
        compression_max_days: f64,
        compression_cost_per_day: f64,
        crew_size_factor: f64,
        max_parallelizations: usize,
        max_compressions: usize,
        max_reallocations: usize,
        reallocation_days_saved: f64,
        adjacency_gap_days: i64,
        max_conflicts: usize,
        low_availability_ratio: f64,
        capacity_increase_ratio: f64,
        verbosity: u8,
    ) -> Self {
        Self {
            under_utilization_threshold,
            over_utilization_threshold,
            reduce_buffer,
            increase_buffer,
            substitution_min_unit_cost,
            substitution_price_ratio,
            max_substitutions,
            staggering_min_resources,
            staggering_min_tasks,
            staggering_max_listed_tasks,
            staggering_flat_savings,
            compression_min_duration_days,
            compression_ratio,
            compression_max_days,
            compression_cost_per_day,
            crew_size_factor,
            max_parallelizations,
            max_compressions,
            max_reallocations,
            reallocation_days_saved,
            adjacency_gap_days,
            max_conflicts,
            low_availability_ratio,
            capacity_increase_ratio,
            verbosity,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "OptimizerConfig(under_utilization={}, over_utilization={}, crew_size_factor={}, verbosity={})",
            self.under_utilization_threshold,
            self.over_utilization_threshold,
            self.crew_size_factor,
            self.verbosity
        )
    }
}
