//! Suggestion variants produced by the optimizers.
//!
//! Each kind carries only the fields relevant to it. Serialized with an
//! internal `type` tag so the host sees one flat JSON object per suggestion.

use serde::Serialize;

/// Coarse rating used for both impact and implementation effort.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    /// Two unrelated, back-to-back tasks that could overlap.
    Parallelization {
        description: String,
        task_ids: [String; 2],
        time_saved_days: f64,
        impact: Level,
        implementation_effort: Level,
    },
    /// Compress a long task by adding resources.
    FastTracking {
        description: String,
        task_id: String,
        time_saved_days: f64,
        additional_cost: f64,
        impact: Level,
        implementation_effort: Level,
    },
    /// Move one unit of a resource from a task with float to a critical task.
    ResourceReallocation {
        description: String,
        from_task_id: String,
        to_task_id: String,
        resource_id: String,
        time_saved_days: f64,
        impact: Level,
        implementation_effort: Level,
    },
    /// Under-utilized resource: shrink the pool.
    ReduceResource {
        description: String,
        resource_id: String,
        utilization: f64,
        current_quantity: f64,
        recommended_quantity: f64,
        cost_saved: f64,
        impact: Level,
    },
    /// Over-utilized resource: grow the pool.
    IncreaseResource {
        description: String,
        resource_id: String,
        utilization: f64,
        current_quantity: f64,
        recommended_quantity: f64,
        additional_cost: f64,
        impact: Level,
    },
    /// Replace an expensive resource with a cheaper one of the same type.
    ResourceSubstitution {
        description: String,
        from_resource_id: String,
        to_resource_id: String,
        cost_saved: f64,
        impact: Level,
        implementation_effort: Level,
    },
    /// Stagger resource-intensive tasks to lower peak draw.
    ScheduleStaggering {
        description: String,
        task_ids: Vec<String>,
        cost_saved: f64,
        impact: Level,
        implementation_effort: Level,
    },
    /// Qualitative advice to smooth demand curves.
    ResourceLeveling {
        description: String,
        benefits: Vec<String>,
        impact: Level,
        implementation_effort: Level,
    },
    /// Two overlapping tasks drawing on the same resources.
    ResolveConflict {
        description: String,
        task_ids: [String; 2],
        conflicting_resources: Vec<String>,
        suggested_action: String,
        impact: Level,
        implementation_effort: Level,
    },
    /// Resource with almost nothing left available.
    IncreaseCapacity {
        description: String,
        resource_id: String,
        availability_ratio: f64,
        current_available: f64,
        recommended_increase: f64,
        impact: Level,
    },
}

impl Suggestion {
    /// Days saved if the suggestion is applied (0 for non-schedule kinds).
    pub fn time_saved_days(&self) -> f64 {
        match self {
            Self::Parallelization {
                time_saved_days, ..
            }
            | Self::FastTracking {
                time_saved_days, ..
            }
            | Self::ResourceReallocation {
                time_saved_days, ..
            } => *time_saved_days,
            _ => 0.0,
        }
    }

    /// Money saved if the suggestion is applied. Extra spend is not negative savings.
    pub fn cost_saved(&self) -> f64 {
        match self {
            Self::ReduceResource { cost_saved, .. }
            | Self::ResourceSubstitution { cost_saved, .. }
            | Self::ScheduleStaggering { cost_saved, .. } => *cost_saved,
            _ => 0.0,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Parallelization { description, .. }
            | Self::FastTracking { description, .. }
            | Self::ResourceReallocation { description, .. }
            | Self::ReduceResource { description, .. }
            | Self::IncreaseResource { description, .. }
            | Self::ResourceSubstitution { description, .. }
            | Self::ScheduleStaggering { description, .. }
            | Self::ResourceLeveling { description, .. }
            | Self::ResolveConflict { description, .. }
            | Self::IncreaseCapacity { description, .. } => description,
        }
    }
}

/// Sort by a score, highest first, keeping input order among equal scores.
pub(crate) fn sort_descending_by(suggestions: &mut [Suggestion], score: impl Fn(&Suggestion) -> f64) {
    suggestions.sort_by(|a, b| score(b).total_cmp(&score(a)));
}
