//! Cost optimizer: right-size resource pools, swap in cheaper equivalents
//! and spread out resource-heavy work.

use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::graph::TaskIdx;
use crate::log_decisions;
use crate::snapshot::{PreparedSnapshot, ResourceIdx};

use super::suggestion::{Level, Suggestion};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostOptimization {
    pub optimizations: Vec<Suggestion>,
    pub potential_cost_savings: f64,
    /// Sum of unit cost x total quantity over all resources.
    pub current_estimated_cost: f64,
    /// Current cost minus savings, floored at 0.
    pub optimized_estimated_cost: f64,
    pub savings_percentage: f64,
}

pub fn optimize_for_cost(prepared: &PreparedSnapshot, config: &OptimizerConfig) -> CostOptimization {
    let mut optimizations = optimize_resource_utilization(prepared, config);
    optimizations.extend(suggest_staggering(prepared, config));
    optimizations.extend(find_resource_substitutions(prepared, config));

    let potential_cost_savings: f64 = optimizations.iter().map(Suggestion::cost_saved).sum();
    let current_estimated_cost: f64 = prepared
        .resources
        .iter()
        .map(|r| r.unit_cost * r.total_quantity)
        .sum();
    let savings_percentage = if current_estimated_cost > 0.0 {
        potential_cost_savings / current_estimated_cost * 100.0
    } else {
        0.0
    };

    CostOptimization {
        optimizations,
        potential_cost_savings,
        current_estimated_cost,
        optimized_estimated_cost: (current_estimated_cost - potential_cost_savings).max(0.0),
        savings_percentage,
    }
}

/// Shrink idle pools and grow saturated ones.
///
/// Resources without assignments or with a zero pool produce nothing.
fn optimize_resource_utilization(
    prepared: &PreparedSnapshot,
    config: &OptimizerConfig,
) -> Vec<Suggestion> {
    let mut optimizations = Vec::new();

    for (idx, resource) in prepared.resources.iter().enumerate() {
        let mut assignments = prepared.assignments_of_resource(idx as ResourceIdx).peekable();
        if assignments.peek().is_none() || resource.total_quantity <= 0.0 {
            continue;
        }
        let assigned: f64 = assignments.map(|a| a.quantity).sum();
        let utilization = assigned / resource.total_quantity;

        if utilization < config.under_utilization_threshold {
            let recommended = assigned * config.reduce_buffer;
            optimizations.push(Suggestion::ReduceResource {
                description: format!(
                    "Reduce \"{}\" allocation (currently {:.1}% utilized)",
                    resource.name,
                    utilization * 100.0
                ),
                resource_id: resource.id.clone(),
                utilization,
                current_quantity: resource.total_quantity,
                recommended_quantity: recommended,
                cost_saved: (resource.total_quantity - recommended) * resource.unit_cost,
                impact: Level::Medium,
            });
        } else if utilization > config.over_utilization_threshold {
            let recommended = assigned * config.increase_buffer;
            optimizations.push(Suggestion::IncreaseResource {
                description: format!(
                    "Increase \"{}\" allocation (currently {:.1}% utilized)",
                    resource.name,
                    utilization * 100.0
                ),
                resource_id: resource.id.clone(),
                utilization,
                current_quantity: resource.total_quantity,
                recommended_quantity: recommended,
                additional_cost: (recommended - resource.total_quantity) * resource.unit_cost,
                impact: Level::High,
            });
        } else {
            log_decisions!(
                config.verbosity,
                "cost: {} utilization {:.2} within band",
                resource.id,
                utilization
            );
        }
    }

    optimizations
}

/// Suggest staggering when several tasks each draw on many distinct resources.
fn suggest_staggering(prepared: &PreparedSnapshot, config: &OptimizerConfig) -> Option<Suggestion> {
    let graph = &prepared.graph;
    let intensive: Vec<TaskIdx> = (0..graph.len() as TaskIdx)
        .filter(|&task| prepared.resource_set_of_task(task).len() >= config.staggering_min_resources)
        .collect();

    if intensive.len() < config.staggering_min_tasks.max(1) {
        return None;
    }

    Some(Suggestion::ScheduleStaggering {
        description: "Stagger resource-intensive tasks to reduce peak resource costs".to_string(),
        task_ids: intensive
            .iter()
            .take(config.staggering_max_listed_tasks)
            .map(|&task| graph.node(task).id.clone())
            .collect(),
        cost_saved: config.staggering_flat_savings,
        impact: Level::Medium,
        implementation_effort: Level::Low,
    })
}

/// Replace expensive resources with the cheapest same-type alternative.
fn find_resource_substitutions(
    prepared: &PreparedSnapshot,
    config: &OptimizerConfig,
) -> Vec<Suggestion> {
    prepared
        .resources
        .iter()
        .filter(|r| r.unit_cost > config.substitution_min_unit_cost)
        .filter_map(|expensive| {
            let ceiling = expensive.unit_cost * config.substitution_price_ratio;
            let cheapest = prepared
                .resources
                .iter()
                .filter(|r| r.kind == expensive.kind && r.unit_cost > 0.0 && r.unit_cost < ceiling)
                .min_by(|a, b| a.unit_cost.total_cmp(&b.unit_cost))?;

            Some(Suggestion::ResourceSubstitution {
                description: format!(
                    "Substitute \"{}\" with cheaper alternative \"{}\"",
                    expensive.name, cheapest.name
                ),
                from_resource_id: expensive.id.clone(),
                to_resource_id: cheapest.id.clone(),
                cost_saved: (expensive.unit_cost - cheapest.unit_cost) * expensive.total_quantity,
                impact: Level::Medium,
                implementation_effort: Level::Low,
            })
        })
        .take(config.max_substitutions)
        .collect()
}
