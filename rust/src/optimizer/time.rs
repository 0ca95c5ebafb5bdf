//! Time optimizer: shorten the project by overlapping, compressing and
//! re-staffing work around the critical path.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::OptimizerConfig;
use crate::critical_path::{CriticalPathResult, CriticalTask, TaskSlack};
use crate::error::OptimizerError;
use crate::graph::TaskIdx;
use crate::log_decisions;
use crate::snapshot::{PreparedSnapshot, ResourceIdx};

use super::suggestion::{sort_descending_by, Level, Suggestion};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeOptimization {
    pub critical_path: Vec<CriticalTask>,
    pub slack: Vec<TaskSlack>,
    pub optimizations: Vec<Suggestion>,
    pub potential_time_savings_days: f64,
    /// Makespan from the critical path calculation.
    pub current_duration_days: i64,
    /// Calendar span between the project's planned start and end dates.
    pub planned_duration_days: i64,
    pub optimized_duration_days: f64,
}

pub fn optimize_for_time(
    prepared: &PreparedSnapshot,
    cpm: &CriticalPathResult,
    config: &OptimizerConfig,
) -> Result<TimeOptimization, OptimizerError> {
    let mut optimizations = find_parallelization_opportunities(prepared, config);
    optimizations.extend(find_compression_opportunities(prepared, config));
    optimizations.extend(find_critical_reallocations(prepared, cpm, config));

    let potential_time_savings_days: f64 =
        optimizations.iter().map(Suggestion::time_saved_days).sum();
    let current_duration_days = cpm.project_duration;

    Ok(TimeOptimization {
        critical_path: cpm.critical_path(&prepared.graph, prepared.project_start)?,
        slack: cpm.slack_report(&prepared.graph),
        optimizations,
        potential_time_savings_days,
        current_duration_days,
        planned_duration_days: (prepared.project_end - prepared.project_start).num_days(),
        optimized_duration_days: (current_duration_days as f64 - potential_time_savings_days)
            .max(1.0),
    })
}

/// Unrelated task pairs whose planned windows sit back to back.
fn find_parallelization_opportunities(
    prepared: &PreparedSnapshot,
    config: &OptimizerConfig,
) -> Vec<Suggestion> {
    let graph = &prepared.graph;
    let ancestors = graph.ancestor_sets();
    let gap = config.adjacency_gap_days;
    let mut opportunities = Vec::new();

    for i in 0..graph.len() as TaskIdx {
        for j in (i + 1)..graph.len() as TaskIdx {
            if ancestors[i as usize].contains(&j) || ancestors[j as usize].contains(&i) {
                continue;
            }
            let (a, b) = (graph.node(i), graph.node(j));
            let adjacent = (a.start_date - b.end_date).num_days().abs() <= gap
                || (b.start_date - a.end_date).num_days().abs() <= gap;
            if !adjacent {
                continue;
            }
            let time_saved = a.duration_days.min(b.duration_days) as f64;
            if time_saved <= 0.0 {
                continue;
            }
            opportunities.push(Suggestion::Parallelization {
                description: format!("Run tasks \"{}\" and \"{}\" in parallel", a.name, b.name),
                task_ids: [a.id.clone(), b.id.clone()],
                time_saved_days: time_saved,
                impact: Level::Medium,
                implementation_effort: Level::Low,
            });
        }
    }

    sort_descending_by(&mut opportunities, Suggestion::time_saved_days);
    opportunities.truncate(config.max_parallelizations);
    log_decisions!(
        config.verbosity,
        "time: {} parallelization suggestion(s)",
        opportunities.len()
    );
    opportunities
}

/// Fast-tracking candidates: long tasks that can absorb extra crews.
fn find_compression_opportunities(
    prepared: &PreparedSnapshot,
    config: &OptimizerConfig,
) -> Vec<Suggestion> {
    let mut opportunities: Vec<Suggestion> = prepared
        .graph
        .nodes()
        .iter()
        .filter(|task| {
            !task.is_closed() && task.duration_days > config.compression_min_duration_days
        })
        .map(|task| {
            let duration = task.duration_days as f64;
            let compression = (duration * config.compression_ratio).min(config.compression_max_days);
            Suggestion::FastTracking {
                description: format!("Compress task \"{}\" by adding resources", task.name),
                task_id: task.id.clone(),
                time_saved_days: compression,
                additional_cost: duration
                    * config.compression_cost_per_day
                    * config.crew_size_factor,
                impact: if compression >= config.compression_max_days {
                    Level::High
                } else {
                    Level::Medium
                },
                implementation_effort: Level::Medium,
            }
        })
        .collect();

    sort_descending_by(&mut opportunities, Suggestion::time_saved_days);
    opportunities.truncate(config.max_compressions);
    log_decisions!(
        config.verbosity,
        "time: {} fast-tracking suggestion(s)",
        opportunities.len()
    );
    opportunities
}

/// For each open critical task, borrow a same-type resource from an open task with float.
fn find_critical_reallocations(
    prepared: &PreparedSnapshot,
    cpm: &CriticalPathResult,
    config: &OptimizerConfig,
) -> Vec<Suggestion> {
    let graph = &prepared.graph;
    let donors: Vec<TaskIdx> = (0..graph.len() as TaskIdx)
        .filter(|&task| !cpm.is_critical(task) && !graph.node(task).is_closed())
        .collect();

    let mut seen: FxHashSet<(TaskIdx, TaskIdx, ResourceIdx)> = FxHashSet::default();
    let mut optimizations = Vec::new();

    'critical: for &critical in &cpm.critical_tasks {
        if graph.node(critical).is_closed() {
            continue;
        }
        for needed in prepared.assignments_of_task(critical) {
            if optimizations.len() >= config.max_reallocations {
                break 'critical;
            }
            let kind = prepared.resource(needed.resource).kind;
            let donor = donors.iter().find_map(|&task| {
                prepared
                    .assignments_of_task(task)
                    .find(|a| prepared.resource(a.resource).kind == kind)
                    .map(|a| (task, a.resource))
            });
            let Some((from_task, resource)) = donor else {
                log_decisions!(
                    config.verbosity,
                    "time: no donor for {:?} resource on critical task {}",
                    kind,
                    graph.node(critical).id
                );
                continue;
            };
            if !seen.insert((from_task, critical, resource)) {
                continue;
            }

            let to = graph.node(critical);
            optimizations.push(Suggestion::ResourceReallocation {
                description: format!("Reallocate resources to critical task \"{}\"", to.name),
                from_task_id: graph.node(from_task).id.clone(),
                to_task_id: to.id.clone(),
                resource_id: prepared.resource(resource).id.clone(),
                time_saved_days: config.reallocation_days_saved,
                impact: Level::High,
                implementation_effort: Level::Medium,
            });
        }
    }

    optimizations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path::calculate_critical_path;
    use crate::graph::tests::{make_dep, make_task};
    use crate::models::{ProjectSnapshot, Task};
    use crate::snapshot::tests::{make_assignment, make_resource, make_snapshot};
    use chrono::{Duration, NaiveDate};

    fn task_at(id: &str, duration: i64, start_offset: i64) -> Task {
        let mut task = make_task(id, duration);
        task.start_date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap() + Duration::days(start_offset);
        task.end_date = task.start_date + Duration::days(duration);
        task
    }

    fn run(snapshot: &ProjectSnapshot) -> TimeOptimization {
        let config = OptimizerConfig::default();
        let prepared = PreparedSnapshot::prepare(snapshot, 0).unwrap();
        let cpm = calculate_critical_path(&prepared.graph, 0);
        optimize_for_time(&prepared, &cpm, &config).unwrap()
    }

    fn of_kind<'a>(result: &'a TimeOptimization, kind: &str) -> Vec<&'a Suggestion> {
        result
            .optimizations
            .iter()
            .filter(|s| serde_json::to_value(s).unwrap()["type"] == kind)
            .collect()
    }

    #[test]
    fn test_parallelization_for_unrelated_back_to_back_tasks() {
        let mut snapshot = make_snapshot("time");
        // b is planned right after a but does not depend on it
        snapshot.tasks = vec![task_at("a", 3, 0), task_at("b", 2, 3)];
        let result = run(&snapshot);

        let found = of_kind(&result, "parallelization");
        assert_eq!(found.len(), 1);
        match found[0] {
            Suggestion::Parallelization {
                task_ids,
                time_saved_days,
                ..
            } => {
                assert_eq!(task_ids, &["a".to_string(), "b".to_string()]);
                assert_eq!(*time_saved_days, 2.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_no_parallelization_for_transitively_related_tasks() {
        let mut snapshot = make_snapshot("time");
        // c is planned right after a and depends on it only through b
        snapshot.tasks = vec![task_at("a", 2, 0), task_at("b", 2, 2), task_at("c", 2, 2)];
        snapshot.dependencies = vec![make_dep("b", "a", "FS", 0), make_dep("c", "b", "FS", 0)];
        let result = run(&snapshot);

        assert!(of_kind(&result, "parallelization").is_empty());
    }

    #[test]
    fn test_parallelization_capped_and_sorted() {
        let mut snapshot = make_snapshot("time");
        // Eight unrelated tasks starting on day 0; t0 ends next to every other start
        snapshot.tasks = (0..8).map(|i| task_at(&format!("t{}", i), 1 + i, 0)).collect();
        let result = run(&snapshot);

        let found = of_kind(&result, "parallelization");
        assert_eq!(found.len(), 5);
        let savings: Vec<f64> = found.iter().map(|s| s.time_saved_days()).collect();
        assert!(savings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_compression_top_three() {
        let mut snapshot = make_snapshot("time");
        snapshot.tasks = vec![
            task_at("short", 3, 0),
            task_at("five", 5, 40),
            task_at("twenty", 20, 80),
            task_at("eight", 8, 120),
            task_at("four", 4, 160),
        ];
        let result = run(&snapshot);

        let found = of_kind(&result, "fast_tracking");
        assert_eq!(found.len(), 3);
        let ids: Vec<&str> = found
            .iter()
            .map(|s| match s {
                Suggestion::FastTracking { task_id, .. } => task_id.as_str(),
                _ => unreachable!(),
            })
            .collect();
        // twenty is capped at 2 days, eight saves 1.6, five saves 1
        assert_eq!(ids, vec!["twenty", "eight", "five"]);

        match found[0] {
            Suggestion::FastTracking {
                time_saved_days,
                additional_cost,
                impact,
                ..
            } => {
                assert_eq!(*time_saved_days, 2.0);
                assert_eq!(*additional_cost, 2000.0);
                assert_eq!(*impact, Level::High);
            }
            _ => unreachable!(),
        }
        match found[2] {
            Suggestion::FastTracking { impact, .. } => assert_eq!(*impact, Level::Medium),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_reallocation_borrows_same_type_from_task_with_float() {
        let mut snapshot = make_snapshot("time");
        snapshot.tasks = vec![task_at("long", 10, 0), task_at("side", 2, 50)];
        snapshot.resources = vec![
            make_resource("crew_a", "labor", 50.0, 5.0),
            make_resource("crew_b", "labor", 45.0, 5.0),
            make_resource("mixer", "equipment", 200.0, 1.0),
        ];
        snapshot.assignments = vec![
            make_assignment("long", "crew_a", 2.0),
            make_assignment("side", "mixer", 1.0),
            make_assignment("side", "crew_b", 1.0),
        ];
        let result = run(&snapshot);

        let found = of_kind(&result, "resource_reallocation");
        assert_eq!(found.len(), 1);
        match found[0] {
            Suggestion::ResourceReallocation {
                from_task_id,
                to_task_id,
                resource_id,
                time_saved_days,
                ..
            } => {
                assert_eq!(from_task_id, "side");
                assert_eq!(to_task_id, "long");
                assert_eq!(resource_id, "crew_b");
                assert_eq!(*time_saved_days, 1.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_closed_tasks_not_compressed_or_donors() {
        let mut snapshot = make_snapshot("time");
        snapshot.tasks = vec![
            task_at("long", 10, 0),
            task_at("done", 8, 40),
            task_at("side", 2, 50),
        ];
        snapshot.tasks[1].status = "completed".to_string();
        snapshot.tasks[1].progress = 100.0;
        snapshot.resources = vec![
            make_resource("crew_a", "labor", 50.0, 5.0),
            make_resource("crew_b", "labor", 45.0, 5.0),
            make_resource("crew_c", "labor", 45.0, 5.0),
        ];
        snapshot.assignments = vec![
            make_assignment("long", "crew_a", 2.0),
            make_assignment("done", "crew_b", 1.0),
            make_assignment("side", "crew_c", 1.0),
        ];
        let result = run(&snapshot);

        let compressed: Vec<&str> = of_kind(&result, "fast_tracking")
            .iter()
            .map(|s| match s {
                Suggestion::FastTracking { task_id, .. } => task_id.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(compressed, vec!["long"]);

        match of_kind(&result, "resource_reallocation")[0] {
            Suggestion::ResourceReallocation {
                from_task_id,
                resource_id,
                ..
            } => {
                assert_eq!(from_task_id, "side");
                assert_eq!(resource_id, "crew_c");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_aggregates_and_floor_of_one_day() {
        let mut snapshot = make_snapshot("time");
        snapshot.tasks = vec![task_at("A", 5, 0), task_at("B", 3, 5), task_at("C", 2, 8)];
        snapshot.dependencies = vec![make_dep("B", "A", "FS", 0), make_dep("C", "B", "FS", 0)];
        let result = run(&snapshot);

        assert_eq!(result.current_duration_days, 10);
        let ids: Vec<&str> = result.critical_path.iter().map(|c| c.task_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        // Only A qualifies for compression: min(5 * 0.2, 2) = 1 day
        assert!((result.potential_time_savings_days - 1.0).abs() < 1e-9);
        assert!((result.optimized_duration_days - 9.0).abs() < 1e-9);
        assert_eq!(result.planned_duration_days, 88);

        let mut tiny = make_snapshot("time");
        tiny.tasks = vec![task_at("x", 1, 0), task_at("y", 1, 1)];
        let result = run(&tiny);
        // 1-day task, 1 day saved by parallelization: floored at 1
        assert_eq!(result.optimized_duration_days, 1.0);
    }

    #[test]
    fn test_deterministic_suggestions() {
        let mut snapshot = make_snapshot("time");
        snapshot.tasks = (0..6).map(|i| task_at(&format!("t{}", i), 4 + i, i * 2)).collect();
        snapshot.dependencies = vec![make_dep("t3", "t0", "FS", 0)];
        assert_eq!(run(&snapshot), run(&snapshot));
    }
}
