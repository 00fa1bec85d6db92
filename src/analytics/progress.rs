use crate::domain::task::{ChecklistKind, Task, TaskCategory};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How many checklist minutes an employee is expected to absorb per day.
/// Onboarding weeks are paperwork-heavy, training is spread thinner; both
/// defaults can be overridden by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaceConfig {
    pub daily_capacity_minutes: u32,
}

impl PaceConfig {
    pub fn for_kind(kind: ChecklistKind) -> Self {
        match kind {
            ChecklistKind::Onboarding => Self {
                daily_capacity_minutes: 90,
            },
            ChecklistKind::Training => Self {
                daily_capacity_minutes: 60,
            },
        }
    }
}

pub type CategoryWeights = HashMap<TaskCategory, f64>;

/// Relative category importance used by the weighted overall percentage.
/// Weights need not sum to 1; the aggregator normalizes by the table total.
pub fn default_weights(kind: ChecklistKind) -> CategoryWeights {
    match kind {
        ChecklistKind::Onboarding => HashMap::from([
            (TaskCategory::Documentation, 0.3),
            (TaskCategory::ItSetup, 0.25),
            (TaskCategory::Compliance, 0.25),
            (TaskCategory::Training, 0.15),
            (TaskCategory::Culture, 0.05),
        ]),
        ChecklistKind::Training => HashMap::from([
            (TaskCategory::ItSystems, 0.2),
            (TaskCategory::Compliance, 0.2),
            (TaskCategory::Orientation, 0.15),
            (TaskCategory::RoleSpecific, 0.2),
            (TaskCategory::SoftSkills, 0.05),
            (TaskCategory::Security, 0.2),
        ]),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: TaskCategory,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub overall_percent: u8,
    pub required_percent: u8,
    pub completed: usize,
    pub total: usize,
    pub required_completed: usize,
    pub required_total: usize,
    pub by_category: Vec<CategoryProgress>,
    pub remaining_required_minutes: u32,
    pub estimated_completion: Option<NaiveDate>,
}

/// Recompute the full summary from scratch. Task lists stay under a hundred
/// entries, so there is no incremental state to maintain.
pub fn compute_progress(
    tasks: &[Task],
    weights: &CategoryWeights,
    pace: &PaceConfig,
    today: NaiveDate,
) -> ProgressSummary {
    let mut totals: HashMap<TaskCategory, (usize, usize)> = HashMap::new();
    for task in tasks {
        let entry = totals.entry(task.category).or_insert((0, 0));
        entry.1 += 1;
        if task.is_completed() {
            entry.0 += 1;
        }
    }

    let ratio = |completed: usize, total: usize| -> f64 {
        if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64
        }
    };

    // Weighted overall: categories missing from the task set contribute
    // zero to the numerator but stay in the denominator via the table sum.
    let weight_sum: f64 = weights.values().sum();
    let weighted: f64 = weights
        .iter()
        .map(|(cat, w)| {
            let (completed, total) = totals.get(cat).copied().unwrap_or((0, 0));
            ratio(completed, total) * w
        })
        .sum();
    let overall_percent = if weight_sum > 0.0 {
        (weighted / weight_sum * 100.0).round() as u8
    } else {
        0
    };

    let required_total = tasks.iter().filter(|t| t.is_required()).count();
    let required_completed = tasks
        .iter()
        .filter(|t| t.is_required() && t.is_completed())
        .count();
    let required_percent = (ratio(required_completed, required_total) * 100.0).round() as u8;

    let remaining_required_minutes: u32 = tasks
        .iter()
        .filter(|t| t.is_required() && !t.is_completed())
        .map(|t| t.estimated_minutes)
        .sum();

    let estimated_completion = if remaining_required_minutes == 0 {
        None
    } else {
        let days = remaining_required_minutes.div_ceil(pace.daily_capacity_minutes.max(1));
        Some(today + Duration::days(days as i64))
    };

    let by_category = TaskCategory::ALL
        .iter()
        .filter_map(|cat| {
            totals.get(cat).map(|&(completed, total)| CategoryProgress {
                category: *cat,
                completed,
                total,
                percent: (ratio(completed, total) * 100.0).round() as u8,
            })
        })
        .collect();

    ProgressSummary {
        overall_percent,
        required_percent,
        completed: tasks.iter().filter(|t| t.is_completed()).count(),
        total: tasks.len(),
        required_completed,
        required_total,
        by_category,
        remaining_required_minutes,
        estimated_completion,
    }
}
