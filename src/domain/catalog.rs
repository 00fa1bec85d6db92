use crate::domain::task::{Task, TaskCategory, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("task {task} depends on unknown task {prerequisite}")]
    UnknownPrerequisite { task: String, prerequisite: String },

    #[error("dependency cycle involving tasks: {0:?}")]
    DependencyCycle(Vec<String>),
}

/// A validated set of checklist task definitions.
///
/// Validation rejects duplicate ids, prerequisites that reference unknown
/// tasks, and dependency cycles. The surrounding portal previously let an
/// unknown prerequisite lock a task forever; that now fails at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCatalog {
    pub tasks: Vec<Task>,
}

impl TaskCatalog {
    pub fn new(tasks: Vec<Task>) -> Result<Self, CatalogError> {
        let catalog = Self { tasks };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let tasks: Vec<Task> = serde_json::from_str(raw)?;
        Self::new(tasks)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// True iff every prerequisite of `id` is in the completed set.
    pub fn is_unlocked(&self, id: &str, completed: &HashSet<String>) -> bool {
        match self.task(id) {
            Some(task) => super::unlock::prereqs_satisfied(&task.depends_on, completed),
            None => false,
        }
    }

    /// Re-check the catalog invariants. `new`/`from_json` already run this,
    /// but `tasks` is public, so consumers taking a catalog re-validate.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(CatalogError::DuplicateTask(task.id.clone()));
            }
        }

        for task in &self.tasks {
            for dep in &task.depends_on {
                if !ids.contains(dep.as_str()) {
                    return Err(CatalogError::UnknownPrerequisite {
                        task: task.id.clone(),
                        prerequisite: dep.clone(),
                    });
                }
            }
        }

        self.check_acyclic()
    }

    /// Kahn-style in-degree pass; any task not drained sits on a cycle.
    fn check_acyclic(&self) -> Result<(), CatalogError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for task in &self.tasks {
            in_degree.entry(task.id.as_str()).or_insert(0);
            for dep in &task.depends_on {
                *in_degree.entry(task.id.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(task.id.as_str());
            }
        }

        let mut queue: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut drained = 0usize;

        while let Some(id) = queue.pop() {
            drained += 1;
            if let Some(next) = dependents.get(id) {
                for &dep_id in next {
                    if let Some(deg) = in_degree.get_mut(dep_id) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            queue.push(dep_id);
                        }
                    }
                }
            }
        }

        if drained != self.tasks.len() {
            let mut stuck: Vec<String> = in_degree
                .iter()
                .filter(|(_, &deg)| deg > 0)
                .map(|(&id, _)| id.to_string())
                .collect();
            stuck.sort();
            return Err(CatalogError::DependencyCycle(stuck));
        }
        Ok(())
    }

    /// The onboarding checklist the portal ships with.
    pub fn onboarding_seed() -> Self {
        Self {
            tasks: vec![
                seed_task("personal_details", "Submit personal details", TaskCategory::Documentation, TaskPriority::Required, 20, &[], None, false, false),
                seed_task("employment_contract", "Sign employment contract", TaskCategory::Documentation, TaskPriority::Required, 45, &["personal_details"], Some(3), false, true),
                seed_task("bank_payroll", "Provide bank account for payroll", TaskCategory::Documentation, TaskPriority::Required, 15, &["personal_details"], Some(5), false, false),
                seed_task("laptop_pickup", "Collect laptop and peripherals", TaskCategory::ItSetup, TaskPriority::Required, 30, &[], Some(1), false, false),
                seed_task("accounts_access", "Activate email and internal accounts", TaskCategory::ItSetup, TaskPriority::Required, 40, &["laptop_pickup"], Some(2), false, false),
                seed_task("vpn_mfa", "Set up VPN and multi-factor auth", TaskCategory::ItSetup, TaskPriority::Required, 20, &["accounts_access"], Some(3), false, false),
                seed_task("code_of_conduct", "Acknowledge code of conduct", TaskCategory::Compliance, TaskPriority::Required, 30, &[], Some(7), false, true),
                seed_task("data_privacy", "Complete data privacy briefing", TaskCategory::Compliance, TaskPriority::Required, 45, &["code_of_conduct"], Some(10), true, false),
                seed_task("hr_systems_intro", "HR systems walkthrough", TaskCategory::Training, TaskPriority::Required, 60, &["accounts_access"], Some(7), false, false),
                seed_task("team_lunch", "Join the team welcome lunch", TaskCategory::Culture, TaskPriority::Optional, 90, &[], None, false, false),
                seed_task("buddy_meet", "Meet your onboarding buddy", TaskCategory::Culture, TaskPriority::Optional, 45, &[], Some(5), false, false),
            ],
        }
    }

    /// The first-month training checklist the portal ships with.
    pub fn training_seed() -> Self {
        Self {
            tasks: vec![
                seed_task("email_calendar", "Email and calendar basics", TaskCategory::ItSystems, TaskPriority::Required, 30, &[], Some(3), false, false),
                seed_task("helpdesk_basics", "Raising IT helpdesk tickets", TaskCategory::ItSystems, TaskPriority::Optional, 20, &["email_calendar"], None, false, false),
                seed_task("anti_bribery", "Anti-bribery and corruption module", TaskCategory::Compliance, TaskPriority::Required, 40, &[], Some(14), true, false),
                seed_task("company_orientation", "Company orientation session", TaskCategory::Orientation, TaskPriority::Required, 60, &[], Some(5), false, false),
                seed_task("role_playbook", "Read the role playbook", TaskCategory::RoleSpecific, TaskPriority::Required, 120, &["company_orientation"], Some(14), false, false),
                seed_task("shadow_session", "Shadow a senior colleague", TaskCategory::RoleSpecific, TaskPriority::Optional, 90, &["role_playbook"], None, false, false),
                seed_task("presentation_skills", "Presentation skills workshop", TaskCategory::SoftSkills, TaskPriority::Optional, 60, &[], None, false, false),
                seed_task("security_awareness", "Security awareness course", TaskCategory::Security, TaskPriority::Required, 45, &[], Some(14), true, false),
                seed_task("phishing_drill", "Pass the phishing drill", TaskCategory::Security, TaskPriority::Required, 20, &["security_awareness"], Some(21), false, false),
            ],
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_task(
    id: &str,
    title: &str,
    category: TaskCategory,
    priority: TaskPriority,
    estimated_minutes: u32,
    depends_on: &[&str],
    due_days_from_start: Option<i64>,
    requires_upload: bool,
    requires_signature: bool,
) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        category,
        priority,
        estimated_minutes,
        status: TaskStatus::Available,
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        due_days_from_start,
        due_date: None,
        requires_upload,
        requires_signature,
        started_at: None,
        completed_at: None,
    }
}
