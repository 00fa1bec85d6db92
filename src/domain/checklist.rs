use crate::domain::catalog::{CatalogError, TaskCatalog};
use crate::domain::task::{ChecklistKind, Task, TaskStatus};
use crate::domain::unlock::prereqs_satisfied;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChecklistError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("task {0} is locked until its prerequisites are completed")]
    TaskLocked(String),

    #[error("task {0} is already completed")]
    AlreadyCompleted(String),

    #[error("task {0} requires a signature before completion")]
    SignatureRequired(String),

    #[error("task {0} requires an uploaded file before completion")]
    UploadRequired(String),
}

/// Artifacts supplied alongside a completion attempt. The surrounding UI
/// collects them; the state machine only enforces their presence.
#[derive(Debug, Clone, Default)]
pub struct CompletionEvidence {
    pub signature: Option<String>,
    pub file_name: Option<String>,
}

impl CompletionEvidence {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn signed(signature: impl Into<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            file_name: None,
        }
    }

    fn has_signature(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    fn has_file(&self) -> bool {
        self.file_name.as_deref().is_some_and(|f| !f.trim().is_empty())
    }
}

/// Per-task status lifecycle for one employee's checklist.
///
/// locked -> available -> in_progress -> completed; completed is terminal
/// for the session. Every completion re-runs the unlock pass to a fixed
/// point, so multi-hop dependency chains never rely on render-loop ordering.
#[derive(Debug, Clone)]
pub struct Checklist {
    kind: ChecklistKind,
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
    completed: HashSet<String>,
}

impl Checklist {
    /// Build a checklist, validating the catalog. Tasks already carrying
    /// `completed` status (e.g. hydrated from the status backend) seed the
    /// completed set; everything else starts available or locked according
    /// to its prerequisites.
    pub fn new(
        kind: ChecklistKind,
        catalog: TaskCatalog,
        start_date: Option<NaiveDate>,
    ) -> Result<Self, ChecklistError> {
        // `tasks` is a public field, so the catalog may have been assembled
        // without going through `TaskCatalog::new`. An unknown prerequisite
        // slipping through here would lock its task forever.
        catalog.validate()?;
        let mut tasks = catalog.tasks;

        if let Some(start) = start_date {
            for task in &mut tasks {
                task.resolve_due_date(start);
            }
        }

        let completed: HashSet<String> = tasks
            .iter()
            .filter(|t| t.is_completed())
            .map(|t| t.id.clone())
            .collect();

        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        let mut checklist = Self {
            kind,
            tasks,
            index,
            completed,
        };
        checklist.reset_initial_statuses();
        Ok(checklist)
    }

    pub fn kind(&self) -> ChecklistKind {
        self.kind
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn completed_ids(&self) -> &HashSet<String> {
        &self.completed
    }

    /// Mark an available task as started. Optional step for tasks whose
    /// evidence (upload/signature) is gathered before completion.
    pub fn start(&mut self, id: &str) -> Result<(), ChecklistError> {
        let idx = self.lookup(id)?;
        match self.tasks[idx].status {
            TaskStatus::Locked => Err(ChecklistError::TaskLocked(id.to_string())),
            TaskStatus::Completed => Err(ChecklistError::AlreadyCompleted(id.to_string())),
            TaskStatus::InProgress => Ok(()),
            TaskStatus::Available => {
                self.tasks[idx].status = TaskStatus::InProgress;
                self.tasks[idx].started_at = Some(Utc::now());
                Ok(())
            }
        }
    }

    /// Complete a task, enforcing evidence guards, then cascade unlocks.
    /// On rejection no state mutates. Returns the ids newly unlocked by
    /// this completion, in catalog order.
    pub fn complete(
        &mut self,
        id: &str,
        evidence: &CompletionEvidence,
    ) -> Result<Vec<String>, ChecklistError> {
        let idx = self.lookup(id)?;
        let task = &self.tasks[idx];

        match task.status {
            TaskStatus::Locked => return Err(ChecklistError::TaskLocked(id.to_string())),
            TaskStatus::Completed => return Err(ChecklistError::AlreadyCompleted(id.to_string())),
            TaskStatus::Available | TaskStatus::InProgress => {}
        }
        if task.requires_signature && !evidence.has_signature() {
            return Err(ChecklistError::SignatureRequired(id.to_string()));
        }
        if task.requires_upload && !evidence.has_file() {
            return Err(ChecklistError::UploadRequired(id.to_string()));
        }

        let now = Utc::now();
        let task = &mut self.tasks[idx];
        task.status = TaskStatus::Completed;
        task.completed_at = Some(now);
        if task.started_at.is_none() {
            task.started_at = Some(now);
        }
        self.completed.insert(id.to_string());

        let unlocked = self.refresh_unlocks();
        if !unlocked.is_empty() {
            tracing::debug!("completing {} unlocked {:?}", id, unlocked);
        }
        Ok(unlocked)
    }

    /// Promote newly-unlocked tasks until a pass makes no changes. A single
    /// pass would do for the shallow seed catalogs, but deeper chains must
    /// not depend on that.
    fn refresh_unlocks(&mut self) -> Vec<String> {
        let mut unlocked = Vec::new();
        loop {
            let mut changed = false;
            for task in &mut self.tasks {
                if task.status == TaskStatus::Locked
                    && prereqs_satisfied(&task.depends_on, &self.completed)
                {
                    task.status = TaskStatus::Available;
                    unlocked.push(task.id.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        unlocked
    }

    fn reset_initial_statuses(&mut self) {
        for task in &mut self.tasks {
            if task.is_completed() {
                continue;
            }
            task.status = if prereqs_satisfied(&task.depends_on, &self.completed) {
                TaskStatus::Available
            } else {
                TaskStatus::Locked
            };
        }
    }

    fn lookup(&self, id: &str) -> Result<usize, ChecklistError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ChecklistError::UnknownTask(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogError, TaskCatalog};
    use crate::domain::task::{Task, TaskCategory, TaskPriority};

    fn chain_catalog() -> TaskCatalog {
        // A (no deps) -> B (dep: A) -> C (dep: B)
        let task = |id: &str, deps: &[&str]| Task {
            id: id.into(),
            title: id.to_uppercase(),
            description: String::new(),
            category: TaskCategory::Documentation,
            priority: TaskPriority::Required,
            estimated_minutes: 10,
            status: TaskStatus::Available,
            depends_on: deps.iter().map(|s| s.to_string()).collect(),
            due_days_from_start: None,
            due_date: None,
            requires_upload: false,
            requires_signature: false,
            started_at: None,
            completed_at: None,
        };
        TaskCatalog::new(vec![task("a", &[]), task("b", &["a"]), task("c", &["b"])]).unwrap()
    }

    #[test]
    fn test_chain_unlocks_step_by_step() {
        let mut list =
            Checklist::new(ChecklistKind::Onboarding, chain_catalog(), None).unwrap();
        assert_eq!(list.task("a").unwrap().status, TaskStatus::Available);
        assert_eq!(list.task("b").unwrap().status, TaskStatus::Locked);
        assert_eq!(list.task("c").unwrap().status, TaskStatus::Locked);

        let unlocked = list.complete("a", &CompletionEvidence::none()).unwrap();
        assert_eq!(unlocked, vec!["b".to_string()]);
        assert_eq!(list.task("b").unwrap().status, TaskStatus::Available);
        assert_eq!(list.task("c").unwrap().status, TaskStatus::Locked);

        let unlocked = list.complete("b", &CompletionEvidence::none()).unwrap();
        assert_eq!(unlocked, vec!["c".to_string()]);

        list.complete("c", &CompletionEvidence::none()).unwrap();
        assert_eq!(list.completed_ids().len(), 3);
        assert!(list.tasks().iter().all(|t| t.is_completed()));
    }

    #[test]
    fn test_one_completion_unlocks_all_dependents() {
        // A fans out: both B and C gate only on A.
        let mut tasks = chain_catalog().tasks;
        tasks[2].depends_on = vec!["a".into()];
        let catalog = TaskCatalog::new(tasks).unwrap();
        let mut list = Checklist::new(ChecklistKind::Onboarding, catalog, None).unwrap();

        let unlocked = list.complete("a", &CompletionEvidence::none()).unwrap();
        assert_eq!(unlocked, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(list.task("b").unwrap().status, TaskStatus::Available);
        assert_eq!(list.task("c").unwrap().status, TaskStatus::Available);
    }

    #[test]
    fn test_new_rejects_hand_assembled_invalid_catalog() {
        // Built via the struct literal, bypassing TaskCatalog::new.
        let mut tasks = chain_catalog().tasks;
        tasks[2].depends_on = vec!["ghost".into()];
        let catalog = TaskCatalog { tasks };
        match Checklist::new(ChecklistKind::Onboarding, catalog, None) {
            Err(ChecklistError::Catalog(CatalogError::UnknownPrerequisite {
                prerequisite,
                ..
            })) => assert_eq!(prerequisite, "ghost"),
            other => panic!("expected UnknownPrerequisite, got {other:?}"),
        }
    }

    #[test]
    fn test_locked_task_cannot_complete() {
        let mut list =
            Checklist::new(ChecklistKind::Onboarding, chain_catalog(), None).unwrap();
        assert!(matches!(
            list.complete("c", &CompletionEvidence::none()),
            Err(ChecklistError::TaskLocked(_))
        ));
        assert_eq!(list.task("c").unwrap().status, TaskStatus::Locked);
    }

    #[test]
    fn test_signature_guard_rejects_without_mutation() {
        let mut catalog = chain_catalog();
        catalog.tasks[0].requires_signature = true;
        let mut list = Checklist::new(ChecklistKind::Onboarding, catalog, None).unwrap();

        assert!(matches!(
            list.complete("a", &CompletionEvidence::none()),
            Err(ChecklistError::SignatureRequired(_))
        ));
        // Empty signatures do not count either.
        assert!(matches!(
            list.complete("a", &CompletionEvidence::signed("   ")),
            Err(ChecklistError::SignatureRequired(_))
        ));
        assert_eq!(list.task("a").unwrap().status, TaskStatus::Available);
        assert!(list.task("a").unwrap().completed_at.is_none());
        assert!(list.completed_ids().is_empty());

        list.complete("a", &CompletionEvidence::signed("Aisyah binti Rahman"))
            .unwrap();
        assert_eq!(list.task("a").unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_upload_guard() {
        let mut catalog = chain_catalog();
        catalog.tasks[0].requires_upload = true;
        let mut list = Checklist::new(ChecklistKind::Training, catalog, None).unwrap();

        assert!(matches!(
            list.complete("a", &CompletionEvidence::none()),
            Err(ChecklistError::UploadRequired(_))
        ));
        let evidence = CompletionEvidence {
            signature: None,
            file_name: Some("certificate.pdf".into()),
        };
        list.complete("a", &evidence).unwrap();
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut list =
            Checklist::new(ChecklistKind::Onboarding, chain_catalog(), None).unwrap();
        list.complete("a", &CompletionEvidence::none()).unwrap();
        assert!(matches!(
            list.complete("a", &CompletionEvidence::none()),
            Err(ChecklistError::AlreadyCompleted(_))
        ));
    }

    #[test]
    fn test_start_stamps_started_at() {
        let mut list =
            Checklist::new(ChecklistKind::Onboarding, chain_catalog(), None).unwrap();
        list.start("a").unwrap();
        assert_eq!(list.task("a").unwrap().status, TaskStatus::InProgress);
        assert!(list.task("a").unwrap().started_at.is_some());
        assert!(matches!(list.start("b"), Err(ChecklistError::TaskLocked(_))));
    }

    #[test]
    fn test_precompleted_tasks_seed_unlocks() {
        let mut catalog = chain_catalog();
        catalog.tasks[0].status = TaskStatus::Completed;
        let list = Checklist::new(ChecklistKind::Onboarding, catalog, None).unwrap();
        assert_eq!(list.task("b").unwrap().status, TaskStatus::Available);
        assert_eq!(list.task("c").unwrap().status, TaskStatus::Locked);
    }

    #[test]
    fn test_due_dates_resolved_from_start() {
        let mut catalog = chain_catalog();
        catalog.tasks[0].due_days_from_start = Some(2);
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let list = Checklist::new(ChecklistKind::Onboarding, catalog, Some(start)).unwrap();
        assert_eq!(
            list.task("a").unwrap().due_date,
            NaiveDate::from_ymd_opt(2025, 6, 4)
        );
    }
}
