use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistKind {
    Onboarding,
    Training,
}

impl ChecklistKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecklistKind::Onboarding => "onboarding",
            ChecklistKind::Training => "training",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    // Onboarding checklist
    Documentation,
    ItSetup,
    Compliance,
    Training,
    Culture,
    // Training checklist
    ItSystems,
    Orientation,
    RoleSpecific,
    SoftSkills,
    Security,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 10] = [
        TaskCategory::Documentation,
        TaskCategory::ItSetup,
        TaskCategory::Compliance,
        TaskCategory::Training,
        TaskCategory::Culture,
        TaskCategory::ItSystems,
        TaskCategory::Orientation,
        TaskCategory::RoleSpecific,
        TaskCategory::SoftSkills,
        TaskCategory::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Documentation => "documentation",
            TaskCategory::ItSetup => "it_setup",
            TaskCategory::Compliance => "compliance",
            TaskCategory::Training => "training",
            TaskCategory::Culture => "culture",
            TaskCategory::ItSystems => "it_systems",
            TaskCategory::Orientation => "orientation",
            TaskCategory::RoleSpecific => "role_specific",
            TaskCategory::SoftSkills => "soft_skills",
            TaskCategory::Security => "security",
        }
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "documentation" => Ok(TaskCategory::Documentation),
            "it_setup" | "it-setup" => Ok(TaskCategory::ItSetup),
            "compliance" => Ok(TaskCategory::Compliance),
            "training" => Ok(TaskCategory::Training),
            "culture" => Ok(TaskCategory::Culture),
            "it_systems" | "it-systems" => Ok(TaskCategory::ItSystems),
            "orientation" => Ok(TaskCategory::Orientation),
            "role_specific" | "role-specific" => Ok(TaskCategory::RoleSpecific),
            "soft_skills" | "soft-skills" => Ok(TaskCategory::SoftSkills),
            "security" => Ok(TaskCategory::Security),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Required,
    Optional,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Required => "required",
            TaskPriority::Optional => "optional",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Locked,
    Available,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Locked => "locked",
            TaskStatus::Available => "available",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "locked" => Ok(TaskStatus::Locked),
            "available" => Ok(TaskStatus::Available),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(()),
        }
    }
}

fn default_status() -> TaskStatus {
    TaskStatus::Available
}

/// One onboarding or training checklist item. Catalog entries are
/// configuration; `status` and the timestamps mutate at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: TaskCategory,
    pub priority: TaskPriority,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub due_days_from_start: Option<i64>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub requires_upload: bool,
    #[serde(default)]
    pub requires_signature: bool,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_required(&self) -> bool {
        self.priority == TaskPriority::Required
    }

    /// Resolve `due_days_from_start` against the employee start date.
    pub fn resolve_due_date(&mut self, start_date: NaiveDate) {
        if let Some(offset) = self.due_days_from_start {
            self.due_date = Some(start_date + Duration::days(offset));
        }
    }
}
