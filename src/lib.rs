//! Core logic for the PeopleOps onboarding portal.
//!
//! Drives the onboarding and training checklists (task dependencies,
//! status lifecycle, weighted progress) and the schema-driven employment
//! contract form. Rendering, routing and persistence live in the host
//! application; this crate owns the state and the rules.
//!
//! # Modules
//!
//! - `domain`: tasks, catalogs, the dependency resolver and the checklist
//!   state machine
//! - `analytics`: weighted progress summaries and pace estimates
//! - `forms`: declarative form schemas, field validators, the form engine
//! - `services`: REST status/document collaborator and the draft store

pub mod analytics;
pub mod domain;
pub mod forms;
pub mod services;

pub use analytics::progress::{
    compute_progress, default_weights, CategoryProgress, CategoryWeights, PaceConfig,
    ProgressSummary,
};
pub use domain::catalog::{CatalogError, TaskCatalog};
pub use domain::checklist::{Checklist, ChecklistError, CompletionEvidence};
pub use domain::task::{ChecklistKind, Task, TaskCategory, TaskPriority, TaskStatus};
pub use forms::engine::{FieldChange, FormEngine, FormError, FormSubmission};
pub use forms::schema::{FieldCondition, FormField, FormSchema, FormSection, SchemaError};
pub use forms::validators::ValidatorRegistry;
pub use services::drafts::{DraftStore, MemoryDraftStore};
pub use services::portal_api::{
    fetch_schema, flush_completion, CompletionRecord, HttpStatusBackend, StatusBackend,
};
