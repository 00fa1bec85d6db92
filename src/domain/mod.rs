pub mod catalog;
pub mod checklist;
pub mod task;
pub mod unlock;
