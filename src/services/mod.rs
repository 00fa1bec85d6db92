pub mod drafts;
pub mod portal_api;
