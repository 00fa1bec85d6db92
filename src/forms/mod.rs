pub mod engine;
pub mod schema;
pub mod validators;
