// Onsen log module
// Owner-scoped log entries: CRUD, filtered listing and export

pub mod error;
pub mod export;
pub mod handlers;
pub mod models;
pub mod ownership;
pub mod query;
pub mod repository;
pub mod service;

pub use error::LogError;
pub use models::{Feature, LogEntry, LogRequest, SpringType};
pub use service::LogService;
