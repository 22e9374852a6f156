// Image module
// Photos attached to onsen logs, capped per log entry

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::ImageError;
pub use service::{ImageService, MAX_IMAGES_PER_LOG};
pub use storage::{ImageStorage, LocalFileStorage};
