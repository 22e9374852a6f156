// Single authorization predicate for user-owned resources

use thiserror::Error;
use uuid::Uuid;

use crate::images::models::LogImage;
use crate::logs::models::LogEntry;

/// A resource that belongs to exactly one user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for LogEntry {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for LogImage {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// The caller is authenticated but does not own the resource
#[derive(Debug, Error, PartialEq, Eq)]
#[error("user {caller} does not own this resource")]
pub struct Forbidden {
    pub caller: Uuid,
}

/// Check applied before every read or mutation of a log entry or image
pub fn ensure_owned<R: Owned + ?Sized>(resource: &R, caller: Uuid) -> Result<(), Forbidden> {
    if resource.owner_id() == caller {
        Ok(())
    } else {
        Err(Forbidden { caller })
    }
}
