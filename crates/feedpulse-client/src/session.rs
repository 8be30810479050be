//! Single-owner session registration.
//!
//! Exactly one registration request is ever in flight: the first
//! caller runs it, every concurrent caller awaits the same cell with a
//! bounded deadline instead of polling.

use std::future::Future;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::error::TrackerError;

pub struct SessionContext {
    cell: OnceCell<String>,
    deadline: Duration,
}

impl SessionContext {
    pub fn new(deadline: Duration) -> Self {
        Self {
            cell: OnceCell::new(),
            deadline,
        }
    }

    /// Return the established session id, registering one if needed.
    /// `register` runs at most once across all concurrent callers.
    pub async fn ensure<F, Fut>(&self, register: F) -> Result<&str, TrackerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, TrackerError>>,
    {
        let session_id = tokio::time::timeout(self.deadline, self.cell.get_or_try_init(register))
            .await
            .map_err(|_| TrackerError::SessionTimeout)??;
        Ok(session_id.as_str())
    }

    /// The session id if one is already established. Teardown-path
    /// events use this: they must never trigger a registration.
    pub fn current(&self) -> Option<&str> {
        self.cell.get().map(String::as_str)
    }
}
