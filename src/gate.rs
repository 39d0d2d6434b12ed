// Two-phase delete confirmation held by the caller

use crate::error::TaskError;
use crate::kv::KeyValueStore;
use crate::models::TaskId;
use crate::store::TaskStore;
use tracing::debug;

/// Pending-delete marker
///
/// Requesting a delete only records the id. Nothing is removed until
/// [`DeleteGate::confirm`] runs, and [`DeleteGate::cancel`] drops the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeleteGate {
    pending: Option<TaskId>,
}

impl DeleteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` for deletion, replacing any earlier request
    pub fn request(&mut self, id: TaskId) {
        debug!(%id, "Delete requested");
        self.pending = Some(id);
    }

    pub fn pending(&self) -> Option<TaskId> {
        self.pending
    }

    /// Delete the pending task and clear the marker
    ///
    /// Returns the id that was deleted, or `None` when nothing was pending.
    /// On a storage failure the marker stays set so the caller can retry.
    pub fn confirm<B: KeyValueStore>(&mut self, store: &mut TaskStore<B>) -> Result<Option<TaskId>, TaskError> {
        let Some(id) = self.pending else {
            return Ok(None);
        };

        store.delete(&id)?;
        self.pending = None;
        Ok(Some(id))
    }

    /// Drop the pending request without touching the store
    pub fn cancel(&mut self) -> Option<TaskId> {
        self.pending.take()
    }
}
