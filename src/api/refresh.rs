use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Mutex, PoisonError};

/// Pending refresh, resolving to the new access token or `None` on failure
pub type RefreshHandle = Shared<BoxFuture<'static, Option<String>>>;

/// Single-flight slot for the token refresh.
///
/// Holds at most one pending refresh. Callers that find a handle in the slot
/// await a clone of it instead of starting their own refresh. The lock is
/// only held for the check-and-install step, never across an await.
#[derive(Default)]
pub struct RefreshSlot {
    pending: Mutex<Option<RefreshHandle>>,
}

impl RefreshSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the in-flight handle, or install the one built by `start`.
    /// The boolean is true when this call started the refresh.
    pub fn join_or_start<F>(&self, start: F) -> (RefreshHandle, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Option<String>>,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = pending.as_ref() {
            return (handle.clone(), false);
        }

        let handle = start().shared();
        *pending = Some(handle.clone());
        (handle, true)
    }

    /// Empty the slot so the next 401 starts a fresh refresh
    pub fn release(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
