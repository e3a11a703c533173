//! Per-run access to the remote store
//!
//! Every applier reaches the remote shop through a [`SyncContext`], which
//! checks the run's [`CancellationToken`] around each call.

use crate::remote::{Criteria, Record, RemoteConfigStore};
use crate::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Store handle plus cancellation for one push, pull or apply
pub struct SyncContext<'a> {
    store: &'a dyn RemoteConfigStore,
    cancel: CancellationToken,
}

impl<'a> SyncContext<'a> {
    pub fn new(store: &'a dyn RemoteConfigStore) -> Self {
        Self::with_cancellation(store, CancellationToken::new())
    }

    pub fn with_cancellation(store: &'a dyn RemoteConfigStore, cancel: CancellationToken) -> Self {
        Self { store, cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with [`Error::Cancelled`] if the token has been tripped
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    pub fn search(&self, entity: &str, criteria: &Criteria) -> Result<Vec<Record>> {
        self.check()?;
        let records = self.store.search(entity, criteria)?;
        // A result that arrives after cancellation is discarded
        self.check()?;
        tracing::debug!(entity, count = records.len(), "Fetched remote records");
        Ok(records)
    }

    pub fn create(&self, entity: &str, payload: &Record) -> Result<()> {
        self.check()?;
        self.store.create(entity, payload)?;
        self.check()
    }

    pub fn update(&self, entity: &str, id: &str, payload: &Record) -> Result<()> {
        self.check()?;
        self.store.update(entity, id, payload)?;
        self.check()
    }

    pub fn delete(&self, entity: &str, id: &str) -> Result<()> {
        self.check()?;
        self.store.delete(entity, id)?;
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;

    #[test]
    fn cancelled_token_blocks_calls() {
        let store = MemoryStore::new();
        let token = CancellationToken::new();
        let ctx = SyncContext::with_cancellation(&store, token.clone());

        assert!(ctx.search("theme", &Criteria::new()).is_ok());

        token.cancel();
        let err = ctx.search("theme", &Criteria::new()).unwrap_err();

        assert!(err.is_cancelled());
        // Only the first search reached the store
        assert_eq!(store.calls().len(), 1);
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
    }
}
