use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::domain::menu_item::MenuItem;
use crate::domain::order::Order;
use crate::outbox::OutboxStore;

// ============================================================================
// Committed Stores - Shared, process-owned aggregate state
// ============================================================================
//
// The hosting process owns these handles. Staged transactions borrow them for
// one scope and only ever write through `UnitOfWork::commit`.
//
// Every aggregate carries a version that starts at 1 on first commit and is
// bumped on each later commit, so a transaction can detect that somebody
// else committed the same id after it was read.
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Versioned<A> {
    pub version: u64,
    pub aggregate: A,
}

pub struct AggregateStore<A> {
    inner: Arc<RwLock<HashMap<String, Versioned<A>>>>,
}

impl<A> Clone for AggregateStore<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> Default for AggregateStore<A> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<A: Clone> AggregateStore<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned snapshot of the committed value
    pub async fn get(&self, id: &str) -> Option<Versioned<A>> {
        self.inner.read().await.get(id).cloned()
    }

    /// Committed version, 0 when the id has never been committed
    pub async fn version(&self, id: &str) -> u64 {
        self.inner.read().await.get(id).map_or(0, |v| v.version)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Versioned<A>>> {
        self.inner.write().await
    }
}

/// Every committed collection a staged transaction can touch
#[derive(Clone, Default)]
pub struct CommittedStores {
    pub orders: AggregateStore<Order>,
    pub menu_items: AggregateStore<MenuItem>,
    pub outbox: OutboxStore,
}

impl CommittedStores {
    pub fn new() -> Self {
        Self::default()
    }
}
