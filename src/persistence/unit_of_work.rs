use futures_util::future::BoxFuture;

use super::staged::{StagedOutbox, StagedRepository};
use super::store::CommittedStores;
use crate::domain::menu_item::MenuItem;
use crate::domain::order::Order;

// ============================================================================
// Unit of Work - Scoped, all-or-nothing staged transaction
// ============================================================================
//
// Lifecycle:
//   enter()  → fresh overlays over the committed stores
//   save/find through orders() / menu_items() / outbox()
//   commit() → validate versions, then merge every overlay at once
//   exit()   → drop whatever is still staged
//
// Commit is always explicit. Leaving the scope without it merges nothing.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UnitOfWorkError {
    #[error("Unit of work used outside an open scope")]
    NotEntered,

    #[error("Unit of work scope is already open")]
    AlreadyEntered,

    #[error(
        "Concurrent modification of {aggregate_type} '{aggregate_id}': \
         expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: &'static str,
        aggregate_id: String,
        expected: u64,
        actual: u64,
    },
}

struct Staging {
    orders: StagedRepository<Order>,
    menu_items: StagedRepository<MenuItem>,
    outbox: StagedOutbox,
}

impl Staging {
    fn new(stores: &CommittedStores) -> Self {
        Self {
            orders: StagedRepository::new(stores.orders.clone()),
            menu_items: StagedRepository::new(stores.menu_items.clone()),
            outbox: StagedOutbox::new(stores.outbox.clone()),
        }
    }
}

pub struct UnitOfWork {
    stores: CommittedStores,
    staging: Option<Staging>,
}

impl UnitOfWork {
    pub fn new(stores: CommittedStores) -> Self {
        Self {
            stores,
            staging: None,
        }
    }

    pub fn enter(&mut self) -> Result<(), UnitOfWorkError> {
        if self.staging.is_some() {
            return Err(UnitOfWorkError::AlreadyEntered);
        }
        self.staging = Some(Staging::new(&self.stores));
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.staging.is_some()
    }

    pub fn orders(&mut self) -> Result<&mut StagedRepository<Order>, UnitOfWorkError> {
        Ok(&mut self.staging_mut()?.orders)
    }

    pub fn menu_items(&mut self) -> Result<&mut StagedRepository<MenuItem>, UnitOfWorkError> {
        Ok(&mut self.staging_mut()?.menu_items)
    }

    pub fn outbox(&mut self) -> Result<&mut StagedOutbox, UnitOfWorkError> {
        Ok(&mut self.staging_mut()?.outbox)
    }

    /// Merge every overlay into the committed stores.
    ///
    /// Store locks are always taken in the same order (orders, menu items,
    /// outbox). On a version mismatch nothing is merged and the overlays are
    /// left in place. On success the scope stays open with empty overlays.
    pub async fn commit(&mut self) -> Result<(), UnitOfWorkError> {
        let staging = self
            .staging
            .as_mut()
            .ok_or(UnitOfWorkError::NotEntered)?;

        let mut orders = self.stores.orders.write().await;
        let mut menu_items = self.stores.menu_items.write().await;
        let mut outbox = self.stores.outbox.write().await;

        if let Err(conflict) = staging
            .orders
            .validate(&orders)
            .and_then(|_| staging.menu_items.validate(&menu_items))
        {
            tracing::warn!(error = %conflict, "⚠️ Commit rejected, nothing merged");
            return Err(conflict);
        }

        let staged = std::mem::replace(staging, Staging::new(&self.stores));
        let merged_orders = staged.orders.merge_into(&mut orders);
        let merged_menu_items = staged.menu_items.merge_into(&mut menu_items);
        let merged_entries = staged.outbox.merge_into(&mut outbox);

        tracing::info!(
            orders = merged_orders,
            menu_items = merged_menu_items,
            outbox_entries = merged_entries,
            "✅ Committed staged transaction"
        );
        Ok(())
    }

    /// Discard every overlay; the scope stays open
    pub fn rollback(&mut self) -> Result<(), UnitOfWorkError> {
        if self.staging.is_none() {
            return Err(UnitOfWorkError::NotEntered);
        }
        self.staging = Some(Staging::new(&self.stores));
        tracing::debug!("Rolled back staged transaction");
        Ok(())
    }

    /// Close the scope; anything not committed is dropped
    pub fn exit(&mut self) {
        self.staging = None;
    }

    /// Run `work` inside enter/exit, rolling back when it returns an error.
    ///
    /// ```ignore
    /// uow.scoped(move |uow| Box::pin(async move {
    ///     uow.menu_items()?.save(item).await;
    ///     uow.commit().await?;
    ///     Ok::<_, CommandError>(())
    /// }))
    /// .await?;
    /// ```
    pub async fn scoped<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t mut UnitOfWork) -> BoxFuture<'t, Result<T, E>>,
        E: From<UnitOfWorkError>,
    {
        self.enter()?;
        let result = work(&mut *self).await;
        // `work` may already have closed the scope itself
        if result.is_err() && self.is_open() {
            self.rollback()?;
        }
        self.exit();
        result
    }

    fn staging_mut(&mut self) -> Result<&mut Staging, UnitOfWorkError> {
        self.staging.as_mut().ok_or(UnitOfWorkError::NotEntered)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
