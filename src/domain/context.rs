use std::sync::Arc;

use super::errors::CommandError;
use crate::clock::Clock;
use crate::event_sourcing::core::AggregateRoot;
use crate::ids::IdGenerator;
use crate::outbox::{OutboxEntry, RetryPolicy};
use crate::persistence::{CommittedStores, UnitOfWork};

// ============================================================================
// Command Context - Collaborators shared by every command handler
// ============================================================================

#[derive(Clone)]
pub struct CommandContext {
    stores: CommittedStores,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    retry_policy: RetryPolicy,
}

impl CommandContext {
    pub fn new(stores: CommittedStores, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            ids,
            clock,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Retry budget stamped onto every outbox entry created from now on
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn stores(&self) -> &CommittedStores {
        &self.stores
    }

    /// A fresh, not yet entered, transaction over the committed stores
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.stores.clone())
    }

    pub fn next_id(&self) -> String {
        self.ids.generate()
    }

    /// Drain the aggregate's recorded events into the transaction's outbox,
    /// one PENDING entry per event, all stamped with the same time.
    pub async fn stage_events<A: AggregateRoot>(
        &self,
        uow: &mut UnitOfWork,
        aggregate: &mut A,
    ) -> Result<usize, CommandError> {
        let events = aggregate.take_events();
        let occurred_at = self.clock.now();
        let outbox = uow.outbox()?;

        for event in &events {
            let entry = OutboxEntry::create(
                self.ids.generate(),
                event,
                aggregate.aggregate_id(),
                A::AGGREGATE_TYPE,
                occurred_at,
            )?
            .with_retry_policy(self.retry_policy)?;
            outbox.save(entry).await?;
        }
        Ok(events.len())
    }
}
