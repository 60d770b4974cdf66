use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event_sourcing::core::{DomainEvent, EventData, EventDataError};

// ============================================================================
// Outbox Entry - Durable record of one event awaiting projection
// ============================================================================
//
// State machine:
//
//   PENDING ──► PROCESSED                     (terminal, success)
//      │
//      └──► FAILED ──► PROCESSED
//             │  ▲
//             └──┘ (retry with exponential backoff)
//             │
//             └──► DEAD_LETTERED              (terminal, retries exhausted)
//
// Invariants:
// - retry_count <= max_retries
// - next_retry_at is Some only while status == FAILED
// - nothing leaves PROCESSED or DEAD_LETTERED
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Processed,
    Failed,
    DeadLettered,
}

impl OutboxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboxStatus::Processed | OutboxStatus::DeadLettered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Processed => "processed",
            OutboxStatus::Failed => "failed",
            OutboxStatus::DeadLettered => "dead_lettered",
        }
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Outbox entry not found: {0}")]
    EntryNotFound(String),

    #[error("Outbox entry {0} already exists")]
    DuplicateEntry(String),

    #[error("Cannot {action} outbox entry {entry_id} in status {status}")]
    InvalidTransition {
        entry_id: String,
        status: OutboxStatus,
        action: &'static str,
    },

    #[error("Outbox entry field {0} is required")]
    MissingField(&'static str),

    #[error("Invalid retry policy: max_retries must be at least 1 (got {0})")]
    InvalidRetryPolicy(u32),

    #[error(transparent)]
    InvalidEventData(#[from] EventDataError),
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Retry budget fixed into each entry at creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_seconds: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_seconds: 1,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_seconds: u32) -> Result<Self, OutboxError> {
        if max_retries == 0 {
            return Err(OutboxError::InvalidRetryPolicy(max_retries));
        }
        Ok(Self {
            max_retries,
            base_delay_seconds,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay_seconds(&self) -> u32 {
        self.base_delay_seconds
    }

    /// Delay before the attempt following the `retry_count`-th failure:
    /// base * 2^(retry_count - 1), i.e. 1s, 2s, 4s, ... for a 1s base
    pub fn backoff_for(&self, retry_count: u32) -> TimeDelta {
        let exponent = retry_count.saturating_sub(1);
        let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let seconds = u64::from(self.base_delay_seconds).saturating_mul(factor);
        i64::try_from(seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

// ============================================================================
// Outbox Entry
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    entry_id: String,
    event_type: String,
    event_data: EventData,
    aggregate_id: String,
    aggregate_type: String,
    occurred_at: DateTime<Utc>,
    status: OutboxStatus,
    retry_count: u32,
    retry_policy: RetryPolicy,
    last_error: Option<String>,
    processed_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    /// Wrap a domain event into a new PENDING entry with the default retry policy
    pub fn create<E: DomainEvent>(
        entry_id: impl Into<String>,
        event: &E,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, OutboxError> {
        let entry_id = required(entry_id.into(), "entry_id")?;
        let aggregate_id = required(aggregate_id.into(), "aggregate_id")?;
        let aggregate_type = required(aggregate_type.into(), "aggregate_type")?;

        Ok(Self {
            entry_id,
            event_type: event.event_name().to_string(),
            event_data: event.to_event_data()?,
            aggregate_id,
            aggregate_type,
            occurred_at,
            status: OutboxStatus::Pending,
            retry_count: 0,
            retry_policy: RetryPolicy::default(),
            last_error: None,
            processed_at: None,
            next_retry_at: None,
        })
    }

    /// Replace the retry policy. Accepted only before the first attempt, so
    /// `retry_count <= max_retries` holds for the entry's whole life.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Result<Self, OutboxError> {
        if self.status != OutboxStatus::Pending || self.retry_count > 0 {
            return Err(OutboxError::InvalidTransition {
                entry_id: self.entry_id,
                status: self.status,
                action: "change the retry policy of",
            });
        }
        self.retry_policy = policy;
        Ok(self)
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_data(&self) -> &EventData {
        &self.event_data
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn status(&self) -> OutboxStatus {
        self.status
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn max_retries(&self) -> u32 {
        self.retry_policy.max_retries
    }

    pub fn base_delay_seconds(&self) -> u32 {
        self.retry_policy.base_delay_seconds
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn next_retry_at(&self) -> Option<DateTime<Utc>> {
        self.next_retry_at
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.retry_policy.max_retries
    }

    /// True if no retry is scheduled or the scheduled time has passed
    pub fn is_ready_for_retry(&self, now: DateTime<Utc>) -> bool {
        match self.next_retry_at {
            None => true,
            Some(at) => now >= at,
        }
    }

    /// Selection rule for a processing pass
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, OutboxStatus::Pending | OutboxStatus::Failed)
            && self.can_retry()
            && self.is_ready_for_retry(now)
    }

    /// PENDING | FAILED → PROCESSED
    pub fn mark_processed(&mut self, now: DateTime<Utc>) -> Result<(), OutboxError> {
        self.ensure_open("mark as processed")?;
        self.status = OutboxStatus::Processed;
        self.processed_at = Some(now);
        self.next_retry_at = None;
        Ok(())
    }

    /// Record a failed attempt. Returns the resulting status:
    /// FAILED with a backoff deadline, or DEAD_LETTERED once retries are spent.
    pub fn mark_failed(
        &mut self,
        error: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<OutboxStatus, OutboxError> {
        self.ensure_open("mark as failed")?;

        self.retry_count = (self.retry_count + 1).min(self.retry_policy.max_retries);
        self.last_error = Some(error.into());

        if self.can_retry() {
            let delay = self.retry_policy.backoff_for(self.retry_count);
            self.status = OutboxStatus::Failed;
            self.next_retry_at = Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
        } else {
            self.status = OutboxStatus::DeadLettered;
            self.next_retry_at = None;
        }

        Ok(self.status)
    }

    /// Administrative PENDING | FAILED → DEAD_LETTERED, bypassing the retry budget
    pub fn mark_dead_lettered(&mut self, reason: Option<String>) -> Result<(), OutboxError> {
        self.ensure_open("dead-letter")?;
        self.status = OutboxStatus::DeadLettered;
        self.next_retry_at = None;
        if reason.is_some() {
            self.last_error = reason;
        }
        Ok(())
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), OutboxError> {
        if self.status.is_terminal() {
            return Err(OutboxError::InvalidTransition {
                entry_id: self.entry_id.clone(),
                status: self.status,
                action,
            });
        }
        Ok(())
    }
}

fn required(value: String, field: &'static str) -> Result<String, OutboxError> {
    if value.trim().is_empty() {
        return Err(OutboxError::MissingField(field));
    }
    Ok(value)
}

// ============================================================================
// Unit Tests
// ============================================================================
