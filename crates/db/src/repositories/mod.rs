use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shopkit_core::domain::order::OrderId;
use shopkit_core::domain::schedule::{BillingSchedule, ChannelId, ScheduleId};
use shopkit_core::domain::touchpoint::{OrderTouchpoints, TouchpointKey};
use shopkit_core::errors::ApplicationError;

pub mod memory;

pub use memory::{InMemoryScheduleRepository, InMemoryTouchpointRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("schedule `{id}` is not registered for channel `{channel}`")]
    ScheduleNotFound { id: String, channel: String },
}

impl From<RepositoryError> for ApplicationError {
    fn from(error: RepositoryError) -> Self {
        ApplicationError::Persistence(error.to_string())
    }
}

/// Billing schedules are scoped per sales channel: the same id may exist in
/// several channels with different settings.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find(
        &self,
        channel: &ChannelId,
        id: &ScheduleId,
    ) -> Result<Option<BillingSchedule>, RepositoryError>;

    async fn list_for_channel(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<BillingSchedule>, RepositoryError>;

    async fn save(&self, schedule: BillingSchedule) -> Result<(), RepositoryError>;

    async fn delete(&self, channel: &ChannelId, id: &ScheduleId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TouchpointRepository: Send + Sync {
    /// Re-recording a key moves it to its new timestamp.
    async fn record(
        &self,
        order_id: &OrderId,
        key: TouchpointKey,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn find_for_order(&self, order_id: &OrderId)
        -> Result<OrderTouchpoints, RepositoryError>;
}
