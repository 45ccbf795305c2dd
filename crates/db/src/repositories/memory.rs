use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use shopkit_core::domain::order::OrderId;
use shopkit_core::domain::schedule::{BillingSchedule, ChannelId, ScheduleId};
use shopkit_core::domain::touchpoint::{OrderTouchpoints, TouchpointKey};

use super::{RepositoryError, ScheduleRepository, TouchpointRepository};

type ScheduleKey = (String, String);

fn schedule_key(channel: &ChannelId, id: &ScheduleId) -> ScheduleKey {
    (channel.0.clone(), id.0.clone())
}

#[derive(Default)]
pub struct InMemoryScheduleRepository {
    schedules: RwLock<HashMap<ScheduleKey, BillingSchedule>>,
}

#[async_trait::async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn find(
        &self,
        channel: &ChannelId,
        id: &ScheduleId,
    ) -> Result<Option<BillingSchedule>, RepositoryError> {
        let schedules = self.schedules.read().await;
        Ok(schedules.get(&schedule_key(channel, id)).cloned())
    }

    async fn list_for_channel(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<BillingSchedule>, RepositoryError> {
        let schedules = self.schedules.read().await;
        let mut listed: Vec<BillingSchedule> = schedules
            .values()
            .filter(|schedule| &schedule.channel == channel)
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(listed)
    }

    async fn save(&self, schedule: BillingSchedule) -> Result<(), RepositoryError> {
        let mut schedules = self.schedules.write().await;
        schedules.insert(schedule_key(&schedule.channel, &schedule.id), schedule);
        Ok(())
    }

    async fn delete(&self, channel: &ChannelId, id: &ScheduleId) -> Result<(), RepositoryError> {
        let mut schedules = self.schedules.write().await;
        schedules.remove(&schedule_key(channel, id)).map(|_| ()).ok_or_else(|| {
            RepositoryError::ScheduleNotFound { id: id.0.clone(), channel: channel.0.clone() }
        })
    }
}

#[derive(Default)]
pub struct InMemoryTouchpointRepository {
    touchpoints: RwLock<HashMap<String, OrderTouchpoints>>,
}

#[async_trait::async_trait]
impl TouchpointRepository for InMemoryTouchpointRepository {
    async fn record(
        &self,
        order_id: &OrderId,
        key: TouchpointKey,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut touchpoints = self.touchpoints.write().await;
        touchpoints.entry(order_id.0.clone()).or_default().record(key, at);
        Ok(())
    }

    async fn find_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<OrderTouchpoints, RepositoryError> {
        let touchpoints = self.touchpoints.read().await;
        Ok(touchpoints.get(&order_id.0).cloned().unwrap_or_default())
    }
}
