use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::attribution::{validate_weights, AttributionPolicy};
use crate::domain::order::PlacedOrder;
use crate::domain::touchpoint::TouchpointKey;
use crate::errors::AttributionError;

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;
const YEAR_DAYS: i64 = 365;

/// Attributed revenue of one touchpoint over trailing windows ending at "now".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRevenue {
    pub key: TouchpointKey,
    pub revenue_last_7days: f64,
    pub revenue_last_30days: f64,
    pub revenue_last_365days: f64,
}

impl CampaignRevenue {
    fn empty(key: TouchpointKey) -> Self {
        Self { key, revenue_last_7days: 0.0, revenue_last_30days: 0.0, revenue_last_365days: 0.0 }
    }
}

#[derive(Clone, Copy, Debug)]
struct Windows {
    now: DateTime<Utc>,
    week: DateTime<Utc>,
    month: DateTime<Utc>,
    year: DateTime<Utc>,
}

impl Windows {
    fn ending_at(now: DateTime<Utc>) -> Self {
        let cutoff = |days| {
            TimeDelta::try_days(days)
                .and_then(|delta| now.checked_sub_signed(delta))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };
        Self { now, week: cutoff(WEEK_DAYS), month: cutoff(MONTH_DAYS), year: cutoff(YEAR_DAYS) }
    }

    fn contains(&self, from: DateTime<Utc>, at: DateTime<Utc>) -> bool {
        at >= from && at <= self.now
    }
}

pub struct RevenueAggregator<P> {
    policy: P,
}

impl<P: AttributionPolicy> RevenueAggregator<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// Sums `order total * weight` per touchpoint into 7/30/365 day windows.
    ///
    /// Any order whose weights do not sum to 1 aborts the whole calculation.
    pub fn aggregate(
        &self,
        orders: &[PlacedOrder],
        now: DateTime<Utc>,
    ) -> Result<Vec<CampaignRevenue>, AttributionError> {
        let windows = Windows::ending_at(now);
        let mut revenue: BTreeMap<TouchpointKey, CampaignRevenue> = BTreeMap::new();

        for order in orders {
            if order.touchpoints.is_empty() {
                tracing::debug!(
                    event_name = "attribution.order.skipped",
                    order_id = %order.id,
                    "order has no touchpoints"
                );
                continue;
            }

            let attributions = self.policy.attribute(order.touchpoints.as_slice());
            validate_weights(&order.id, &attributions)?;

            if !windows.contains(windows.year, order.placed_at) {
                continue;
            }
            let in_week = windows.contains(windows.week, order.placed_at);
            let in_month = windows.contains(windows.month, order.placed_at);

            for attribution in attributions {
                let amount = order.total_with_tax as f64 * attribution.weight;
                let entry = revenue
                    .entry(attribution.key.clone())
                    .or_insert_with(|| CampaignRevenue::empty(attribution.key));
                entry.revenue_last_365days += amount;
                if in_month {
                    entry.revenue_last_30days += amount;
                }
                if in_week {
                    entry.revenue_last_7days += amount;
                }
            }
        }

        tracing::info!(
            event_name = "attribution.revenue.aggregated",
            policy = self.policy.name(),
            orders = orders.len(),
            touchpoints = revenue.len(),
            "campaign revenue aggregated"
        );

        Ok(revenue.into_values().collect())
    }
}
