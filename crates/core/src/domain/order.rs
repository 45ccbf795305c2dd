use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::touchpoint::OrderTouchpoints;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A placed order as seen by revenue reporting. Totals are minor units, tax included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub total_with_tax: i64,
    pub placed_at: DateTime<Utc>,
    #[serde(default)]
    pub touchpoints: OrderTouchpoints,
}
