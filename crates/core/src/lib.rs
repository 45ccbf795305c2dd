pub mod attribution;
pub mod config;
pub mod dates;
pub mod domain;
pub mod errors;
pub mod subscription;

pub use attribution::revenue::{CampaignRevenue, RevenueAggregator};
pub use attribution::{Attribution, AttributionModel, AttributionPolicy};
pub use domain::order::{OrderId, PlacedOrder};
pub use domain::schedule::{BillingSchedule, ChannelId, IntervalUnit, ScheduleId, StartMoment};
pub use domain::touchpoint::{OrderTouchpoints, Touchpoint, TouchpointKey};
pub use errors::{ApplicationError, AttributionError, InterfaceError, PricingError};
pub use subscription::discount::{PercentageDiscount, RecurringDiscount};
pub use subscription::pricing::{PricingOverrides, PricingRequest, PricingResult, PricingSettings};
pub use subscription::{DeterministicSubscriptionPricingEngine, SubscriptionPricingEngine};
