use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PricingError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Week,
    Month,
}

impl IntervalUnit {
    pub fn intervals_per_year(self) -> i64 {
        match self {
            Self::Week => 52,
            Self::Month => 12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the first billing cycle of a new subscription begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartMoment {
    TimeOfPurchase,
    StartOfBillingInterval,
    EndOfBillingInterval,
    FixedStartDate,
}

impl StartMoment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimeOfPurchase => "time_of_purchase",
            Self::StartOfBillingInterval => "start_of_billing_interval",
            Self::EndOfBillingInterval => "end_of_billing_interval",
            Self::FixedStartDate => "fixed_start_date",
        }
    }
}

impl std::fmt::Display for StartMoment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSchedule {
    pub id: ScheduleId,
    pub channel: ChannelId,
    pub name: String,
    pub duration_interval: IntervalUnit,
    pub duration_count: u32,
    pub billing_interval: IntervalUnit,
    pub billing_count: u32,
    pub start_moment: StartMoment,
    #[serde(default)]
    pub fixed_start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub downpayment_with_tax: i64,
    #[serde(default)]
    pub use_proration: bool,
    #[serde(default = "default_auto_renew")]
    pub auto_renew: bool,
}

fn default_auto_renew() -> bool {
    true
}

impl BillingSchedule {
    /// The whole commitment is charged in a single billing cycle.
    pub fn paid_up_front(&self) -> bool {
        self.billing_interval == self.duration_interval
            && self.billing_count == self.duration_count
    }

    /// Administrator-side checks applied before a schedule is stored.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.name.trim().is_empty() {
            return Err(PricingError::InvalidSchedule("schedule name cannot be empty".to_string()));
        }
        if self.duration_count == 0 {
            return Err(PricingError::InvalidSchedule(
                "duration_count must be greater than zero".to_string(),
            ));
        }
        if self.billing_count == 0 {
            return Err(PricingError::InvalidSchedule(
                "billing_count must be greater than zero".to_string(),
            ));
        }
        if self.downpayment_with_tax < 0 {
            return Err(PricingError::InvalidSchedule(
                "downpayment_with_tax cannot be negative".to_string(),
            ));
        }
        if self.duration_interval == IntervalUnit::Week
            && self.billing_interval == IntervalUnit::Month
        {
            return Err(PricingError::BillingCoarserThanDuration);
        }
        if self.paid_up_front() && self.downpayment_with_tax != 0 {
            return Err(PricingError::DownpaymentOnPaidUpFront);
        }
        if self.start_moment == StartMoment::FixedStartDate && self.fixed_start_date.is_none() {
            return Err(PricingError::InvalidSchedule(
                "a fixed start date is required when start_moment is fixed_start_date".to_string(),
            ));
        }
        Ok(())
    }
}
