use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::PricingError;

/// Promotion hook that reduces future recurring payments. It never touches the
/// downpayment or the amount due at checkout.
pub trait RecurringDiscount: Send + Sync {
    /// Percentage shown to customers, when the discount is percentage based.
    fn discount_percent(&self) -> Option<Decimal>;

    /// Minor units taken off `current_price`.
    fn discount_amount(&self, current_price: i64) -> i64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PercentageDiscount {
    percent: Decimal,
}

impl PercentageDiscount {
    pub fn new(percent: Decimal) -> Result<Self, PricingError> {
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(PricingError::InvalidDiscountPercent(percent));
        }
        Ok(Self { percent })
    }
}

impl RecurringDiscount for PercentageDiscount {
    fn discount_percent(&self) -> Option<Decimal> {
        Some(self.percent)
    }

    fn discount_amount(&self, current_price: i64) -> i64 {
        let amount = Decimal::from(current_price) * self.percent / Decimal::ONE_HUNDRED;
        amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .unwrap_or(0)
    }
}
