pub mod discount;
pub mod pricing;

use self::pricing::{PricingRequest, PricingResult, PricingSettings};
use crate::errors::PricingError;

pub trait SubscriptionPricingEngine: Send + Sync {
    fn price(&self, request: &PricingRequest<'_>) -> Result<PricingResult, PricingError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DeterministicSubscriptionPricingEngine {
    settings: PricingSettings,
}

impl DeterministicSubscriptionPricingEngine {
    pub fn new(settings: PricingSettings) -> Self {
        Self { settings }
    }
}

impl SubscriptionPricingEngine for DeterministicSubscriptionPricingEngine {
    fn price(&self, request: &PricingRequest<'_>) -> Result<PricingResult, PricingError> {
        pricing::calculate_pricing(request, &self.settings)
    }
}
