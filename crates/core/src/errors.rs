use rust_decimal::Decimal;
use thiserror::Error;

use crate::dates::DateError;
use crate::domain::order::OrderId;
use crate::domain::schedule::{IntervalUnit, StartMoment};

/// How a failure should be surfaced to whoever triggered the calculation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-correctable; re-submit with different input.
    UserInput,
    /// Broken integration; should never reach production.
    Precondition,
    /// A calculation produced an impossible result.
    InvariantViolation,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("cannot calculate subscription pricing without variant price")]
    MissingVariantPrice,
    #[error("variant price must be positive, got {0}")]
    NonPositiveVariantPrice(i64),
    #[error("no subscription schedule is attached to this variant")]
    MissingSchedule,
    #[error("downpayments are not allowed for paid-up-front subscriptions")]
    DownpaymentOnPaidUpFront,
    #[error("downpayment cannot be higher than the total subscription value, which is {total}")]
    DownpaymentAboveTotal { downpayment: i64, total: i64 },
    #[error("downpayment cannot be lower than the schedule's default downpayment, which is {minimum}")]
    DownpaymentBelowMinimum { downpayment: i64, minimum: i64 },
    #[error("a custom start date cannot be used with a schedule that has a fixed start date")]
    StartDateOverrideOnFixedSchedule,
    #[error("billing interval must be greater than or equal to duration interval")]
    BillingCoarserThanDuration,
    #[error("unhandled combination of start moment {start_moment} and interval {interval}")]
    UnhandledCombination { start_moment: StartMoment, interval: IntervalUnit },
    #[error("discount percentage must be between 0 and 100, got {0}")]
    InvalidDiscountPercent(Decimal),
    #[error("invalid subscription schedule: {0}")]
    InvalidSchedule(String),
    #[error(transparent)]
    Date(#[from] DateError),
    #[error("subscription amount overflowed while computing {0}")]
    AmountOverflow(&'static str),
}

impl PricingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingVariantPrice | Self::NonPositiveVariantPrice(_) => ErrorClass::Precondition,
            Self::UnhandledCombination { .. } | Self::Date(_) | Self::AmountOverflow(_) => {
                ErrorClass::InvariantViolation
            }
            Self::MissingSchedule
            | Self::DownpaymentOnPaidUpFront
            | Self::DownpaymentAboveTotal { .. }
            | Self::DownpaymentBelowMinimum { .. }
            | Self::StartDateOverrideOnFixedSchedule
            | Self::BillingCoarserThanDuration
            | Self::InvalidDiscountPercent(_)
            | Self::InvalidSchedule(_) => ErrorClass::UserInput,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AttributionError {
    #[error("attribution weights for order {order_id} sum to {sum}, expected exactly 1")]
    WeightSumMismatch { order_id: OrderId, sum: f64 },
}

impl AttributionError {
    pub fn class(&self) -> ErrorClass {
        ErrorClass::InvariantViolation
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Attribution(#[from] AttributionError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Pricing(error) => match error.class() {
                ErrorClass::UserInput => {
                    Self::BadRequest { message: error.to_string(), correlation_id: unassigned() }
                }
                ErrorClass::Precondition | ErrorClass::InvariantViolation => {
                    Self::Internal { message: error.to_string(), correlation_id: unassigned() }
                }
            },
            ApplicationError::Attribution(error) => {
                Self::Internal { message: error.to_string(), correlation_id: unassigned() }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: unassigned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::order::OrderId;
    use crate::errors::{
        ApplicationError, AttributionError, ErrorClass, InterfaceError, PricingError,
    };

    #[test]
    fn user_input_pricing_error_maps_to_bad_request() {
        let interface = ApplicationError::from(PricingError::DownpaymentOnPaidUpFront)
            .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ref message,
            } if correlation_id == "req-1" && message.contains("paid-up-front")
        ));
        assert_eq!(
            interface.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[test]
    fn missing_variant_price_is_a_precondition_failure() {
        assert_eq!(PricingError::MissingVariantPrice.class(), ErrorClass::Precondition);

        let interface =
            ApplicationError::from(PricingError::MissingVariantPrice).into_interface("req-2");
        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(
            PricingError::MissingVariantPrice.to_string(),
            "cannot calculate subscription pricing without variant price"
        );
    }

    #[test]
    fn weight_mismatch_names_the_computed_sum() {
        let error = AttributionError::WeightSumMismatch {
            order_id: OrderId("order-7".to_owned()),
            sum: 0.5,
        };
        assert_eq!(error.class(), ErrorClass::InvariantViolation);
        assert!(error.to_string().contains("sum to 0.5"));

        let interface = ApplicationError::from(error).into_interface("req-3");
        assert!(matches!(interface, InterfaceError::Internal { .. }));
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Persistence("schedule store unreachable".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("catalog path missing".to_owned())
            .into_interface("req-5");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
