//! Multi-touch attribution: splits an order's revenue across the marketing
//! touchpoints that led to it.
//!
//! Weights are plain `f64`. Linear attribution over `N` touchpoints produces
//! `1.0 / N` per touchpoint, with the usual floating point representation
//! (`1/3` is `0.3333333333333333`).

pub mod revenue;

use serde::{Deserialize, Serialize};

use crate::domain::order::OrderId;
use crate::domain::touchpoint::{Touchpoint, TouchpointKey};
use crate::errors::AttributionError;

/// Largest deviation from 1 that [`validate_weights`] tolerates. Anything above
/// this is a broken policy, not accumulated division residue.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub key: TouchpointKey,
    pub weight: f64,
}

pub trait AttributionPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `touchpoints` must be ordered oldest first.
    fn attribute(&self, touchpoints: &[Touchpoint]) -> Vec<Attribution>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LastTouch;

impl AttributionPolicy for LastTouch {
    fn name(&self) -> &'static str {
        "last_touch"
    }

    fn attribute(&self, touchpoints: &[Touchpoint]) -> Vec<Attribution> {
        touchpoints
            .last()
            .map(|newest| vec![Attribution { key: newest.key.clone(), weight: 1.0 }])
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FirstTouch;

impl AttributionPolicy for FirstTouch {
    fn name(&self) -> &'static str {
        "first_touch"
    }

    fn attribute(&self, touchpoints: &[Touchpoint]) -> Vec<Attribution> {
        touchpoints
            .first()
            .map(|oldest| vec![Attribution { key: oldest.key.clone(), weight: 1.0 }])
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Linear;

impl AttributionPolicy for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn attribute(&self, touchpoints: &[Touchpoint]) -> Vec<Attribution> {
        if touchpoints.is_empty() {
            return Vec::new();
        }
        let weight = 1.0 / touchpoints.len() as f64;
        touchpoints
            .iter()
            .map(|touchpoint| Attribution { key: touchpoint.key.clone(), weight })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    LastTouch,
    FirstTouch,
    #[default]
    Linear,
}

impl AttributionModel {
    pub fn policy(self) -> &'static dyn AttributionPolicy {
        match self {
            Self::LastTouch => &LastTouch,
            Self::FirstTouch => &FirstTouch,
            Self::Linear => &Linear,
        }
    }
}

impl AttributionPolicy for AttributionModel {
    fn name(&self) -> &'static str {
        self.policy().name()
    }

    fn attribute(&self, touchpoints: &[Touchpoint]) -> Vec<Attribution> {
        self.policy().attribute(touchpoints)
    }
}

impl std::str::FromStr for AttributionModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "last_touch" => Ok(Self::LastTouch),
            "first_touch" => Ok(Self::FirstTouch),
            "linear" => Ok(Self::Linear),
            other => Err(format!(
                "unsupported attribution model `{other}` (expected last_touch|first_touch|linear)"
            )),
        }
    }
}

/// Fails when the weights of one order do not add up to 1. Never normalizes.
///
/// The check is exact up to [`WEIGHT_SUM_TOLERANCE`]. That margin only covers
/// the f64 residue of summing `1/N` shares, so a split such as `[0.5, 0.5 + 1e-6]`
/// is reported as a mismatch rather than rescaled. Raising the tolerance would let
/// genuinely broken policies through unnoticed.
pub fn validate_weights(
    order_id: &OrderId,
    attributions: &[Attribution],
) -> Result<(), AttributionError> {
    let sum: f64 = attributions.iter().map(|attribution| attribution.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(AttributionError::WeightSumMismatch { order_id: order_id.clone(), sum });
    }
    Ok(())
}
