use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Campaign code or source key a touchpoint is recorded under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TouchpointKey(pub String);

impl std::fmt::Display for TouchpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Touchpoint {
    pub key: TouchpointKey,
    pub associated_at: DateTime<Utc>,
}

/// Touchpoints of a single order, oldest first. Each key appears at most once.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Touchpoint>", into = "Vec<Touchpoint>")]
pub struct OrderTouchpoints {
    touchpoints: Vec<Touchpoint>,
}

impl From<Vec<Touchpoint>> for OrderTouchpoints {
    fn from(entries: Vec<Touchpoint>) -> Self {
        Self::from_unordered(entries)
    }
}

impl From<OrderTouchpoints> for Vec<Touchpoint> {
    fn from(touchpoints: OrderTouchpoints) -> Self {
        touchpoints.touchpoints
    }
}

impl OrderTouchpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the sequence from raw entries; later duplicates win.
    pub fn from_unordered(entries: impl IntoIterator<Item = Touchpoint>) -> Self {
        let mut touchpoints = Self::new();
        for entry in entries {
            touchpoints.record(entry.key, entry.associated_at);
        }
        touchpoints
    }

    /// Associates `key` with the order at `at`. Re-recording a known key moves
    /// it to its new chronological position.
    pub fn record(&mut self, key: TouchpointKey, at: DateTime<Utc>) {
        self.touchpoints.retain(|touchpoint| touchpoint.key != key);
        self.touchpoints.push(Touchpoint { key, associated_at: at });
        self.touchpoints.sort_by_key(|touchpoint| touchpoint.associated_at);
    }

    pub fn as_slice(&self) -> &[Touchpoint] {
        &self.touchpoints
    }

    pub fn len(&self) -> usize {
        self.touchpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touchpoints.is_empty()
    }

    pub fn newest(&self) -> Option<&Touchpoint> {
        self.touchpoints.last()
    }

    pub fn oldest(&self) -> Option<&Touchpoint> {
        self.touchpoints.first()
    }
}
