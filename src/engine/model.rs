use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::blueprint::Blueprint;
use crate::engine::error::Error;

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(millis)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1_000))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Zero when `earlier` is actually later, i.e. the clock went backwards.
    pub fn millis_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    pub fn add_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub count: u64,
    pub rate: Duration,
    pub last_updated: Timestamp,
    pub unlocked: bool,
}

impl Resource {
    pub fn from_blueprint(blueprint: &Blueprint, now: Timestamp) -> Self {
        Self {
            name: blueprint.name.clone(),
            count: blueprint.initial_count,
            rate: blueprint.rate,
            last_updated: now,
            unlocked: blueprint.starts_unlocked(),
        }
    }

    pub fn rate_millis(&self) -> u64 {
        duration_millis(self.rate)
    }

    /// Marks a reconciliation point without ever moving backwards.
    pub(crate) fn touch(&mut self, now: Timestamp) {
        if now > self.last_updated {
            self.last_updated = now;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Exact(u64),
    /// As many as the cost resource can pay for.
    All,
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Quantity::All);
        }
        s.parse::<u64>().map(Quantity::Exact).map_err(|_| {
            Error::InvalidArgument(format!(
                "'{s}' is not a valid quantity, use a positive number or 'all'"
            ))
        })
    }
}

/// Derived gain of an accruing resource, recomputed from current counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRate {
    pub resource: String,
    pub per_period: u64,
    pub period: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceReport {
    pub gained: Vec<(String, u64)>,
    pub unlocked: Vec<String>,
    pub stalled: Vec<String>,
}

impl AdvanceReport {
    pub fn gained_of(&self, name: &str) -> u64 {
        self.gained
            .iter()
            .filter(|(resource, _)| resource == name)
            .map(|(_, gain)| *gain)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.gained.is_empty() && self.unlocked.is_empty() && self.stalled.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub resource: String,
    pub quantity: u64,
    pub cost_resource: String,
    pub spent: u64,
    pub count: u64,
    pub production: Vec<ProductionRate>,
    pub unlocked: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceView {
    pub name: String,
    pub description: String,
    pub count: u64,
    pub unlocked: bool,
}

/// What the cost resource can pay for right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    pub resource: String,
    pub quantity: u64,
    pub cost_resource: String,
    pub total_cost: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub resources: Vec<ResourceView>,
    pub production: Vec<ProductionRate>,
    pub offers: Vec<Offer>,
}
