//! The accrual engine: a resource set reconciled against wall-clock time.
//!
//! The engine does no I/O and takes no locks. Callers own the exclusive
//! access (see [`crate::actor::game::Game`]) and pass `now` explicitly, which
//! keeps every operation deterministic under test.

pub mod accrual;
pub mod error;
pub mod model;
pub mod purchase;
pub mod snapshot;

use uuid::Uuid;

use crate::blueprint::Catalog;
use crate::engine::model::{Offer, ProductionRate, Resource, ResourceView, Status, Timestamp};

pub use error::Error;
pub use model::{AdvanceReport, PurchaseReceipt, Quantity};

#[derive(Debug, Clone)]
pub struct Engine {
    catalog: Catalog,
    // Same order as the catalog.
    resources: Vec<Resource>,
    save_id: Uuid,
}

impl Engine {
    /// Fresh civilization with the catalog's starting values.
    pub fn new(catalog: Catalog, now: Timestamp) -> Self {
        let resources = catalog
            .iter()
            .map(|blueprint| Resource::from_blueprint(blueprint, now))
            .collect();

        Self {
            catalog,
            resources,
            save_id: Uuid::new_v4(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn save_id(&self) -> Uuid {
        self.save_id
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub(crate) fn resource_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    pub fn count(&self, name: &str) -> u64 {
        self.resource(name).map(|r| r.count).unwrap_or(0)
    }

    pub fn is_unlocked(&self, name: &str) -> bool {
        self.resource(name).is_some_and(|r| r.unlocked)
    }

    /// Gain per period of every accruing resource, derived from current counts.
    pub fn production_rates(&self) -> Vec<ProductionRate> {
        self.catalog
            .iter()
            .filter_map(|blueprint| {
                let production = blueprint.production.as_ref()?;
                let resource = self.resource(&blueprint.name)?;
                Some(ProductionRate {
                    resource: resource.name.clone(),
                    per_period: production.gain_per_period(|name| self.count(name)),
                    period: resource.rate,
                })
            })
            .collect()
    }

    /// Flips every gate whose threshold now holds. Gates never close again.
    pub(crate) fn refresh_unlocks(&mut self) -> Vec<String> {
        let mut unlocked = Vec::new();

        for blueprint in self.catalog.iter() {
            let Some(requirement) = &blueprint.requirement else {
                continue;
            };
            let current = self
                .resources
                .iter()
                .find(|r| r.name == requirement.resource)
                .map(|r| r.count)
                .unwrap_or(0);
            if !requirement.is_met(current) {
                continue;
            }

            if let Some(resource) = self
                .resources
                .iter_mut()
                .find(|r| r.name == blueprint.name && !r.unlocked)
            {
                resource.unlocked = true;
                tracing::info!(
                    resource = %resource.name,
                    requires = %requirement.resource,
                    current,
                    "Resource unlocked"
                );
                unlocked.push(resource.name.clone());
            }
        }

        unlocked
    }

    /// Read-only view for display. Does not reconcile; advance first.
    pub fn status(&self) -> Status {
        let resources = self
            .catalog
            .iter()
            .filter_map(|blueprint| {
                let resource = self.resource(&blueprint.name)?;
                Some(ResourceView {
                    name: resource.name.clone(),
                    description: blueprint.description.clone(),
                    count: resource.count,
                    unlocked: resource.unlocked,
                })
            })
            .collect();

        let offers = self
            .catalog
            .purchasable()
            .filter(|blueprint| self.is_unlocked(&blueprint.name))
            .filter_map(|blueprint| {
                let cost = blueprint.cost.as_ref()?;
                let quantity = cost.affordable(self.count(&cost.resource));
                if quantity == 0 {
                    return None;
                }
                Some(Offer {
                    resource: blueprint.name.clone(),
                    quantity,
                    cost_resource: cost.resource.clone(),
                    total_cost: cost.total(quantity)?,
                })
            })
            .collect();

        Status {
            resources,
            production: self.production_rates(),
            offers,
        }
    }
}
