use std::collections::HashSet;
use std::time::Duration;

use crate::engine::error::Error;

/// Static description of a resource. Blueprints are never persisted; saves
/// only carry the mutable part of a resource.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub name: String,
    pub description: String,
    pub initial_count: u64,
    pub rate: Duration,
    pub cost: Option<Cost>,
    pub requirement: Option<Requirement>,
    pub production: Option<Production>,
    pub unlock_message: Option<String>,
}

impl Blueprint {
    pub fn new(name: &str, description: &str, initial_count: u64, rate: Duration) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            initial_count,
            rate,
            cost: None,
            requirement: None,
            production: None,
            unlock_message: None,
        }
    }

    pub fn with_cost(mut self, resource: &str, amount: u64) -> Self {
        self.cost = Some(Cost {
            resource: resource.to_string(),
            amount,
        });
        self
    }

    pub fn with_requirement(mut self, resource: &str, at_least: u64, message: &str) -> Self {
        self.requirement = Some(Requirement {
            resource: resource.to_string(),
            at_least,
        });
        self.unlock_message = Some(message.to_string());
        self
    }

    pub fn with_production(mut self, production: Production) -> Self {
        self.production = Some(production);
        self
    }

    pub fn is_purchasable(&self) -> bool {
        self.cost.is_some()
    }

    /// Resources without a gate start unlocked.
    pub fn starts_unlocked(&self) -> bool {
        self.requirement.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cost {
    pub resource: String,
    pub amount: u64,
}

impl Cost {
    pub fn total(&self, quantity: u64) -> Option<u64> {
        self.amount.checked_mul(quantity)
    }

    pub fn affordable(&self, available: u64) -> u64 {
        if self.amount == 0 {
            return 0;
        }
        available / self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub resource: String,
    pub at_least: u64,
}

impl Requirement {
    pub fn is_met(&self, current: u64) -> bool {
        current >= self.at_least
    }
}

/// Gain applied to a resource once per elapsed period: a flat `base` plus
/// `per_unit` for every unit held of each source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Production {
    pub base: u64,
    pub inputs: Vec<Yield>,
}

impl Production {
    pub fn flat(base: u64) -> Self {
        Self {
            base,
            inputs: Vec::new(),
        }
    }

    pub fn from_sources(inputs: Vec<Yield>) -> Self {
        Self { base: 0, inputs }
    }

    pub fn gain_per_period<F>(&self, count_of: F) -> u64
    where
        F: Fn(&str) -> u64,
    {
        self.inputs.iter().fold(self.base, |acc, input| {
            acc.saturating_add(count_of(&input.source).saturating_mul(input.per_unit))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yield {
    pub source: String,
    pub per_unit: u64,
}

impl Yield {
    pub fn new(source: &str, per_unit: u64) -> Self {
        Self {
            source: source.to_string(),
            per_unit,
        }
    }
}

/// Ordered, validated set of blueprints.
#[derive(Debug, Clone)]
pub struct Catalog {
    blueprints: Vec<Blueprint>,
}

impl Catalog {
    pub fn new(blueprints: Vec<Blueprint>) -> Result<Self, Error> {
        let mut names = HashSet::new();
        for blueprint in &blueprints {
            if !names.insert(blueprint.name.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate resource '{}' in catalog",
                    blueprint.name
                )));
            }
            // Saves keep rates in whole milliseconds.
            if blueprint.rate.subsec_nanos() % 1_000_000 != 0 {
                return Err(Error::InvalidArgument(format!(
                    "resource '{}' has a rate finer than one millisecond ({:?})",
                    blueprint.name, blueprint.rate
                )));
            }
        }

        for blueprint in &blueprints {
            let mut references = Vec::new();
            if let Some(cost) = &blueprint.cost {
                if cost.resource == blueprint.name {
                    return Err(Error::InvalidArgument(format!(
                        "resource '{}' cannot be paid for with itself",
                        blueprint.name
                    )));
                }
                references.push(cost.resource.as_str());
            }
            if let Some(requirement) = &blueprint.requirement {
                references.push(requirement.resource.as_str());
            }
            if let Some(production) = &blueprint.production {
                references.extend(production.inputs.iter().map(|i| i.source.as_str()));
            }
            if let Some(missing) = references.into_iter().find(|r| !names.contains(r)) {
                return Err(Error::InvalidArgument(format!(
                    "resource '{}' refers to unknown resource '{}'",
                    blueprint.name, missing
                )));
            }
        }

        Ok(Self { blueprints })
    }

    /// Skips validation; only for catalogs covered by a test.
    pub(crate) fn builtin(blueprints: Vec<Blueprint>) -> Self {
        Self { blueprints }
    }

    pub fn get(&self, name: &str) -> Option<&Blueprint> {
        self.blueprints.iter().find(|b| b.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter()
    }

    pub fn purchasable(&self) -> impl Iterator<Item = &Blueprint> {
        self.blueprints.iter().filter(|b| b.is_purchasable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_per_period_sums_sources() {
        let production = Production {
            base: 3,
            inputs: vec![Yield::new("camp", 1), Yield::new("town", 2)],
        };

        let gain = production.gain_per_period(|name| match name {
            "camp" => 10,
            "town" => 4,
            _ => 0,
        });

        assert_eq!(gain, 21);
    }

    #[test]
    fn test_affordable_with_zero_cost() {
        let cost = Cost {
            resource: "villager".to_string(),
            amount: 0,
        };
        assert_eq!(cost.affordable(1_000), 0);
    }

    #[test]
    fn test_catalog_rejects_unknown_reference() {
        let result = Catalog::new(vec![
            Blueprint::new("camp", "", 1, Duration::from_secs(1)).with_cost("gold", 10),
        ]);

        assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg.contains("gold")));
    }

    #[test]
    fn test_catalog_rejects_sub_millisecond_rate() {
        let result = Catalog::new(vec![Blueprint::new(
            "camp",
            "",
            1,
            Duration::from_micros(1_500),
        )]);
        assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg.contains("millisecond")));

        assert!(
            Catalog::new(vec![Blueprint::new("camp", "", 1, Duration::from_millis(1_500))])
                .is_ok()
        );
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = Catalog::new(vec![
            Blueprint::new("camp", "", 1, Duration::from_secs(1)),
            Blueprint::new("camp", "", 0, Duration::from_secs(1)),
        ]);

        assert!(result.is_err());
    }
}
