use crate::engine::Engine;
use crate::engine::error::Error;
use crate::engine::model::{PurchaseReceipt, Quantity, Timestamp};

impl Engine {
    /// Buys `quantity` units of `name`, paying with its cost resource.
    ///
    /// Every check runs before the first mutation, so a failed purchase
    /// leaves the whole resource set untouched.
    pub fn purchase(
        &mut self,
        name: &str,
        quantity: Quantity,
        now: Timestamp,
    ) -> Result<PurchaseReceipt, Error> {
        let blueprint = self
            .catalog
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown resource '{name}'")))?;
        let cost = blueprint
            .cost
            .clone()
            .ok_or_else(|| Error::InvalidArgument(format!("{name} cannot be purchased")))?;

        if quantity == Quantity::Exact(0) {
            return Err(Error::InvalidArgument(
                "quantity must be greater than zero".to_string(),
            ));
        }

        if let Some(requirement) = &blueprint.requirement {
            let current = self.count(&requirement.resource);
            if !self.is_unlocked(name) && !requirement.is_met(current) {
                return Err(Error::Locked {
                    resource: name.to_string(),
                    requires: requirement.resource.clone(),
                    at_least: requirement.at_least,
                    current,
                });
            }
        }

        let available = self.count(&cost.resource);
        let quantity = match quantity {
            Quantity::Exact(n) => n,
            Quantity::All => match cost.affordable(available) {
                0 => {
                    return Err(Error::InsufficientResources {
                        resource: cost.resource,
                        needed: cost.amount,
                        available,
                    });
                }
                n => n,
            },
        };

        let total = cost.total(quantity).ok_or_else(|| {
            Error::InvalidArgument(format!("cannot buy {quantity} {name}: cost overflows"))
        })?;
        if available < total {
            return Err(Error::InsufficientResources {
                resource: cost.resource,
                needed: total,
                available,
            });
        }
        let count = self.count(name).checked_add(quantity).ok_or_else(|| {
            Error::InvalidArgument(format!("cannot hold that many {name}"))
        })?;

        if let Some(payer) = self.resource_mut(&cost.resource) {
            payer.count -= total;
            payer.touch(now);
        }
        if let Some(producer) = self.resource_mut(name) {
            producer.count = count;
            producer.unlocked = true;
            producer.touch(now);
        }

        tracing::debug!(
            resource = name,
            quantity,
            spent = total,
            count,
            "Purchase completed"
        );

        let unlocked = self.refresh_unlocks();
        Ok(PurchaseReceipt {
            resource: name.to_string(),
            quantity,
            cost_resource: cost.resource,
            spent: total,
            count,
            production: self.production_rates(),
            unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::blueprint::catalog::{CAMP, TOWN, VILLAGER};
    use crate::engine::error::Error;
    use crate::engine::model::{Quantity, Timestamp};
    use crate::engine::tests::engine_with;

    #[test]
    fn test_purchase_success() {
        let mut engine = engine_with(&[(VILLAGER, 50)], Timestamp::from_secs(0));

        let receipt = engine
            .purchase(CAMP, Quantity::Exact(1), Timestamp::from_secs(5))
            .unwrap();

        assert_eq!(engine.count(VILLAGER), 0);
        assert_eq!(engine.count(CAMP), 2);
        assert_eq!(receipt.count, 2);
        assert_eq!(receipt.spent, 50);
        assert_eq!(receipt.production[0].per_period, 2);
        assert_eq!(
            engine.resource(VILLAGER).unwrap().last_updated,
            Timestamp::from_secs(5)
        );
        assert_eq!(
            engine.resource(CAMP).unwrap().last_updated,
            Timestamp::from_secs(5)
        );
    }

    #[test]
    fn test_purchase_insufficient_resources_leaves_state_untouched() {
        let mut engine = engine_with(&[(VILLAGER, 49)], Timestamp::from_secs(0));
        let before = engine.resources().to_vec();

        let result = engine.purchase(CAMP, Quantity::Exact(1), Timestamp::from_secs(9));

        assert!(matches!(
            result,
            Err(Error::InsufficientResources {
                needed: 50,
                available: 49,
                ..
            })
        ));
        assert_eq!(engine.resources(), before.as_slice());
    }

    #[test]
    fn test_purchase_all() {
        let mut engine = engine_with(&[(VILLAGER, 175)], Timestamp::from_secs(0));

        let receipt = engine
            .purchase(CAMP, Quantity::All, Timestamp::from_secs(1))
            .unwrap();

        assert_eq!(receipt.quantity, 3);
        assert_eq!(engine.count(VILLAGER), 25);
        assert_eq!(engine.count(CAMP), 4);
    }

    #[test]
    fn test_purchase_all_with_nothing_affordable() {
        let mut engine = engine_with(&[(VILLAGER, 10)], Timestamp::from_secs(0));

        let result = engine.purchase(CAMP, Quantity::All, Timestamp::from_secs(1));

        assert!(matches!(
            result,
            Err(Error::InsufficientResources { needed: 50, .. })
        ));
        assert_eq!(engine.count(CAMP), 1);
    }

    #[test]
    fn test_purchase_zero_is_invalid() {
        let mut engine = engine_with(&[(VILLAGER, 500)], Timestamp::from_secs(0));

        let result = engine.purchase(CAMP, Quantity::Exact(0), Timestamp::from_secs(1));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_purchase_unknown_or_unbuyable() {
        let mut engine = engine_with(&[(VILLAGER, 500)], Timestamp::from_secs(0));

        assert!(matches!(
            engine.purchase("castle", Quantity::Exact(1), Timestamp::from_secs(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.purchase(VILLAGER, Quantity::Exact(1), Timestamp::from_secs(1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_purchase_overflowing_quantity() {
        let mut engine = engine_with(&[(VILLAGER, 500)], Timestamp::from_secs(0));

        let result = engine.purchase(CAMP, Quantity::Exact(u64::MAX), Timestamp::from_secs(1));

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(engine.count(VILLAGER), 500);
    }

    #[test]
    fn test_town_locked_until_camp_threshold() {
        let mut engine = engine_with(&[(VILLAGER, 10_000), (CAMP, 499)], Timestamp::from_secs(0));

        let result = engine.purchase(TOWN, Quantity::Exact(1), Timestamp::from_secs(1));
        assert!(matches!(
            result,
            Err(Error::Locked {
                at_least: 500,
                current: 499,
                ..
            })
        ));
        assert_eq!(engine.count(VILLAGER), 10_000);

        let receipt = engine
            .purchase(CAMP, Quantity::Exact(1), Timestamp::from_secs(2))
            .unwrap();
        assert_eq!(receipt.unlocked, vec![TOWN.to_string()]);

        let receipt = engine
            .purchase(TOWN, Quantity::Exact(1), Timestamp::from_secs(3))
            .unwrap();
        assert_eq!(receipt.count, 1);
        assert_eq!(engine.count(VILLAGER), 10_000 - 50 - 125);
        assert_eq!(receipt.production[0].per_period, 500 + 2);
    }

    #[test]
    fn test_unlocked_town_stays_unlocked_when_camps_drop() {
        let mut engine = engine_with(&[(CAMP, 500)], Timestamp::from_secs(0));
        engine.refresh_unlocks();

        engine.resource_mut(CAMP).unwrap().count = 10;
        engine.advance(Timestamp::from_secs(60));

        assert!(engine.is_unlocked(TOWN));
        assert!(
            engine
                .purchase(TOWN, Quantity::Exact(1), Timestamp::from_secs(61))
                .is_ok()
        );
    }
}
