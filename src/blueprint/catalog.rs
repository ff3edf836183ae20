use std::time::Duration;

use crate::blueprint::model::{Blueprint, Catalog, Production, Yield};

pub const VILLAGER: &str = "villager";
pub const CAMP: &str = "camp";
pub const TOWN: &str = "town";

pub const CAMP_COST: u64 = 50;
pub const TOWN_COST: u64 = 125;
pub const CAMP_YIELD: u64 = 1;
pub const TOWN_YIELD: u64 = 2;
pub const TOWN_CAMP_THRESHOLD: u64 = 500;

fn blueprints() -> Vec<Blueprint> {
    vec![
        Blueprint::new(
            VILLAGER,
            "Villagers help your civilization to grow.",
            0,
            Duration::from_secs(1),
        )
        .with_production(Production::from_sources(vec![
            Yield::new(CAMP, CAMP_YIELD),
            Yield::new(TOWN, TOWN_YIELD),
        ])),
        Blueprint::new(
            CAMP,
            "Camps produce villagers and allow your civilization to grow.",
            1,
            Duration::from_secs(1),
        )
        .with_cost(VILLAGER, CAMP_COST),
        Blueprint::new(
            TOWN,
            "Towns are an advanced way to grow your civilization and produce more villagers.",
            0,
            Duration::from_secs(2),
        )
        .with_cost(VILLAGER, TOWN_COST)
        .with_requirement(
            CAMP,
            TOWN_CAMP_THRESHOLD,
            "Your villagers have found clay, and can build bricks with which to create a town. \
             Towns are now available for purchase",
        ),
    ]
}

/// The stock game: villagers bred by camps and towns.
pub fn cividler() -> Catalog {
    Catalog::builtin(blueprints())
}
