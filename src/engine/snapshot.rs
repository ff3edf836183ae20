use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blueprint::Catalog;
use crate::engine::Engine;
use crate::engine::error::Error;
use crate::engine::model::{Resource, Timestamp};

/// Bump when the saved layout changes; older versions must stay readable.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    save_id: Uuid,
    saved_at: Timestamp,
    resources: Vec<ResourceRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResourceRecord {
    name: String,
    count: u64,
    rate_ms: u64,
    last_updated: Timestamp,
    #[serde(default)]
    unlocked: bool,
}

impl From<&Resource> for ResourceRecord {
    fn from(resource: &Resource) -> Self {
        Self {
            name: resource.name.clone(),
            count: resource.count,
            rate_ms: resource.rate_millis(),
            last_updated: resource.last_updated,
            unlocked: resource.unlocked,
        }
    }
}

impl Engine {
    /// Serializes the full resource set as a versioned JSON document.
    pub fn snapshot(&self, now: Timestamp) -> Result<Vec<u8>, Error> {
        let save = SaveFile {
            version: SCHEMA_VERSION,
            save_id: self.save_id,
            saved_at: now,
            resources: self.resources.iter().map(ResourceRecord::from).collect(),
        };
        serde_json::to_vec_pretty(&save).map_err(Error::Encode)
    }

    /// Rebuilds an engine from [`Engine::snapshot`] output.
    ///
    /// Catalog resources absent from the save start from their defaults at
    /// `now`; saved resources the catalog no longer knows are dropped.
    pub fn restore(catalog: Catalog, bytes: &[u8], now: Timestamp) -> Result<Self, Error> {
        let header: Header = serde_json::from_slice(bytes)
            .map_err(|e| Error::CorruptState(format!("unreadable save header: {e}")))?;
        if header.version == 0 || header.version > SCHEMA_VERSION {
            return Err(Error::CorruptState(format!(
                "unsupported save version {} (this build reads up to {})",
                header.version, SCHEMA_VERSION
            )));
        }

        let save: SaveFile = serde_json::from_slice(bytes)
            .map_err(|e| Error::CorruptState(format!("unreadable save: {e}")))?;

        let mut seen = HashSet::new();
        for record in &save.resources {
            if !seen.insert(record.name.as_str()) {
                return Err(Error::CorruptState(format!(
                    "resource '{}' saved twice",
                    record.name
                )));
            }
            if catalog.get(&record.name).is_none() {
                tracing::warn!(resource = %record.name, "Dropping unknown resource from save");
            }
        }

        let resources = catalog
            .iter()
            .map(|blueprint| {
                match save.resources.iter().find(|r| r.name == blueprint.name) {
                    Some(record) => Resource {
                        name: record.name.clone(),
                        count: record.count,
                        rate: Duration::from_millis(record.rate_ms),
                        last_updated: record.last_updated,
                        unlocked: record.unlocked || blueprint.starts_unlocked(),
                    },
                    None => {
                        tracing::info!(
                            resource = %blueprint.name,
                            "Resource missing from save, using defaults"
                        );
                        Resource::from_blueprint(blueprint, now)
                    }
                }
            })
            .collect();

        tracing::debug!(
            save_id = %save.save_id,
            saved_at = save.saved_at.as_millis(),
            "Restored saved state"
        );

        Ok(Self {
            catalog,
            resources,
            save_id: save.save_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::catalog::{CAMP, TOWN, VILLAGER};
    use crate::blueprint::cividler;
    use crate::engine::model::Quantity;
    use crate::engine::tests::engine_with;

    #[test]
    fn test_restore_reproduces_populated_state() {
        let mut engine = engine_with(&[(VILLAGER, 9_000), (CAMP, 499)], Timestamp::from_secs(0));
        engine.advance(Timestamp::from_millis(3_456));
        engine
            .purchase(CAMP, Quantity::Exact(1), Timestamp::from_secs(4))
            .unwrap();
        engine
            .purchase(TOWN, Quantity::Exact(2), Timestamp::from_secs(5))
            .unwrap();

        let bytes = engine.snapshot(Timestamp::from_secs(6)).unwrap();
        let restored = Engine::restore(cividler(), &bytes, Timestamp::from_secs(7)).unwrap();

        assert_eq!(restored.resources(), engine.resources());
        assert_eq!(restored.save_id(), engine.save_id());
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let result = Engine::restore(cividler(), b"\x00\x01not json", Timestamp::from_secs(0));
        assert!(matches!(result, Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_restore_rejects_newer_version() {
        let bytes = br#"{"version": 99, "save_id": "00000000-0000-0000-0000-000000000000",
            "saved_at": 0, "resources": []}"#;

        let result = Engine::restore(cividler(), bytes, Timestamp::from_secs(0));

        assert!(matches!(result, Err(Error::CorruptState(msg)) if msg.contains("99")));
    }

    #[test]
    fn test_restore_rejects_duplicate_records() {
        let bytes = br#"{"version": 1, "save_id": "00000000-0000-0000-0000-000000000000",
            "saved_at": 0, "resources": [
                {"name": "camp", "count": 1, "rate_ms": 1000, "last_updated": 0},
                {"name": "camp", "count": 2, "rate_ms": 1000, "last_updated": 0}
            ]}"#;

        let result = Engine::restore(cividler(), bytes, Timestamp::from_secs(0));

        assert!(matches!(result, Err(Error::CorruptState(_))));
    }

    #[test]
    fn test_restore_fills_missing_and_drops_unknown() {
        let bytes = br#"{"version": 1, "save_id": "00000000-0000-0000-0000-000000000000",
            "saved_at": 0, "resources": [
                {"name": "villager", "count": 42, "rate_ms": 1000, "last_updated": 5000},
                {"name": "flint", "count": 7, "rate_ms": 3000, "last_updated": 0}
            ]}"#;

        let engine = Engine::restore(cividler(), bytes, Timestamp::from_secs(9)).unwrap();

        assert_eq!(engine.count(VILLAGER), 42);
        assert_eq!(engine.count(CAMP), 1);
        assert_eq!(
            engine.resource(CAMP).unwrap().last_updated,
            Timestamp::from_secs(9)
        );
        assert!(engine.resource("flint").is_none());
        assert!(!engine.is_unlocked(TOWN));
    }
}
