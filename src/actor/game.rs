use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast};

use crate::actor::model::{InternalMessage, PersistenceChange};
use crate::blueprint::Catalog;
use crate::engine::model::{Status, Timestamp};
use crate::engine::{AdvanceReport, Engine, Error, PurchaseReceipt, Quantity};
use crate::store::{StateStore, StoreError};

pub const SAVE_KEY: &str = "cividler";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing saved yet.
    Fresh,
    /// Save found; `offline` is what accrued while the game was closed.
    Restored { offline: AdvanceReport },
    /// Save found but unreadable, replaced by defaults. The unreadable bytes
    /// are kept under `kept_as` so the next write cannot destroy them.
    Recovered { reason: String, kept_as: String },
}

/// Store key holding the last save that could not be restored.
pub fn discarded_key(key: &str) -> String {
    format!("{key}-discarded")
}

struct Pending {
    generation: u64,
    bytes: Vec<u8>,
}

/// Shared handle over the engine. Every operation holds the engine lock for
/// its whole duration; store writes happen after the lock is released.
#[derive(Clone)]
pub struct Game {
    engine: Arc<Mutex<Engine>>,
    store: Arc<dyn StateStore>,
    key: String,
    events: broadcast::Sender<InternalMessage>,
    generation: Arc<AtomicU64>,
    written: Arc<Mutex<u64>>,
    failing: Arc<AtomicBool>,
}

impl Game {
    pub fn new(engine: Engine, store: Arc<dyn StateStore>, key: &str) -> Self {
        let (events, _) = broadcast::channel(100);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            store,
            key: key.to_string(),
            events,
            generation: Arc::new(AtomicU64::new(0)),
            written: Arc::new(Mutex::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restores the saved civilization and catches up on offline accrual.
    /// A corrupt save is copied aside and replaced by defaults; a store that
    /// cannot be read, or cannot keep that copy, is an error.
    pub async fn load(
        store: Arc<dyn StateStore>,
        key: &str,
        catalog: Catalog,
        now: Timestamp,
    ) -> Result<(Self, LoadOutcome), Error> {
        let reader = store.clone();
        let read_key = key.to_string();
        let saved = tokio::task::spawn_blocking(move || reader.get(&read_key))
            .await
            .map_err(join_error)??;

        let (engine, outcome) = match saved {
            None => {
                tracing::info!("No saved state found, founding a new civilization");
                (Engine::new(catalog, now), LoadOutcome::Fresh)
            }
            Some(bytes) => match Engine::restore(catalog.clone(), &bytes, now) {
                Ok(mut engine) => {
                    let offline = engine.advance(now);
                    tracing::info!(
                        save_id = %engine.save_id(),
                        offline = ?offline.gained,
                        "Restored saved state"
                    );
                    (engine, LoadOutcome::Restored { offline })
                }
                Err(Error::CorruptState(reason)) => {
                    tracing::error!(%reason, "Discarding corrupt saved state, starting over");
                    let kept_as = discarded_key(key);
                    let writer = store.clone();
                    let backup_key = kept_as.clone();
                    tokio::task::spawn_blocking(move || writer.put(&backup_key, &bytes))
                        .await
                        .map_err(join_error)??;
                    tracing::warn!(key = %kept_as, "Kept a copy of the discarded save");
                    (
                        Engine::new(catalog, now),
                        LoadOutcome::Recovered { reason, kept_as },
                    )
                }
                Err(e) => return Err(e),
            },
        };

        Ok((Self::new(engine, store, key), outcome))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InternalMessage> {
        self.events.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<InternalMessage> {
        self.events.clone()
    }

    /// Copy of the current engine state, for inspection.
    pub async fn engine(&self) -> Engine {
        self.engine.lock().await.clone()
    }

    pub async fn tick(&self, now: Timestamp) -> (AdvanceReport, PersistenceChange) {
        let (report, pending) = {
            let mut engine = self.engine.lock().await;
            let report = engine.advance(now);
            self.announce(&engine, &report.unlocked);
            (report, self.capture(&engine, now))
        };

        let result = match pending {
            Ok(pending) => self.write(pending).await,
            Err(e) => Err(e),
        };
        (report, self.track(&result))
    }

    /// Reconciles, then buys. A failed write after a successful purchase is
    /// left to the next tick.
    pub async fn purchase(
        &self,
        name: &str,
        quantity: Quantity,
        now: Timestamp,
    ) -> Result<PurchaseReceipt, Error> {
        let (receipt, pending) = {
            let mut engine = self.engine.lock().await;
            let report = engine.advance(now);
            self.announce(&engine, &report.unlocked);
            let receipt = engine.purchase(name, quantity, now)?;
            self.announce(&engine, &receipt.unlocked);
            (receipt, self.capture(&engine, now))
        };

        let result = match pending {
            Ok(pending) => self.write(pending).await,
            Err(e) => Err(e),
        };
        self.track(&result);
        Ok(receipt)
    }

    pub async fn status(&self, now: Timestamp) -> Status {
        let mut engine = self.engine.lock().await;
        let report = engine.advance(now);
        self.announce(&engine, &report.unlocked);
        engine.status()
    }

    pub async fn save(&self, now: Timestamp) -> Result<(), Error> {
        let pending = {
            let mut engine = self.engine.lock().await;
            let report = engine.advance(now);
            self.announce(&engine, &report.unlocked);
            self.capture(&engine, now)?
        };

        let result = self.write(pending).await;
        self.track(&result);
        result
    }

    /// Erases progress: defaults are rebuilt and written over the save.
    pub async fn reset(&self, now: Timestamp) -> Result<(), Error> {
        let pending = {
            let mut engine = self.engine.lock().await;
            let catalog = engine.catalog().clone();
            *engine = Engine::new(catalog, now);
            tracing::info!(save_id = %engine.save_id(), "Civilization reset");
            self.capture(&engine, now)?
        };

        let result = self.write(pending).await;
        self.track(&result);
        result
    }

    fn capture(&self, engine: &Engine, now: Timestamp) -> Result<Pending, Error> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Pending {
            generation,
            bytes: engine.snapshot(now)?,
        })
    }

    async fn write(&self, pending: Pending) -> Result<(), Error> {
        let mut written = self.written.lock().await;
        if pending.generation <= *written {
            tracing::trace!(generation = pending.generation, "Newer state already written");
            return Ok(());
        }

        let store = self.store.clone();
        let key = self.key.clone();
        let bytes = pending.bytes;
        tokio::task::spawn_blocking(move || store.put(&key, &bytes))
            .await
            .map_err(join_error)??;

        *written = pending.generation;
        tracing::trace!(generation = pending.generation, "State persisted");
        Ok(())
    }

    fn track(&self, result: &Result<(), Error>) -> PersistenceChange {
        match result {
            Ok(()) => {
                if self.failing.swap(false, Ordering::SeqCst) {
                    tracing::info!("Persistence recovered");
                    let _ = self.events.send(InternalMessage::PersistRecovered);
                    PersistenceChange::Recovered
                } else {
                    PersistenceChange::Unchanged
                }
            }
            Err(e) => {
                if !self.failing.swap(true, Ordering::SeqCst) {
                    tracing::error!(error = %e, "Failed to persist state, retrying on next tick");
                    let _ = self.events.send(InternalMessage::PersistFailed(e.to_string()));
                    PersistenceChange::Failed(e.to_string())
                } else {
                    tracing::debug!(error = %e, "Persistence still failing");
                    PersistenceChange::Unchanged
                }
            }
        }
    }

    fn announce(&self, engine: &Engine, unlocked: &[String]) {
        for resource in unlocked {
            let message = engine
                .catalog()
                .get(resource)
                .and_then(|b| b.unlock_message.clone());
            let _ = self.events.send(InternalMessage::Unlocked {
                resource: resource.clone(),
                message,
            });
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Persistence(StoreError::Unavailable(format!("store task failed: {e}")))
}
