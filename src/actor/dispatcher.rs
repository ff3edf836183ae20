use std::time::Duration;

use crate::actor::game::Game;
use crate::actor::model::InternalMessage;
use crate::actor::ticker::spawn_ticker;
use crate::engine::Error;
use crate::engine::model::Timestamp;

const TICKER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the background ticker and the shutdown sequence.
pub struct Dispatcher {
    game: Game,
    period: Duration,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(game: Game, period: Duration) -> Self {
        Self {
            game,
            period,
            task_handle: None,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<InternalMessage> {
        self.game.subscribe()
    }

    pub fn send(
        &self,
        msg: InternalMessage,
    ) -> Result<usize, tokio::sync::broadcast::error::SendError<InternalMessage>> {
        self.game.sender().send(msg)
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("Ticker already running");
            return;
        }

        let rx = self.subscribe();
        self.task_handle = Some(tokio::spawn(spawn_ticker(
            self.game.clone(),
            self.period,
            rx,
        )));
    }

    /// Stops the ticker, waits for it, then writes one final snapshot. The
    /// final save takes the engine lock, so in-flight commands finish first.
    pub async fn stop(&mut self) -> Result<(), Error> {
        tracing::info!("Initiating graceful shutdown...");

        let _ = self.send(InternalMessage::Stop);

        if let Some(mut task_handle) = self.task_handle.take() {
            tracing::info!("Waiting for ticker to finish...");

            match tokio::time::timeout(TICKER_STOP_TIMEOUT, &mut task_handle).await {
                Ok(Ok(())) => tracing::info!("Ticker finished gracefully"),
                Ok(Err(e)) => tracing::warn!("Ticker stopped with error: {:?}", e),
                Err(_) => {
                    tracing::warn!("Ticker timed out, aborting it");
                    task_handle.abort();
                }
            }
        }

        self.game.save(Timestamp::now()).await?;
        tracing::info!("Final state saved.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actor::game::SAVE_KEY;
    use crate::blueprint::cividler;
    use crate::engine::Engine;
    use crate::store::{MemoryStore, StateStore};

    #[tokio::test]
    async fn test_stop_saves_final_state() {
        let store = MemoryStore::new();
        let game = Game::new(
            Engine::new(cividler(), Timestamp::now()),
            Arc::new(store.clone()),
            SAVE_KEY,
        );
        let mut dispatcher = Dispatcher::new(game, Duration::from_secs(60));

        dispatcher.start();
        assert!(dispatcher.is_running());

        dispatcher.stop().await.unwrap();

        assert!(!dispatcher.is_running());
        assert_eq!(store.write_count(), 1);
        assert!(store.get(SAVE_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stop_reports_failed_final_save() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let game = Game::new(
            Engine::new(cividler(), Timestamp::now()),
            Arc::new(store),
            SAVE_KEY,
        );
        let mut dispatcher = Dispatcher::new(game, Duration::from_secs(60));
        dispatcher.start();

        let result = dispatcher.stop().await;

        assert!(matches!(result, Err(Error::Persistence(_))));
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_ticker() {
        let game = Game::new(
            Engine::new(cividler(), Timestamp::now()),
            Arc::new(MemoryStore::new()),
            SAVE_KEY,
        );
        let mut dispatcher = Dispatcher::new(game, Duration::from_secs(60));

        dispatcher.start();
        dispatcher.start();

        assert!(dispatcher.is_running());
        dispatcher.stop().await.unwrap();
    }
}
