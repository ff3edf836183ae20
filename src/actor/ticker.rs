use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::actor::game::Game;
use crate::actor::model::InternalMessage;
use crate::engine::model::Timestamp;

/// Advances the whole resource set once per `period` until a stop signal
/// arrives. Missed ticks are not replayed: accrual is driven by wall-clock
/// time, so one late tick catches up on everything.
pub async fn spawn_ticker(
    game: Game,
    period: Duration,
    receiver: tokio::sync::broadcast::Receiver<InternalMessage>,
) {
    let mut rx = receiver;
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;
    tracing::info!(?period, "Ticker started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let (report, persistence) = game.tick(Timestamp::now()).await;
                if !report.is_empty() {
                    tracing::debug!(?report, ?persistence, "Tick");
                }
            }
            signal = rx.recv() => {
                match signal {
                    Ok(InternalMessage::Stop) => {
                        tracing::info!("Ticker received stop signal, exiting...");
                        break;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Ticker lagged behind on messages");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::warn!("Message channel closed, stopping ticker");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("Ticker stopped.");
}
