use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::actor::game::Game;
use crate::actor::model::InternalMessage;
use crate::api::command::{Command, HELP};
use crate::engine::model::{ProductionRate, Status, Timestamp};
use crate::engine::{Error, PurchaseReceipt};

const WELCOME: &str = "Welcome to Cividler! The CLI based idle game.\n\
                       Type \"help\" to see available commands.\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Command,
    EndOfInput,
}

/// Reads commands line by line until `exit` or end of input. Game events
/// (unlocks, persistence trouble) are printed as they arrive.
pub async fn run<R, W>(game: &Game, input: R, mut output: W) -> std::io::Result<ExitReason>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut events = game.subscribe();
    let mut events_open = true;
    let mut lines = input.lines();

    write(&mut output, WELCOME).await?;

    loop {
        let status = game.status(Timestamp::now()).await;
        write(&mut output, &format!("{}Enter command: ", render_counts(&status))).await?;

        let line = loop {
            tokio::select! {
                line = lines.next_line() => break line?,
                event = events.recv(), if events_open => match event {
                    Ok(event) => {
                        if let Some(text) = render_event(&event) {
                            write(&mut output, &format!("\n{text}\n")).await?;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => events_open = false,
                },
            }
        };

        let Some(line) = line else {
            tracing::debug!("End of input");
            return Ok(ExitReason::EndOfInput);
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                write(&mut output, &render_error(&e)).await?;
                continue;
            }
        };
        tracing::debug!(?command, "Command received");

        let reply = match command {
            Command::Buy { resource, quantity } => {
                match game.purchase(&resource, quantity, Timestamp::now()).await {
                    Ok(receipt) => render_receipt(&receipt),
                    Err(e) => render_error(&e),
                }
            }
            Command::Resources => render_resources(&game.status(Timestamp::now()).await),
            Command::Save => match game.save(Timestamp::now()).await {
                Ok(()) => "Game saved.\n".to_string(),
                Err(e) => render_error(&e),
            },
            Command::Reset => match game.reset(Timestamp::now()).await {
                Ok(()) => "Your civilization has been reset.\n".to_string(),
                Err(e) => render_error(&e),
            },
            Command::Help => HELP.to_string(),
            Command::Exit => {
                write(&mut output, "Saving and Exiting the game...\n").await?;
                return Ok(ExitReason::Command);
            }
        };
        write(&mut output, &reply).await?;
    }
}

async fn write<W>(output: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

fn plural(name: &str) -> String {
    format!("{name}s")
}

fn title(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn describe_period(period: Duration) -> String {
    if period == Duration::from_secs(1) {
        "per second".to_string()
    } else if period.subsec_millis() == 0 {
        format!("every {} seconds", period.as_secs())
    } else {
        format!("every {} ms", period.as_millis())
    }
}

fn render_production(production: &[ProductionRate]) -> String {
    production
        .iter()
        .map(|rate| {
            format!(
                "{} {} {}",
                rate.per_period,
                plural(&rate.resource),
                describe_period(rate.period)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_counts(status: &Status) -> String {
    status
        .resources
        .iter()
        .map(|r| format!("{}: {}\n", title(&plural(&r.name)), r.count))
        .collect()
}

fn render_resources(status: &Status) -> String {
    let mut out = String::from("Resources:\n");
    for resource in &status.resources {
        let lock = if resource.unlocked { "" } else { " (locked)" };
        out.push_str(&format!(
            "|{}|{}|{} {}\n",
            resource.name, resource.count, lock, resource.description
        ));
    }
    if !status.production.is_empty() {
        out.push_str(&format!(
            "Your civilization produces {}.\n",
            render_production(&status.production)
        ));
    }
    for offer in &status.offers {
        out.push_str(&format!(
            "You can buy {} {}(s) for a total cost of {} {}.\n",
            offer.quantity,
            offer.resource,
            offer.total_cost,
            plural(&offer.cost_resource)
        ));
    }
    out
}

fn render_receipt(receipt: &PurchaseReceipt) -> String {
    let mut out = format!(
        "You bought {} new {}(s) for {} {}. You now have {}.",
        receipt.quantity,
        receipt.resource,
        receipt.spent,
        plural(&receipt.cost_resource),
        receipt.count
    );
    if !receipt.production.is_empty() {
        out.push_str(&format!(
            " Your civilization now produces {}.",
            render_production(&receipt.production)
        ));
    }
    out.push('\n');
    out
}

fn render_error(error: &Error) -> String {
    let text = match error {
        Error::InvalidArgument(msg) => format!("Invalid command: {msg}."),
        Error::InsufficientResources {
            resource,
            needed,
            available,
        } => format!(
            "You need at least {needed} {} for that, but you only have {available}.",
            plural(resource)
        ),
        Error::Locked {
            resource,
            requires,
            at_least,
            current,
        } => format!(
            "{} are not available for purchase yet. You need at least {at_least} {} \
             to purchase a {resource} (you have {current})!",
            title(&plural(resource)),
            plural(requires)
        ),
        Error::Persistence(e) => format!(
            "Could not save: {e}. Your progress is kept and saving will be retried."
        ),
        other => other.to_string(),
    };
    format!("{text}\n")
}

fn render_event(event: &InternalMessage) -> Option<String> {
    match event {
        InternalMessage::Unlocked {
            message: Some(message),
            ..
        } => Some(message.clone()),
        InternalMessage::Unlocked { resource, .. } => Some(format!(
            "{} are now available for purchase.",
            title(&plural(resource))
        )),
        InternalMessage::PersistFailed(e) => Some(format!(
            "Warning: saving failed ({e}). Retrying every tick."
        )),
        InternalMessage::PersistRecovered => Some("Saving works again.".to_string()),
        InternalMessage::Stop => None,
    }
}
