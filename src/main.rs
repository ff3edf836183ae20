use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cividler::{
    actor::{
        dispatcher::Dispatcher,
        game::{Game, LoadOutcome, SAVE_KEY},
    },
    api::cli,
    blueprint,
    config::Args,
    engine::model::Timestamp,
    instrumentation,
    store::{FileStore, MemoryStore, StateStore},
};

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = instrumentation::init_tracing_subscriber(args.log_format) {
        eprintln!("Failed to set global subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(run(args));
    // Stdin is read on a blocking thread that may still be parked on a read.
    runtime.shutdown_timeout(Duration::from_millis(100));
    code
}

async fn run(args: Args) -> ExitCode {
    tracing::info!("Starting Cividler...");

    let store: Arc<dyn StateStore> = if args.ephemeral {
        tracing::info!("Ephemeral mode, nothing will be saved to disk");
        Arc::new(MemoryStore::new())
    } else {
        match FileStore::open(&args.data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to open data directory: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    let (game, outcome) =
        match Game::load(store, SAVE_KEY, blueprint::cividler(), Timestamp::now()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Failed to load state: {}", e);
                return ExitCode::FAILURE;
            }
        };

    match &outcome {
        LoadOutcome::Fresh => {
            if let Err(e) = game.save(Timestamp::now()).await {
                tracing::error!("Failed to save initial state: {}", e);
            }
        }
        LoadOutcome::Restored { offline } => {
            for (resource, gain) in &offline.gained {
                println!("While you were away your civilization gained {gain} {resource}s.");
            }
        }
        LoadOutcome::Recovered { kept_as, .. } => {
            println!(
                "Your saved civilization could not be read, a new one has been founded. \
                 The old save was kept as '{kept_as}'."
            );
        }
    }

    let mut dispatcher = Dispatcher::new(game, args.tick_period());
    dispatcher.start();

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = cli::run(dispatcher.game(), stdin, stdout) => match result {
            Ok(reason) => tracing::info!(?reason, "Command loop finished"),
            Err(e) => tracing::error!("Terminal I/O failed: {}", e),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
    }

    if let Err(e) = dispatcher.stop().await {
        tracing::error!("Failed to save state on exit: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("All state saved, goodbye.");
    ExitCode::SUCCESS
}
