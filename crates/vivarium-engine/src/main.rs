//! Engine binary for the Vivarium simulation.
//!
//! This is the main entry point that wires together the caretaker, the
//! poll cadences, the operator console, and the notification log. It
//! loads configuration, restores persisted state, catches up on the time
//! that passed while the engine was stopped, and then polls the channels
//! until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `vivarium-config.yaml`
//! 3. Open the file store under `storage.data_dir`
//! 4. Open the caretaker over the system wall clock
//! 5. Pin the virtual clock if `clock.virtual_time` is set
//! 6. Run the unified check to catch up on downtime
//! 7. Poll the fast and slow channel groups, serve console commands,
//!    and log notifications until `quit` or Ctrl-C

mod console;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vivarium_core::{Caretaker, ChannelKind, SystemWallClock, VivariumConfig};
use vivarium_store::FileStore;

use crate::console::Flow;
use crate::error::EngineError;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, storage, or the clock cannot be
/// initialized.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("vivarium-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    let fast_every = Duration::from_secs(config.engine.poll_interval_secs.max(1));
    let slow_every = Duration::from_secs(config.engine.sleep_poll_interval_secs.max(1));
    info!(
        data_dir = %config.storage.data_dir.display(),
        poll_interval_secs = config.engine.poll_interval_secs,
        sleep_poll_interval_secs = config.engine.sleep_poll_interval_secs,
        seeded = config.engine.seed.is_some(),
        "Configuration loaded"
    );

    // 3. Open the store.
    let store = FileStore::open(&config.storage.data_dir).map_err(EngineError::from)?;

    // 4. Open the caretaker.
    let virtual_time = config.clock.virtual_time.clone();
    let mut caretaker = Caretaker::open(Box::new(store), Arc::new(SystemWallClock), config)
        .map_err(EngineError::from)?;

    // 5. Pin the virtual clock. A persisted offset wins so that restarts
    //    do not rewind time.
    if let Some(at) = virtual_time.as_deref() {
        if caretaker.clock().is_virtual() {
            debug!("Persisted virtual offset kept; clock.virtual_time ignored");
        } else {
            let now = caretaker
                .operator()
                .set_virtual_time_str(at)
                .map_err(EngineError::from)?;
            info!(now = %now, "Virtual clock pinned from config");
        }
    }

    // 6. Catch up on downtime.
    let mut notifications = caretaker.subscribe();
    let caught_up = caretaker.check_all();
    info!(
        now = %caretaker.now(),
        notifications = caught_up.len(),
        pet_present = caretaker.pet().is_present(),
        "Startup catch-up complete"
    );

    // 7. Run the poll loop.
    run(&mut caretaker, &mut notifications, fast_every, slow_every).await;

    info!(now = %caretaker.now(), "vivarium-engine shutdown complete");
    Ok(())
}

/// Poll the channel groups, serve the console, and log notifications
/// until `quit`, end of input plus Ctrl-C, or Ctrl-C alone.
async fn run(
    caretaker: &mut Caretaker,
    notifications: &mut tokio::sync::broadcast::Receiver<vivarium_types::Notification>,
    fast_every: Duration,
    slow_every: Duration,
) {
    let mut fast = tokio::time::interval(fast_every);
    let mut slow = tokio::time::interval(slow_every);
    // The first tick completes immediately; startup already ran a check.
    fast.tick().await;
    slow.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut console_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering poll loop; type `help` for console commands");

    loop {
        tokio::select! {
            _ = fast.tick() => {
                let notes = caretaker.poll_group(ChannelKind::FAST);
                debug!(notifications = notes.len(), "Fast poll");
            }
            _ = slow.tick() => {
                let notes = caretaker.poll_group(ChannelKind::SLOW);
                debug!(notifications = notes.len(), "Slow poll");
            }
            result = notifications.recv() => {
                match result {
                    Ok(note) => {
                        info!(origin = ?note.origin, at = %note.at, "{}", note.message);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Notification log lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            line = lines.next_line(), if console_open => {
                match line {
                    Ok(Some(line)) => {
                        if handle_line(caretaker, &line) == Flow::Quit {
                            info!("Quit requested");
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("stdin closed; console disabled");
                        console_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read failed; console disabled");
                        console_open = false;
                    }
                }
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupt received");
                break;
            }
        }
    }
}

/// Parse and execute one console line, reporting failures without
/// stopping the engine.
fn handle_line(caretaker: &mut Caretaker, line: &str) -> Flow {
    if line.trim().is_empty() {
        return Flow::Continue;
    }
    let command = match console::parse(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Console command rejected");
            return Flow::Continue;
        }
    };
    let mut out = std::io::stdout().lock();
    match console::execute(caretaker, command, &mut out) {
        Ok(flow) => flow,
        Err(e) => {
            warn!(error = %e, "Console command failed");
            Flow::Continue
        }
    }
}

/// Load the configuration from `vivarium-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<VivariumConfig, EngineError> {
    let config_path = Path::new("vivarium-config.yaml");
    if !config_path.exists() {
        info!("Config file not found, using defaults");
    }
    Ok(VivariumConfig::from_file_or_default(config_path)?)
}
