// CLI module - User-facing command-line interface

mod output;

use crate::config::OverlayConfig;
use crate::error::{OverseerError, Result};
use crate::events::{ChannelSink, OverlayEvent};
use crate::process::OverlaySupervisor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Extra slack past the engine's own startup timeout before the CLI gives
/// up waiting for a lifecycle event
const EVENT_WAIT_SLACK: Duration = Duration::from_secs(2);

/// Overseer - lifecycle supervisor for the mod-tools overlay engine
#[derive(Parser)]
#[command(name = "overseer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file (TOML or JSON)
    #[arg(short, long, default_value = "overseer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the overlay and keep supervising it until interrupted
    Run,

    /// Start the overlay, wait for startup confirmation, then exit
    Start,

    /// Stop the overlay and its helpers
    Stop,

    /// Stop the overlay and start it again
    Restart,

    /// Show the overlay's liveness and persisted status record
    Status,
}

impl Cli {
    /// Parse arguments, initialize logging, and run the selected command
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        init_tracing();
        cli.execute().await
    }

    async fn execute(&self) -> Result<()> {
        let config = OverlayConfig::from_file(&self.config)?;
        let startup_window = config.startup_timeout() + EVENT_WAIT_SLACK;

        let (sink, mut events) = ChannelSink::new();
        let supervisor = OverlaySupervisor::new(config, Arc::new(sink))?;

        match &self.command {
            Commands::Run => {
                let reply = supervisor.start().await?;
                output::print_start_reply(&reply);
                if !reply.already_running {
                    wait_for_startup(&mut events, reply.pid, startup_window).await?;
                }
                supervise_until_interrupted(&supervisor, &mut events).await
            }

            Commands::Start => {
                let reply = supervisor.start().await?;
                output::print_start_reply(&reply);
                if reply.already_running {
                    return Ok(());
                }
                wait_for_startup(&mut events, reply.pid, startup_window).await
            }

            Commands::Stop => {
                let killed = supervisor.stop().await?;
                drain_events(&mut events);
                if killed {
                    output::print_info("Overlay stopped");
                } else {
                    output::print_info("Overlay was not running");
                }
                Ok(())
            }

            Commands::Restart => {
                let reply = supervisor.restart().await?;
                drain_events(&mut events);
                output::print_start_reply(&reply);
                if reply.already_running {
                    return Ok(());
                }
                wait_for_startup(&mut events, reply.pid, startup_window).await
            }

            Commands::Status => {
                let running = supervisor.is_running();
                let record = supervisor.status().load()?;
                let snapshot = supervisor.registry().snapshot();
                output::print_status(running, &record, snapshot.as_ref());
                Ok(())
            }
        }
    }
}

/// Block until the launch resolves: the started event for `pid` means
/// success, a stopped event for it means the startup failed.
///
/// Events for other pids (sweeps of orphaned instances) are displayed and
/// skipped.
async fn wait_for_startup(
    events: &mut UnboundedReceiver<OverlayEvent>,
    pid: u32,
    window: Duration,
) -> Result<()> {
    loop {
        let event = match timeout(window, events.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Err(OverseerError::Other(
                    "event channel closed before startup resolved".to_string(),
                ));
            }
            Err(_) => {
                return Err(OverseerError::Other(
                    "timed out waiting for startup confirmation".to_string(),
                ));
            }
        };

        if event.pid() != pid {
            debug!("Skipping event for unrelated pid {}", event.pid());
            continue;
        }

        output::print_event(&event);
        return match event {
            OverlayEvent::Started { .. } => Ok(()),
            OverlayEvent::Stopped { error_msg, .. } => Err(OverseerError::Other(format!(
                "overlay failed to start: {}",
                error_msg
            ))),
        };
    }
}

/// Foreground supervision loop: print lifecycle events as they arrive and
/// stop the engine on Ctrl-C
async fn supervise_until_interrupted(
    supervisor: &OverlaySupervisor,
    events: &mut UnboundedReceiver<OverlayEvent>,
) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        output::print_event(&event);
                        if matches!(event, OverlayEvent::Stopped { .. }) {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    output::print_error(&format!("failed to listen for Ctrl-C: {}", e));
                }
                output::print_info("Interrupted, stopping overlay");
                supervisor.stop().await?;

                // Give the monitoring task a moment to report before exiting
                while let Ok(Some(event)) =
                    timeout(Duration::from_millis(500), events.recv()).await
                {
                    output::print_event(&event);
                }
                return Ok(());
            }
        }
    }
}

/// Print any events already queued without blocking
fn drain_events(events: &mut UnboundedReceiver<OverlayEvent>) {
    while let Ok(event) = events.try_recv() {
        output::print_event(&event);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("overseer=info"));

    // try_init: tests and embedders may already have a subscriber installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
