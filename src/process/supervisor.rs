use crate::config::OverlayConfig;
use crate::error::{OverseerError, Result};
use crate::events::EventSink;
use crate::process::monitor::LifecycleMonitor;
use crate::process::probe::ProcessProbe;
use crate::process::registry::ProcessRegistry;
use crate::process::terminator::TerminationController;
use crate::state::StatusStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Synchronous reply to a start request. The launch is fire-and-forget:
/// true success is only confirmed later via the `overlay-started` event.
#[derive(Debug, Clone, Serialize)]
pub struct StartReply {
    pub pid: u32,
    pub already_running: bool,
    pub message: String,
}

/// Facade over the supervisor's components, exposing the caller-facing
/// operations: start, stop, restart, and the liveness query.
pub struct OverlaySupervisor {
    config: Arc<OverlayConfig>,
    registry: ProcessRegistry,
    probe: Arc<ProcessProbe>,
    status: StatusStore,
    monitor: LifecycleMonitor,
    terminator: TerminationController,
}

impl OverlaySupervisor {
    /// Build the supervisor, bootstrap its directories, and write the idle
    /// status record (the record mirrors explicit intent from startup on)
    pub fn new(config: OverlayConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        config.ensure_directories()?;

        let config = Arc::new(config);
        let registry = ProcessRegistry::new();
        let probe = Arc::new(ProcessProbe::new());
        let status = StatusStore::new(&config.status_path);
        status.reset()?;

        let monitor = LifecycleMonitor::new(
            Arc::clone(&config),
            registry.clone(),
            Arc::clone(&events),
        );
        let terminator = TerminationController::new(
            Arc::clone(&config),
            registry.clone(),
            Arc::clone(&probe),
            status.clone(),
            events,
        );

        Ok(Self {
            config,
            registry,
            probe,
            status,
            monitor,
            terminator,
        })
    }

    /// Launch the overlay engine.
    ///
    /// An instance that is already confirmed alive short-circuits to an
    /// "already running" success. Orphaned instances of the engine left by
    /// a previous session are swept by name before the new launch.
    pub async fn start(&self) -> Result<StartReply> {
        info!("Start requested");
        self.status.reset()?;

        let tracked = self.registry.current_pid();
        if tracked != 0 {
            if self.probe.pid_alive(tracked) {
                info!("Engine already running with tracked pid {}", tracked);
                return Ok(StartReply {
                    pid: tracked,
                    already_running: true,
                    message: "Overlay is already running".to_string(),
                });
            }
            warn!("Tracked pid {} is gone, clearing stale state", tracked);
            self.registry.reset();
        }

        // The name scan refreshes the process table, which is blocking work
        let probe = Arc::clone(&self.probe);
        let engine_name = self.config.engine_name.clone();
        let orphans = tokio::task::spawn_blocking(move || probe.pids_by_name(&engine_name))
            .await
            .map_err(|e| OverseerError::Other(format!("orphan scan task failed: {}", e)))?;
        if !orphans.is_empty() {
            warn!(
                "Found {} orphaned '{}' process(es), killing before launch",
                orphans.len(),
                self.config.engine_name
            );
            self.terminator.stop().await?;
            tokio::time::sleep(self.config.orphan_settle()).await;
        }

        let pid = self.monitor.launch(self.config.overlay_args()).await?;

        Ok(StartReply {
            pid,
            already_running: false,
            message: "Overlay process started".to_string(),
        })
    }

    /// Stop the engine. `Ok(false)` means no kill could be confirmed, which
    /// callers treat as "already stopped" rather than a hard failure.
    pub async fn stop(&self) -> Result<bool> {
        info!("Stop requested");
        let confirmed = self.terminator.stop().await?;
        if !confirmed {
            warn!("Engine termination not confirmed, proceeding as stopped");
        }
        Ok(confirmed)
    }

    /// Stop, let the OS settle, then start again
    pub async fn restart(&self) -> Result<StartReply> {
        info!("Restart requested");

        match self.terminator.stop().await {
            Ok(true) => {}
            Ok(false) => warn!("Restart: kill not confirmed, starting anyway"),
            Err(e) => warn!("Restart: stop failed ({}), starting anyway", e),
        }

        tokio::time::sleep(self.config.restart_settle()).await;

        self.start().await
    }

    /// Whether an engine instance is alive: the tracked pid is probed
    /// first; a name scan catches untracked instances when the pid is
    /// stale or unset
    pub fn is_running(&self) -> bool {
        let tracked = self.registry.current_pid();
        if tracked != 0 && self.probe.pid_alive(tracked) {
            return true;
        }

        !self.probe.pids_by_name(&self.config.engine_name).is_empty()
    }

    /// The shared registry (read-only use by callers)
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// The persisted status record store
    pub fn status(&self) -> &StatusStore {
        &self.status
    }
}
