use crate::config::OverlayConfig;
use crate::error::{OverseerError, Result};
use crate::events::{EventSink, OverlayEvent};
use crate::process::probe::ProcessProbe;
use crate::process::registry::{Phase, ProcessRegistry};
use crate::state::StatusStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Stops the supervised engine and any helpers it spawned.
///
/// Termination is an ordered list of independently fallible strategies:
/// the tracked pid first, then every process matching the engine's
/// executable name, then helper shells identified by the launch-script
/// pattern on their command line. Success of any one suffices; confirming
/// none is still treated as "stopped" because the dominant failure mode is
/// a process that is already gone.
#[derive(Clone)]
pub struct TerminationController {
    config: Arc<OverlayConfig>,
    registry: ProcessRegistry,
    probe: Arc<ProcessProbe>,
    status: StatusStore,
    events: Arc<dyn EventSink>,
}

impl TerminationController {
    pub fn new(
        config: Arc<OverlayConfig>,
        registry: ProcessRegistry,
        probe: Arc<ProcessProbe>,
        status: StatusStore,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            registry,
            probe,
            status,
            events,
        }
    }

    /// Stop the engine on behalf of the caller.
    ///
    /// Always resets the registry and the status record and emits the
    /// caller-initiated `overlay-stopped` event before returning. The
    /// returned bool reports whether any kill was confirmed; `false` means
    /// "could not confirm, proceed as if stopped".
    ///
    /// The process-table scans and the status-file write are blocking, so
    /// the whole sequence runs on the blocking thread pool.
    pub async fn stop(&self) -> Result<bool> {
        let controller = self.clone();
        tokio::task::spawn_blocking(move || controller.stop_blocking())
            .await
            .map_err(|e| OverseerError::StopError(format!("stop task failed: {}", e)))?
    }

    fn stop_blocking(&self) -> Result<bool> {
        let pid = self.registry.current_pid();
        info!("Stopping overlay engine (tracked pid: {})", pid);

        let mut killed = false;

        // Strategy 1: the tracked identity
        if pid != 0 {
            self.registry.set_phase(pid, Phase::Stopping);
            if self.probe.kill_pid(pid) {
                info!("Killed engine by tracked pid {}", pid);
                killed = true;
            }
        }

        // Strategy 2: by executable name. Attempted even when the pid kill
        // succeeded, to catch untracked instances and secondary children.
        for orphan in self.probe.pids_by_name(&self.config.engine_name) {
            if self.probe.kill_pid(orphan) {
                info!(
                    "Killed '{}' instance by name (pid {})",
                    self.config.engine_name, orphan
                );
                killed = true;
            }
        }

        // Strategy 3: helper shells hosting the launch script
        for shell in self.probe.pids_by_cmdline(&self.config.launcher_hint) {
            if self.probe.kill_pid(shell) {
                info!("Closed launcher shell (pid {})", shell);
            } else {
                warn!("Failed to close launcher shell (pid {})", shell);
            }
        }

        if !killed {
            warn!("Could not confirm engine termination, treating as already stopped");
        }

        self.registry.reset();

        if let Err(e) = self.status.reset() {
            warn!("Failed to reset status record on stop: {}", e);
        }

        self.events.emit(OverlayEvent::Stopped {
            pid,
            stopped_at: OverlayEvent::timestamp_now(),
            exit_error: false,
            error_msg: "stopped by caller".to_string(),
            exit_code: 0,
        });

        Ok(killed)
    }
}
