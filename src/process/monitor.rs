use crate::config::OverlayConfig;
use crate::error::{OverseerError, Result};
use crate::events::{EventSink, OverlayEvent};
use crate::process::reader::{drain_stderr, drain_stdout};
use crate::process::registry::{Phase, ProcessRegistry};
use crate::process::spawner::spawn_engine;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Sentinel reported when the real exit code is unknown (killed by signal,
/// startup failure, or a failed wait)
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// Orchestrates one launch of the overlay engine: spawn, startup
/// confirmation race, exit wait, and final reconciliation.
///
/// One launch produces exactly three concurrent tasks: the two stream
/// readers and the watch task below. They cooperate through a one-shot
/// confirmation signal and a join barrier on the readers.
#[derive(Clone)]
pub struct LifecycleMonitor {
    config: Arc<OverlayConfig>,
    registry: ProcessRegistry,
    events: Arc<dyn EventSink>,
}

impl LifecycleMonitor {
    pub fn new(
        config: Arc<OverlayConfig>,
        registry: ProcessRegistry,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            registry,
            events,
        }
    }

    /// Spawn the engine and detach the monitoring task.
    ///
    /// Returns the pid as soon as the process exists; true startup success
    /// is only confirmed later via the `overlay-started` event.
    pub async fn launch(&self, args: Vec<String>) -> Result<u32> {
        let mut spawned = spawn_engine(&self.config, &args).await?;
        let pid = spawned.pid;

        info!("[pid {}] engine launched: {:?}", pid, args);
        self.registry.track(pid);

        let stdout = spawned.child.stdout.take().ok_or_else(|| {
            OverseerError::SpawnError("engine stdout was not captured".to_string())
        })?;
        let stderr = spawned.child.stderr.take().ok_or_else(|| {
            OverseerError::SpawnError("engine stderr was not captured".to_string())
        })?;

        let (confirm_tx, confirm_rx) = oneshot::channel();
        let marker = self.config.startup_marker.clone();

        let stdout_task = tokio::spawn(drain_stdout(stdout, pid, marker, confirm_tx));
        let stderr_task = tokio::spawn(drain_stderr(stderr, pid));

        self.registry.set_phase(pid, Phase::AwaitingConfirmation);

        let monitor = self.clone();
        tokio::spawn(async move {
            monitor
                .watch(spawned.child, pid, confirm_rx, stdout_task, stderr_task)
                .await;
        });

        Ok(pid)
    }

    /// The detached monitoring task: race the confirmation signal against
    /// the startup timeout, then follow the instance to its exit.
    async fn watch(
        self,
        mut child: Child,
        pid: u32,
        confirm: oneshot::Receiver<bool>,
        stdout_task: JoinHandle<()>,
        stderr_task: JoinHandle<()>,
    ) {
        match timeout(self.config.startup_timeout(), confirm).await {
            Ok(Ok(true)) => {}
            Ok(_) => {
                // Confirmed false, or the sender vanished with the reader
                error!(
                    "[pid {}] stdout closed before the startup marker was seen",
                    pid
                );
                self.fail_startup(&mut child, pid, "startup confirmation failed")
                    .await;
                return;
            }
            Err(_) => {
                error!(
                    "[pid {}] timed out after {:?} waiting for startup confirmation",
                    pid,
                    self.config.startup_timeout()
                );
                self.fail_startup(&mut child, pid, "startup confirmation timeout")
                    .await;
                return;
            }
        }

        self.registry.confirm_running(pid);
        info!("[pid {}] overlay confirmed started", pid);
        self.events.emit(OverlayEvent::Started {
            pid,
            started_at: OverlayEvent::timestamp_now(),
            message: "Overlay confirmed running and waiting".to_string(),
        });

        // Block until the process exits, by any cause
        let wait_result = child.wait().await;
        debug!("[pid {}] process wait returned", pid);

        // Join both readers so no late output is lost before the final event
        let _ = stdout_task.await;
        let _ = stderr_task.await;

        let (exit_code, exit_error, error_msg) = translate_exit(&wait_result);
        if exit_error {
            warn!(
                "[pid {}] engine finished with error (exit code {}): {}",
                pid, exit_code, error_msg
            );
        } else {
            info!("[pid {}] engine finished cleanly", pid);
        }

        self.events.emit(OverlayEvent::Stopped {
            pid,
            stopped_at: OverlayEvent::timestamp_now(),
            exit_error,
            error_msg: error_msg.clone(),
            exit_code,
        });

        // The status record is deliberately not rewritten here: it mirrors
        // the last explicit caller intent, not actual liveness
        let error = if error_msg.is_empty() {
            None
        } else {
            Some(error_msg)
        };
        if self.registry.clear_if(pid, Some(exit_code), error) {
            info!("[pid {}] cleared tracked state", pid);
        } else {
            warn!(
                "[pid {}] exited, but a newer instance is tracked; state not cleared",
                pid
            );
        }
    }

    /// Startup failure path: force-kill, wait, emit the failure event, and
    /// clear the registry if this pid is still the tracked one
    async fn fail_startup(&self, child: &mut Child, pid: u32, reason: &str) {
        self.registry.set_phase(pid, Phase::Failed);

        if let Err(e) = child.kill().await {
            debug!("[pid {}] kill after startup failure: {}", pid, e);
        }
        let _ = child.wait().await;

        self.events.emit(OverlayEvent::Stopped {
            pid,
            stopped_at: OverlayEvent::timestamp_now(),
            exit_error: true,
            error_msg: reason.to_string(),
            exit_code: UNKNOWN_EXIT_CODE,
        });

        if self
            .registry
            .clear_if(pid, Some(UNKNOWN_EXIT_CODE), Some(reason.to_string()))
        {
            info!("[pid {}] cleared tracked state after startup failure", pid);
        }
    }
}

/// Translate the outcome of waiting on the engine into the event fields:
/// exit code (or the −1 sentinel when unknown), whether the exit is an
/// error, and a message. Only a clean zero exit with no wait error counts
/// as success.
pub fn translate_exit(result: &std::io::Result<ExitStatus>) -> (i32, bool, String) {
    match result {
        Ok(status) if status.success() => (0, false, String::new()),
        Ok(status) => {
            let code = status.code().unwrap_or(UNKNOWN_EXIT_CODE);
            (code, true, format!("engine exited with {}", status))
        }
        Err(e) => (UNKNOWN_EXIT_CODE, true, format!("wait failed: {}", e)),
    }
}
