use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

/// Lifecycle phase of the supervised instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Launching,
    AwaitingConfirmation,
    Running,
    Stopping,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Launching => write!(f, "launching"),
            Phase::AwaitingConfirmation => write!(f, "awaiting-confirmation"),
            Phase::Running => write!(f, "running"),
            Phase::Stopping => write!(f, "stopping"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// One run of the overlay engine as tracked by the registry.
///
/// The pid is a last-known identity, distinct from the live process handle
/// held by the monitoring task: a stale pid is a recoverable condition, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedInstance {
    pub pid: u32,
    pub phase: Phase,
    pub started_at: Option<SystemTime>,
}

/// Exit record captured when a tracked instance leaves the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitSummary {
    pub pid: u32,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
    pub stopped_at: SystemTime,
}

#[derive(Debug, Default)]
struct RegistryState {
    instance: Option<TrackedInstance>,
    last_exit: Option<ExitSummary>,
}

/// Shared holder of the at-most-one tracked instance.
///
/// All reads and writes go through one mutex so concurrent actors (the
/// monitoring task and caller-initiated stops) never observe a torn
/// pid/phase pair. The LifecycleMonitor and the TerminationController are
/// the only writers; stream readers never touch it.
#[derive(Clone)]
pub struct ProcessRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // A poisoned lock only means a panicking test thread; the state
        // itself is always internally consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin tracking a freshly spawned instance, replacing any stale entry
    pub fn track(&self, pid: u32) {
        let mut state = self.lock();
        state.instance = Some(TrackedInstance {
            pid,
            phase: Phase::Launching,
            started_at: None,
        });
    }

    /// Update the phase, but only if `pid` is still the tracked instance
    pub fn set_phase(&self, pid: u32, phase: Phase) -> bool {
        let mut state = self.lock();
        match state.instance.as_mut() {
            Some(instance) if instance.pid == pid => {
                instance.phase = phase;
                true
            }
            _ => false,
        }
    }

    /// Transition to Running and record the start time.
    /// Returns the recorded timestamp if `pid` is still tracked.
    pub fn confirm_running(&self, pid: u32) -> Option<SystemTime> {
        let mut state = self.lock();
        match state.instance.as_mut() {
            Some(instance) if instance.pid == pid => {
                let now = SystemTime::now();
                instance.phase = Phase::Running;
                instance.started_at = Some(now);
                Some(now)
            }
            _ => None,
        }
    }

    /// Clear the entry only if `pid` is still the tracked instance, recording
    /// the exit summary. An instance superseded by a newer launch must not
    /// wipe the newer instance's state.
    pub fn clear_if(&self, pid: u32, exit_code: Option<i32>, error: Option<String>) -> bool {
        let mut state = self.lock();
        match &state.instance {
            Some(instance) if instance.pid == pid => {
                state.instance = None;
                state.last_exit = Some(ExitSummary {
                    pid,
                    exit_code,
                    error,
                    stopped_at: SystemTime::now(),
                });
                true
            }
            _ => false,
        }
    }

    /// Unconditionally drop the tracked instance (caller-initiated stop path)
    pub fn reset(&self) {
        let mut state = self.lock();
        state.instance = None;
    }

    /// The tracked pid, or 0 when no instance is tracked
    pub fn current_pid(&self) -> u32 {
        self.lock().instance.as_ref().map_or(0, |i| i.pid)
    }

    /// Snapshot of the tracked instance, if any
    pub fn snapshot(&self) -> Option<TrackedInstance> {
        self.lock().instance.clone()
    }

    /// The most recent exit summary, if an instance has finished
    pub fn last_exit(&self) -> Option<ExitSummary> {
        self.lock().last_exit.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().instance.is_none()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
