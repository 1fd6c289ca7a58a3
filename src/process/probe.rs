// Liveness probes and process discovery for the overlay engine

use std::sync::{Mutex, MutexGuard, PoisonError};
use sysinfo::{ProcessesToUpdate, System};
use tracing::debug;

#[cfg(unix)]
use nix::sys::signal::{kill, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Inspects running processes: non-destructive pid probes, discovery by
/// executable name, and discovery by command-line pattern.
///
/// The tracked pid can go stale (process replaced, crashed, pid reused)
/// while an untracked engine instance is still alive, so callers combine
/// the pid probe with the name scan.
pub struct ProcessProbe {
    system: Mutex<System>,
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-destructive existence probe for a pid (signal-zero equivalent)
    #[cfg(unix)]
    pub fn pid_alive(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    /// Pids of running processes whose executable name matches exactly,
    /// excluding the current process
    pub fn pids_by_name(&self, name: &str) -> Vec<u32> {
        let own_pid = std::process::id();
        let mut system = self.system();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system
            .processes()
            .iter()
            .filter(|(pid, process)| {
                pid.as_u32() != own_pid && process.name().to_string_lossy() == name
            })
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }

    /// Pids of running processes whose command line contains the pattern,
    /// excluding the current process. Used to find helper shells that host
    /// the engine's launch script.
    pub fn pids_by_cmdline(&self, pattern: &str) -> Vec<u32> {
        let own_pid = std::process::id();
        let mut system = self.system();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system
            .processes()
            .iter()
            .filter(|(pid, process)| {
                pid.as_u32() != own_pid
                    && process
                        .cmd()
                        .iter()
                        .any(|arg| arg.to_string_lossy().contains(pattern))
            })
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }

    /// Send SIGKILL to a pid. Returns false when the signal could not be
    /// delivered, which usually means the process is already gone.
    #[cfg(unix)]
    pub fn kill_pid(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }
        match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => true,
            Err(e) => {
                debug!("kill({}) failed: {}", pid, e);
                false
            }
        }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}
