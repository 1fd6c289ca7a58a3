use crate::config::OverlayConfig;
use crate::error::{OverseerError, Result};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Handle and identity of a freshly spawned overlay engine
#[derive(Debug)]
pub struct SpawnedEngine {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,
}

/// Spawn the overlay engine with separately readable stdout/stderr streams.
///
/// The streams are piped so the monitoring tasks can pattern-match the
/// startup marker and forward engine output line by line.
pub async fn spawn_engine(config: &OverlayConfig, args: &[String]) -> Result<SpawnedEngine> {
    if !config.engine_path.exists() {
        return Err(OverseerError::SpawnError(format!(
            "Engine executable does not exist: {}",
            config.engine_path.display()
        )));
    }

    let mut command = Command::new(&config.engine_path);
    command.args(args);

    if let Some(cwd) = config.working_dir() {
        command.current_dir(cwd);
    }

    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let child = command.spawn().map_err(|e| {
        OverseerError::SpawnError(format!(
            "Failed to start '{}': {}",
            config.engine_path.display(),
            e
        ))
    })?;

    let pid = child.id().ok_or_else(|| {
        OverseerError::SpawnError(format!(
            "Failed to get PID for '{}'",
            config.engine_path.display()
        ))
    })?;

    Ok(SpawnedEngine { child, pid })
}
