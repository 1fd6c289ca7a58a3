use crate::error::{OverseerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overlay engine configuration with all settings for supervising one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Absolute path to the overlay engine executable
    pub engine_path: PathBuf,

    /// Well-known executable name, used for orphan discovery and kill-by-name
    #[serde(default = "default_engine_name")]
    pub engine_name: String,

    /// Game installation directory passed to the engine
    pub game_dir: PathBuf,

    /// Profile directory passed to the engine
    pub profile_dir: PathBuf,

    /// Path of the persisted status record
    pub status_path: PathBuf,

    /// Working directory for the engine (defaults to the engine's directory)
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Stdout substring that confirms the engine finished initializing
    #[serde(default = "default_startup_marker")]
    pub startup_marker: String,

    /// Hard upper bound for the startup confirmation (in seconds)
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,

    /// Command-line substring identifying helper shells spawned by older
    /// launch mechanisms that wrapped the engine in a throwaway script
    #[serde(default = "default_launcher_hint")]
    pub launcher_hint: String,

    /// Settling delay between stop and start during a restart (in milliseconds)
    #[serde(default = "default_restart_settle")]
    pub restart_settle_ms: u64,

    /// Settling delay after an orphan sweep before launching (in milliseconds)
    #[serde(default = "default_orphan_settle")]
    pub orphan_settle_ms: u64,
}

// Default value functions for serde
fn default_engine_name() -> String {
    "mod-tools".to_string()
}

fn default_startup_marker() -> String {
    "Status: Waiting for league match to start".to_string()
}

fn default_startup_timeout() -> u64 {
    15
}

fn default_launcher_hint() -> String {
    "run_overlay".to_string()
}

fn default_restart_settle() -> u64 {
    250
}

fn default_orphan_settle() -> u64 {
    200
}

impl OverlayConfig {
    /// Load a configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<OverlayConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| OverseerError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config: OverlayConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| OverseerError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| OverseerError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?,
            _ => {
                return Err(OverseerError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine_path.as_os_str().is_empty() {
            return Err(OverseerError::MissingConfigField("engine_path".to_string()));
        }

        if self.engine_name.is_empty() {
            return Err(OverseerError::MissingConfigField("engine_name".to_string()));
        }

        if self.game_dir.as_os_str().is_empty() {
            return Err(OverseerError::MissingConfigField("game_dir".to_string()));
        }

        if self.profile_dir.as_os_str().is_empty() {
            return Err(OverseerError::MissingConfigField("profile_dir".to_string()));
        }

        if self.status_path.as_os_str().is_empty() {
            return Err(OverseerError::MissingConfigField("status_path".to_string()));
        }

        if self.startup_marker.is_empty() {
            return Err(OverseerError::MissingConfigField(
                "startup_marker".to_string(),
            ));
        }

        if self.startup_timeout_secs == 0 {
            return Err(OverseerError::InvalidConfig(
                "startup_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Create the directories the supervisor expects to exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.profile_dir).map_err(|e| {
            OverseerError::ConfigError(format!(
                "Failed to create directory {}: {}",
                self.profile_dir.display(),
                e
            ))
        })?;

        if let Some(parent) = self.status_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OverseerError::ConfigError(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    /// Build the argument vector for running the overlay
    pub fn overlay_args(&self) -> Vec<String> {
        vec![
            "runoverlay".to_string(),
            self.profile_dir.display().to_string(),
            format!("--game:{}", self.game_dir.display()),
            "configless".to_string(),
        ]
    }

    /// Working directory for the spawned engine
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.cwd
            .clone()
            .or_else(|| self.engine_path.parent().map(Path::to_path_buf))
    }

    /// Startup confirmation timeout as a Duration
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Restart settling delay as a Duration
    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    /// Orphan sweep settling delay as a Duration
    pub fn orphan_settle(&self) -> Duration {
        Duration::from_millis(self.orphan_settle_ms)
    }
}
