// State module - Persisted status record for the overlay engine

use crate::error::{OverseerError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Status value written when no overlay is intentionally running
pub const STATUS_IDLE: &str = "idle";

/// The small persisted record external callers read and write wholesale.
///
/// This is a coarse, durable mirror of the supervisor's intent, not of actual
/// liveness: it is reset at supervisor start and on caller-initiated stop,
/// and deliberately left untouched when the engine exits on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: String,
    #[serde(rename = "isDisabled")]
    pub is_disabled: bool,
}

impl StatusRecord {
    /// The idle record written at start and stop
    pub fn idle() -> Self {
        Self {
            status: STATUS_IDLE.to_string(),
            is_disabled: false,
        }
    }
}

impl Default for StatusRecord {
    fn default() -> Self {
        Self::idle()
    }
}

/// Handles persistence of the status record at a fixed path
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    /// Create a new status store with the given file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the record from disk; a missing file reads as the idle record
    pub fn load(&self) -> Result<StatusRecord> {
        if !self.path.exists() {
            return Ok(StatusRecord::idle());
        }

        let file = File::open(&self.path).map_err(|e| {
            OverseerError::StatusLoadError(format!("Failed to open status file: {}", e))
        })?;

        let reader = BufReader::new(file);

        let record: StatusRecord = serde_json::from_reader(reader).map_err(|e| {
            OverseerError::StatusLoadError(format!("Failed to parse status file: {}", e))
        })?;

        Ok(record)
    }

    /// Save the record to disk with an atomic write
    pub fn save(&self, record: &StatusRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                OverseerError::StatusSaveError(format!("Failed to create status directory: {}", e))
            })?;
        }

        // Write to a temporary file first, then rename over the target
        let temp_path = self.path.with_extension("tmp");

        {
            let file = File::create(&temp_path).map_err(|e| {
                OverseerError::StatusSaveError(format!("Failed to create temp status file: {}", e))
            })?;

            let mut writer = BufWriter::new(file);

            serde_json::to_writer_pretty(&mut writer, record).map_err(|e| {
                OverseerError::StatusSaveError(format!("Failed to serialize status: {}", e))
            })?;

            writer.flush().map_err(|e| {
                OverseerError::StatusSaveError(format!("Failed to flush status file: {}", e))
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            OverseerError::StatusSaveError(format!("Failed to rename temp status file: {}", e))
        })?;

        Ok(())
    }

    /// Write the idle record
    pub fn reset(&self) -> Result<()> {
        self.save(&StatusRecord::idle())
    }

    /// Get the path of the status file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
