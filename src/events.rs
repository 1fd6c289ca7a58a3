// Lifecycle event notifications consumed by an external observer (UI layer)

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One-way lifecycle notification emitted by the supervisor.
///
/// Field spellings match the wire payloads the UI layer already consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum OverlayEvent {
    #[serde(rename = "overlay-started")]
    Started {
        pid: u32,
        #[serde(rename = "startedAt")]
        started_at: String,
        message: String,
    },

    #[serde(rename = "overlay-stopped")]
    Stopped {
        pid: u32,
        #[serde(rename = "stoppedAt")]
        stopped_at: String,
        #[serde(rename = "exitError")]
        exit_error: bool,
        #[serde(rename = "errorMsg")]
        error_msg: String,
        #[serde(rename = "exitCode")]
        exit_code: i32,
    },
}

impl OverlayEvent {
    /// Current time formatted the way event payloads carry timestamps
    pub fn timestamp_now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    /// The pid the event refers to
    pub fn pid(&self) -> u32 {
        match self {
            OverlayEvent::Started { pid, .. } | OverlayEvent::Stopped { pid, .. } => *pid,
        }
    }
}

/// Notification channel to an external observer. Emission must never block:
/// the producer side runs inside the monitoring tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OverlayEvent);
}

/// Sink backed by an unbounded channel; the consumer drains at its own pace
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OverlayEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OverlayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: OverlayEvent) {
        // A dropped receiver is not an error: the observer went away
        if self.tx.send(event).is_err() {
            warn!("Event observer is gone, dropping lifecycle event");
        }
    }
}

/// Sink that forwards events to the log stream
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: OverlayEvent) {
        match &event {
            OverlayEvent::Started { pid, .. } => {
                info!("overlay-started: pid {}", pid);
            }
            OverlayEvent::Stopped {
                pid,
                exit_error,
                error_msg,
                exit_code,
                ..
            } => {
                if *exit_error {
                    warn!(
                        "overlay-stopped: pid {} exit code {} ({})",
                        pid, exit_code, error_msg
                    );
                } else {
                    info!("overlay-stopped: pid {}", pid);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_started_wire_shape() {
        let event = OverlayEvent::Started {
            pid: 42,
            started_at: "2024-01-01T00:00:00Z".to_string(),
            message: "Overlay confirmed running and waiting".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"overlay-started\""));
        assert!(json.contains("\"startedAt\""));
    }

    #[test]
    fn test_stopped_wire_shape() {
        let event = OverlayEvent::Stopped {
            pid: 42,
            stopped_at: "2024-01-01T00:00:00Z".to_string(),
            exit_error: true,
            error_msg: "startup confirmation timeout".to_string(),
            exit_code: -1,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"overlay-stopped\""));
        assert!(json.contains("\"exitError\""));
        assert!(json.contains("\"errorMsg\""));
        assert!(json.contains("\"exitCode\""));
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();

        sink.emit(OverlayEvent::Started {
            pid: 7,
            started_at: OverlayEvent::timestamp_now(),
            message: "ok".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, OverlayEvent::Started { pid: 7, .. }));
    }

    #[tokio::test]
    async fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        // Must not panic or block
        sink.emit(OverlayEvent::Started {
            pid: 7,
            started_at: OverlayEvent::timestamp_now(),
            message: "ok".to_string(),
        });
    }
}
