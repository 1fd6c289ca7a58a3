// Stream readers draining the engine's stdout and stderr

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Drain the engine's stdout line by line until the stream closes.
///
/// Every line is forwarded at info level. While the local awaiting flag is
/// set, each line is checked for the startup marker; the first match delivers
/// `true` on the one-shot confirmation channel and flips the flag so later
/// occurrences are ignored. If the stream ends before any match, `false` is
/// delivered instead. The channel is consumed by the first delivery; the
/// send never blocks even if the consumer already timed out.
pub async fn drain_stdout<R>(stream: R, pid: u32, marker: String, confirm: oneshot::Sender<bool>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    let mut confirm = Some(confirm);

    debug!("[pid {}] reading stdout", pid);

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                info!("[engine stdout pid {}] {}", pid, line);

                if confirm.is_some() && line.contains(&marker) {
                    info!("[pid {}] startup marker observed", pid);
                    if let Some(tx) = confirm.take() {
                        let _ = tx.send(true);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                // Read errors other than clean closure do not abort monitoring
                warn!("[pid {}] error reading stdout: {}", pid, e);
                break;
            }
        }
    }

    if let Some(tx) = confirm.take() {
        warn!("[pid {}] stdout closed before the startup marker was seen", pid);
        let _ = tx.send(false);
    }

    debug!("[pid {}] stdout reader finished", pid);
}

/// Drain the engine's stderr line by line until the stream closes,
/// forwarding every line at warning level. Carries no confirmation
/// semantics; the monitor awaits its completion so no late output is lost.
pub async fn drain_stderr<R>(stream: R, pid: u32)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();

    debug!("[pid {}] reading stderr", pid);

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                warn!("[engine stderr pid {}] {}", pid, line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("[pid {}] error reading stderr: {}", pid, e);
                break;
            }
        }
    }

    debug!("[pid {}] stderr reader finished", pid);
}
