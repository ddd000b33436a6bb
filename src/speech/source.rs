//! Speech recognition source
//!
//! Wraps an external line-oriented transcriber process: every non-empty
//! line it writes to stdout is forwarded to the dispatcher as one
//! recognized utterance. The forward loop re-checks the running flag on
//! a bounded interval so shutdown is never blocked on the transcriber.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatcher::Utterance;

/// Errors constructing the speech source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no speech recognition backend is configured")]
    RecognitionUnavailable,

    #[error("failed to start transcriber '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
}

/// Background speech listener feeding the dispatcher channel
pub struct SpeechSource;

impl SpeechSource {
    /// Spawn the transcriber process and the forward loop.
    ///
    /// Fails with [`SourceError::RecognitionUnavailable`] when no
    /// transcriber command is configured; the daemon then runs in
    /// text-only mode.
    pub fn start(
        config: &Config,
        utterance_tx: mpsc::Sender<Utterance>,
        running: Arc<AtomicBool>,
    ) -> Result<JoinHandle<()>, SourceError> {
        let command = config
            .transcriber_command
            .as_ref()
            .filter(|parts| !parts.is_empty())
            .ok_or(SourceError::RecognitionUnavailable)?;

        let mut child = Command::new(&command[0])
            .args(&command[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                command: command.join(" "),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SourceError::Spawn {
            command: command.join(" "),
            source: std::io::Error::other("transcriber stdout not captured"),
        })?;

        let poll_interval = config.poll_interval;

        let handle = tokio::spawn(async move {
            // Keep the child alive for the life of the loop; kill_on_drop
            // cleans it up when the task ends.
            let _child = child;
            let mut lines = BufReader::new(stdout).lines();

            info!("speech listener started");

            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                match timeout(poll_interval, lines.next_line()).await {
                    // Poll tick with no utterance; re-check the flag.
                    Err(_) => continue,
                    Ok(Ok(Some(line))) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        debug!(%text, "utterance recognized");
                        if utterance_tx.send(Utterance::speech(text)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Ok(None)) => {
                        warn!("transcriber stream ended, speech input disabled");
                        break;
                    }
                    Ok(Err(e)) => {
                        // Transient read error: skip and keep listening.
                        warn!(?e, "transcriber read error, skipping");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }

            info!("speech listener stopped");
        });

        Ok(handle)
    }
}
