//! Foreground typed-input loop
//!
//! Reads lines from stdin and feeds them to the dispatcher as typed
//! utterances, which bypass wake gating entirely. `quit` and `help`
//! are console shorthands for the corresponding registered commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::dispatcher::Utterance;
use crate::events::DispatcherEvent;

/// Translate a console shorthand into its registered trigger phrase
fn expand_shorthand(input: &str) -> &str {
    match input {
        "quit" => "quit assistant",
        other => other,
    }
}

/// Spawn the console loop. It ends on EOF, on a closed dispatcher
/// channel, or when a quit event is observed.
pub fn spawn(
    utterance_tx: mpsc::Sender<Utterance>,
    running: Arc<AtomicBool>,
    mut events: broadcast::Receiver<DispatcherEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();

        info!("console loop started; type 'help' for commands, 'quit' to exit");

        while running.load(Ordering::SeqCst) {
            let line = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(?e, "console read error");
                        break;
                    }
                },
                event = events.recv() => {
                    match event {
                        Ok(DispatcherEvent::QuitRequested) => break,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "console event receiver lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };

            let input = line.trim().to_lowercase();
            if input.is_empty() {
                continue;
            }

            let text = expand_shorthand(&input);
            if utterance_tx.send(Utterance::typed(text)).await.is_err() {
                break;
            }
        }

        info!("console loop stopped");
    })
}
