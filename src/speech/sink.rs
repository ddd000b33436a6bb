//! Spoken-response rendering
//!
//! Every response is printed to the console; audible synthesis is
//! best-effort through an external TTS process and never fails the
//! caller.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::warn;

/// Renders assistant responses; mocked in dispatcher tests
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Render one response. Must never fail.
    async fn speak(&self, text: &str);
}

/// Production sink: console line plus optional TTS subprocess
pub struct Speaker {
    tts_command: Option<Vec<String>>,
}

impl Speaker {
    pub fn new(tts_command: Option<Vec<String>>) -> Self {
        Self { tts_command }
    }

    /// Whether audible output is configured
    pub fn has_audio(&self) -> bool {
        self.tts_command.is_some()
    }
}

#[async_trait]
impl SpeechSink for Speaker {
    async fn speak(&self, text: &str) {
        // The console line is the guaranteed output path.
        println!("assistant: {text}");

        if let Some(command) = &self.tts_command {
            if let Err(e) = synthesize(command, text).await {
                warn!(?e, "speech synthesis failed");
            }
        }
    }
}

/// Pipe the text to the TTS process and wait for it to finish speaking
async fn synthesize(command: &[String], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(&command[0])
        .args(&command[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
    }

    child.wait().await?;
    Ok(())
}
