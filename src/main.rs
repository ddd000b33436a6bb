//! voice-assistantd: desktop voice-command dispatcher daemon
//!
//! Listens continuously for speech through an external transcriber,
//! wakes on a configured wake phrase, matches utterances against a
//! registry of system commands (launch apps, volume, lock/shutdown),
//! and falls back to a local Ollama conversation for everything else.
//! A foreground console loop accepts the same commands as typed text.
//!
//! Speech recognition and the language model are optional: the daemon
//! always comes up and stays operable through the console.

mod commands;
mod config;
mod console;
mod conversation;
mod dispatcher;
mod events;
mod lifecycle;
mod speech;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{CommandRegistry, SystemLauncher};
use crate::config::Config;
use crate::conversation::OllamaBridge;
use crate::dispatcher::Dispatcher;
use crate::events::DispatcherEvent;
use crate::lifecycle::ShutdownSignal;
use crate::speech::{Speaker, SpeechSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "voice-assistant-daemon starting"
    );

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    let running = Arc::new(AtomicBool::new(true));
    let shutdown = ShutdownSignal::new();

    // Channels: both input loops feed the one dispatcher channel;
    // dispatcher events fan out over broadcast.
    let (utterance_tx, utterance_rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel::<DispatcherEvent>(64);

    // Action registry
    let registry = CommandRegistry::default_table();
    info!(commands = registry.len(), "action registry initialized");

    // Speech sink
    let speaker = Speaker::new(config.tts_command.clone());
    if speaker.has_audio() {
        info!("speech synthesis enabled");
    } else {
        warn!("speech synthesis unavailable, responses are console-only");
    }

    // Conversation bridge (optional)
    let bridge = {
        let bridge = OllamaBridge::new(&config);
        match bridge.probe().await {
            Ok(()) => {
                info!(model = %config.ollama_model, "conversation bridge connected");
                Some(bridge)
            }
            Err(e) => {
                warn!(%e, "conversation bridge unavailable, commands-only mode");
                None
            }
        }
    };

    // Speech source (optional): on failure the console remains the
    // only input path.
    match SpeechSource::start(&config, utterance_tx.clone(), Arc::clone(&running)) {
        Ok(_handle) => info!("speech recognition started"),
        Err(e) => warn!(%e, "speech recognition unavailable, continuing in text-only mode"),
    }

    // Console loop
    let console_handle = console::spawn(utterance_tx, Arc::clone(&running), event_tx.subscribe());

    let mut dispatcher = Dispatcher::new(
        registry,
        config.wake_phrases.clone(),
        speaker,
        SystemLauncher::new(),
        bridge,
        Arc::clone(&running),
        event_tx.clone(),
    );

    let mut event_rx = event_tx.subscribe();

    println!("==================================================");
    println!(" VOICE ASSISTANT STARTED");
    println!("  say 'assistant' to wake me");
    println!("  type 'quit' to exit, 'help' for commands");
    println!("==================================================");
    dispatcher.announce_ready().await;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the dispatcher (processes speech and typed utterances)
        _ = dispatcher.run(utterance_rx) => {
            info!("dispatcher exited");
        }

        // Log dispatcher events
        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "dispatcher event");
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("event logger exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
            running.store(false, Ordering::SeqCst);
        }
    }

    // Cleanup
    info!("shutting down...");

    // stdin reads cannot be interrupted portably; drop the console task.
    console_handle.abort();

    info!("voice-assistant-daemon stopped");

    Ok(())
}
