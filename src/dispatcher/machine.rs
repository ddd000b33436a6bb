//! Core wake state machine and command dispatch
//!
//! Consumes utterances from one channel, gates speech input behind the
//! wake-phrase set, matches active input against the command registry,
//! and falls back to the conversation bridge. Because a single task
//! drains the channel, only one utterance is ever mid-handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::commands::{ActionRunner, CommandAction, CommandRegistry};
use crate::conversation::ConversationBridge;
use crate::events::DispatcherEvent;
use crate::speech::SpeechSink;

use super::{InputSource, Utterance};

/// Whether speech input is currently treated as commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WakeState {
    /// Ignoring speech until a wake phrase arrives
    #[default]
    Dormant,
    /// Treating speech as command text
    Active,
}

impl std::fmt::Display for WakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WakeState::Dormant => write!(f, "Dormant"),
            WakeState::Active => write!(f, "Active"),
        }
    }
}

const WAKE_ACK: &str = "Yes, I'm listening.";
const SLEEP_CONFIRM: &str = "I am no longer listening. Say 'assistant' to wake me.";
const FAREWELL: &str = "Goodbye!";
const NOT_UNDERSTOOD: &str = "I did not understand that command. Say 'help' to see what I can do.";
const APOLOGY: &str = "Sorry, I cannot process your request right now.";
const ACTION_FAILED: &str = "I could not perform that action.";
const READY: &str = "Voice assistant ready. Say 'assistant' to wake me.";

/// The dispatcher: wake state, registry, and the response path
pub struct Dispatcher<S, R, B> {
    state: WakeState,
    registry: CommandRegistry,
    wake_phrases: Vec<String>,
    speaker: S,
    runner: R,
    bridge: Option<B>,
    running: Arc<AtomicBool>,
    event_tx: broadcast::Sender<DispatcherEvent>,
}

impl<S, R, B> Dispatcher<S, R, B>
where
    S: SpeechSink,
    R: ActionRunner,
    B: ConversationBridge,
{
    pub fn new(
        registry: CommandRegistry,
        wake_phrases: Vec<String>,
        speaker: S,
        runner: R,
        bridge: Option<B>,
        running: Arc<AtomicBool>,
        event_tx: broadcast::Sender<DispatcherEvent>,
    ) -> Self {
        Self {
            state: WakeState::Dormant,
            registry,
            wake_phrases: wake_phrases.iter().map(|p| p.to_lowercase()).collect(),
            speaker,
            runner,
            bridge,
            running,
            event_tx,
        }
    }

    /// Current wake state
    pub fn state(&self) -> WakeState {
        self.state
    }

    /// Whether the daemon is still supposed to be running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Speak the startup greeting
    pub async fn announce_ready(&self) {
        self.speaker.speak(READY).await;
    }

    /// Drain the utterance channel until the quit action flips the
    /// running flag or every sender is gone
    pub async fn run(&mut self, mut utterance_rx: mpsc::Receiver<Utterance>) {
        info!(state = %self.state, "dispatcher started");

        while self.is_running() {
            match utterance_rx.recv().await {
                Some(utterance) => self.process(utterance).await,
                None => break,
            }
        }

        info!("dispatcher stopped");
    }

    /// Process one utterance; the only entry point for both input loops
    pub async fn process(&mut self, utterance: Utterance) {
        let text = utterance.text.trim().to_lowercase();
        if text.is_empty() {
            return;
        }

        match utterance.source {
            // Typed input is never wake-gated.
            InputSource::Typed => self.handle_command(&text).await,
            InputSource::Speech => match self.state {
                WakeState::Active => self.handle_command(&text).await,
                WakeState::Dormant => self.try_wake(&text).await,
            },
        }
    }

    /// Dormant-state handling: wake on a wake phrase, otherwise drop
    /// the utterance silently. The waking utterance itself is never
    /// treated as a command.
    async fn try_wake(&mut self, text: &str) {
        if !self.wake_phrases.iter().any(|phrase| text.contains(phrase)) {
            debug!(%text, "dormant, utterance discarded");
            return;
        }

        self.state = WakeState::Active;
        info!(%text, "wake phrase recognized");
        self.emit(DispatcherEvent::WokeUp {
            utterance: text.to_string(),
        });
        self.speaker.speak(WAKE_ACK).await;
    }

    /// Command handling: registry first, then the conversation bridge
    async fn handle_command(&mut self, text: &str) {
        let matched = self
            .registry
            .lookup(text)
            .map(|entry| (entry.trigger.clone(), entry.action));

        if let Some((trigger, action)) = matched {
            self.execute(&trigger, action).await;
            return;
        }

        match self.bridge.as_mut() {
            Some(bridge) => match bridge.converse(text).await {
                Ok(reply) => {
                    self.emit(DispatcherEvent::ConversationReply);
                    self.speaker.speak(&reply).await;
                }
                Err(e) => {
                    warn!(%e, "conversation bridge failed");
                    self.speaker.speak(APOLOGY).await;
                }
            },
            None => {
                debug!(%text, "no command match and no bridge");
                self.emit(DispatcherEvent::NotUnderstood);
                self.speaker.speak(NOT_UNDERSTOOD).await;
            }
        }
    }

    /// Execute a matched action. Failures are caught here, logged, and
    /// converted into a spoken failure message.
    async fn execute(&mut self, trigger: &str, action: CommandAction) {
        match action {
            CommandAction::StopListening => {
                self.state = WakeState::Dormant;
                info!("returning to dormant state");
                self.emit(DispatcherEvent::WentDormant);
                self.speaker.speak(SLEEP_CONFIRM).await;
            }
            CommandAction::QuitAssistant => {
                info!("quit requested");
                self.speaker.speak(FAREWELL).await;
                self.emit(DispatcherEvent::QuitRequested);
                self.running.store(false, Ordering::SeqCst);
            }
            CommandAction::Help => {
                println!("{}", self.registry.summary());
                self.emit(DispatcherEvent::ActionExecuted {
                    trigger: trigger.to_string(),
                });
                self.speaker
                    .speak("The command list is printed on the console.")
                    .await;
            }
            CommandAction::System(system_action) => {
                match self.runner.run(system_action).await {
                    Ok(confirmation) => {
                        self.emit(DispatcherEvent::ActionExecuted {
                            trigger: trigger.to_string(),
                        });
                        self.speaker.speak(&confirmation).await;
                    }
                    Err(e) => {
                        error!(%e, %trigger, "action execution failed");
                        self.emit(DispatcherEvent::ActionFailed {
                            trigger: trigger.to_string(),
                        });
                        self.speaker.speak(ACTION_FAILED).await;
                    }
                }
            }
        }
    }

    fn emit(&self, event: DispatcherEvent) {
        debug!(?event, "emitting event");
        // Send only fails when nobody subscribes, which is fine.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::commands::{ActionError, CommandEntry, SystemAction};
    use crate::conversation::BridgeError;

    use super::*;

    /// Records everything spoken
    #[derive(Default)]
    struct MockSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    impl MockSpeaker {
        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSink for &MockSpeaker {
        async fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_string());
        }
    }

    /// Records executed system actions; optionally fails every call
    #[derive(Default)]
    struct MockRunner {
        executed: Mutex<Vec<SystemAction>>,
        fail: bool,
    }

    impl MockRunner {
        fn failing() -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn executed(&self) -> Vec<SystemAction> {
            self.executed.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionRunner for &MockRunner {
        async fn run(&self, action: SystemAction) -> Result<String, ActionError> {
            if self.fail {
                return Err(ActionError::Launch {
                    program: "mock".to_string(),
                    source: std::io::Error::other("boom"),
                });
            }
            self.executed.lock().unwrap().push(action);
            Ok("done".to_string())
        }
    }

    /// Fixed-reply bridge with a turn counter standing in for history
    struct MockBridge {
        fail: bool,
        turns: usize,
    }

    impl MockBridge {
        fn working() -> Self {
            Self {
                fail: false,
                turns: 0,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                turns: 0,
            }
        }
    }

    #[async_trait]
    impl ConversationBridge for MockBridge {
        async fn converse(&mut self, _text: &str) -> Result<String, BridgeError> {
            if self.fail {
                return Err(BridgeError::ModelUnavailable("offline".to_string()));
            }
            self.turns += 2;
            Ok("model reply".to_string())
        }
    }

    type TestDispatcher<'a> = Dispatcher<&'a MockSpeaker, &'a MockRunner, MockBridge>;

    fn dispatcher<'a>(
        speaker: &'a MockSpeaker,
        runner: &'a MockRunner,
        bridge: Option<MockBridge>,
    ) -> (TestDispatcher<'a>, Arc<AtomicBool>) {
        let (event_tx, _) = broadcast::channel(16);
        let running = Arc::new(AtomicBool::new(true));
        let d = Dispatcher::new(
            CommandRegistry::default_table(),
            vec![
                "assistant".to_string(),
                "computer".to_string(),
                "hey assistant".to_string(),
                "hello".to_string(),
            ],
            speaker,
            runner,
            bridge,
            Arc::clone(&running),
            event_tx,
        );
        (d, running)
    }

    #[tokio::test]
    async fn test_starts_dormant() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (d, _) = dispatcher(&speaker, &runner, None);
        assert_eq!(d.state(), WakeState::Dormant);
    }

    #[tokio::test]
    async fn test_dormant_ignores_non_wake_speech() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::speech("open browser")).await;

        assert_eq!(d.state(), WakeState::Dormant);
        assert!(speaker.spoken().is_empty());
        assert!(runner.executed().is_empty());
    }

    #[tokio::test]
    async fn test_wake_phrase_activates_with_single_ack() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::speech("hey assistant")).await;

        assert_eq!(d.state(), WakeState::Active);
        assert_eq!(speaker.spoken(), vec![WAKE_ACK.to_string()]);
    }

    #[tokio::test]
    async fn test_wake_utterance_is_not_a_command() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        // Contains both a wake phrase and a command phrase; only the
        // wake transition may happen on this utterance.
        d.process(Utterance::speech("assistant open browser")).await;

        assert_eq!(d.state(), WakeState::Active);
        assert!(runner.executed().is_empty());
        assert_eq!(speaker.spoken(), vec![WAKE_ACK.to_string()]);
    }

    #[tokio::test]
    async fn test_wake_then_command_scenario() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::speech("assistant")).await;
        d.process(Utterance::speech("open browser")).await;

        assert_eq!(d.state(), WakeState::Active);
        assert_eq!(runner.executed(), vec![SystemAction::OpenBrowser]);
    }

    #[tokio::test]
    async fn test_first_matching_entry_wins() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (event_tx, _) = broadcast::channel(16);
        let registry = CommandRegistry::new(vec![
            CommandEntry {
                trigger: "open browser now".to_string(),
                action: CommandAction::System(SystemAction::OpenBrowser),
            },
            CommandEntry {
                trigger: "open".to_string(),
                action: CommandAction::System(SystemAction::OpenNotepad),
            },
        ]);
        let mut d: Dispatcher<_, _, MockBridge> = Dispatcher::new(
            registry,
            vec!["assistant".to_string()],
            &speaker,
            &runner,
            None,
            Arc::new(AtomicBool::new(true)),
            event_tx,
        );

        d.process(Utterance::typed("open browser now please")).await;

        assert_eq!(runner.executed(), vec![SystemAction::OpenBrowser]);
    }

    #[tokio::test]
    async fn test_typed_input_bypasses_wake_gating() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::typed("help")).await;

        // Still dormant, but help ran anyway.
        assert_eq!(d.state(), WakeState::Dormant);
        assert_eq!(speaker.spoken().len(), 1);
    }

    #[tokio::test]
    async fn test_quit_flips_running_flag() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, running) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::typed("quit assistant")).await;

        assert!(!running.load(Ordering::SeqCst));
        assert_eq!(speaker.spoken(), vec![FAREWELL.to_string()]);
    }

    #[tokio::test]
    async fn test_stop_listening_returns_to_dormant() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, running) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::speech("assistant")).await;
        d.process(Utterance::speech("stop listening")).await;

        assert_eq!(d.state(), WakeState::Dormant);
        // Stopping the listening is not stopping the process.
        assert!(running.load(Ordering::SeqCst));
        assert_eq!(
            speaker.spoken(),
            vec![WAKE_ACK.to_string(), SLEEP_CONFIRM.to_string()]
        );
    }

    #[tokio::test]
    async fn test_action_failure_is_caught_and_spoken() {
        let speaker = MockSpeaker::default();
        let runner = MockRunner::failing();
        let (mut d, running) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::typed("open browser")).await;

        assert!(running.load(Ordering::SeqCst));
        assert_eq!(speaker.spoken(), vec![ACTION_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_unmatched_without_bridge_speaks_not_understood() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, running) = dispatcher(&speaker, &runner, None);

        d.process(Utterance::speech("assistant")).await;
        d.process(Utterance::speech("what is the weather")).await;

        assert!(running.load(Ordering::SeqCst));
        assert_eq!(
            speaker.spoken(),
            vec![WAKE_ACK.to_string(), NOT_UNDERSTOOD.to_string()]
        );
    }

    #[tokio::test]
    async fn test_unmatched_with_bridge_speaks_reply() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, Some(MockBridge::working()));

        d.process(Utterance::typed("what is the weather")).await;

        assert_eq!(speaker.spoken(), vec!["model reply".to_string()]);
        assert_eq!(d.bridge.as_ref().unwrap().turns, 2);
    }

    #[tokio::test]
    async fn test_bridge_failure_speaks_apology_keeps_history() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, Some(MockBridge::failing()));

        d.process(Utterance::typed("what is the weather")).await;

        assert_eq!(speaker.spoken(), vec![APOLOGY.to_string()]);
        assert_eq!(d.bridge.as_ref().unwrap().turns, 0);
    }

    #[tokio::test]
    async fn test_run_exits_after_quit() {
        let (speaker, runner) = (MockSpeaker::default(), MockRunner::default());
        let (mut d, _) = dispatcher(&speaker, &runner, None);

        let (tx, rx) = mpsc::channel(4);
        tx.send(Utterance::typed("quit assistant")).await.unwrap();

        // Sender stays alive; run must still return once the flag flips.
        d.run(rx).await;
        assert!(!d.is_running());
        drop(tx);
    }
}
