//! Events emitted by the dispatcher during utterance processing
//!
//! Broadcast to interested observers (currently the main loop, which
//! logs them) so components never need a direct handle on the
//! dispatcher to follow what it is doing.

use serde::{Deserialize, Serialize};

/// Events emitted by the dispatcher as it processes utterances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatcherEvent {
    /// A wake phrase was recognized; the assistant is now listening
    WokeUp {
        /// The utterance that contained the wake phrase
        utterance: String,
    },

    /// The assistant returned to the dormant state
    WentDormant,

    /// A registered command matched and its action ran successfully
    ActionExecuted {
        /// The trigger phrase that matched
        trigger: String,
    },

    /// A registered command matched but its action failed
    ActionFailed {
        /// The trigger phrase that matched
        trigger: String,
    },

    /// An unmatched utterance was answered by the conversation bridge
    ConversationReply,

    /// An unmatched utterance could not be handled at all
    NotUnderstood,

    /// The quit command was executed; the daemon is shutting down
    QuitRequested,
}

impl std::fmt::Display for DispatcherEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatcherEvent::WokeUp { utterance } => write!(f, "WOKE_UP ({})", utterance),
            DispatcherEvent::WentDormant => write!(f, "WENT_DORMANT"),
            DispatcherEvent::ActionExecuted { trigger } => {
                write!(f, "ACTION_EXECUTED ({})", trigger)
            }
            DispatcherEvent::ActionFailed { trigger } => {
                write!(f, "ACTION_FAILED ({})", trigger)
            }
            DispatcherEvent::ConversationReply => write!(f, "CONVERSATION_REPLY"),
            DispatcherEvent::NotUnderstood => write!(f, "NOT_UNDERSTOOD"),
            DispatcherEvent::QuitRequested => write!(f, "QUIT_REQUESTED"),
        }
    }
}
