//! Dispatcher module: the wake state machine
//!
//! All recognized and typed input funnels into one dispatcher task,
//! which serializes command handling by construction.

mod machine;

pub use machine::{Dispatcher, WakeState};

/// Where an utterance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Recognized speech; subject to wake-phrase gating
    Speech,
    /// Typed console input; always treated as command text
    Typed,
}

/// One unit of recognized or typed text delivered to the dispatcher
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub source: InputSource,
}

impl Utterance {
    pub fn speech(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: InputSource::Speech,
        }
    }

    pub fn typed(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: InputSource::Typed,
        }
    }
}
