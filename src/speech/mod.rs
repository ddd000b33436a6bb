//! Speech I/O adapters
//!
//! `source` wraps the external transcriber producing recognized
//! utterances; `sink` renders spoken responses.

mod sink;
mod source;

pub use sink::{Speaker, SpeechSink};
pub use source::{SourceError, SpeechSource};
