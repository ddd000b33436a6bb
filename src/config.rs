//! Configuration loading and management

use std::time::Duration;

use anyhow::Result;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Phrases that wake the assistant from the dormant state
    pub wake_phrases: Vec<String>,

    /// Base URL of the local Ollama server
    pub ollama_url: String,

    /// Model name served by Ollama
    pub ollama_model: String,

    /// Instruction prepended to every conversation prompt
    pub language_instruction: String,

    /// External transcriber command producing one recognized utterance
    /// per stdout line; `None` disables speech input
    pub transcriber_command: Option<Vec<String>>,

    /// External text-to-speech command; text is written to its stdin.
    /// `None` disables audible output
    pub tts_command: Option<Vec<String>>,

    /// How often the listening loop re-checks the running flag
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        let wake_phrases = match std::env::var("ASSISTANT_WAKE_PHRASES") {
            Ok(raw) => parse_phrase_list(&raw),
            Err(_) => default_wake_phrases(),
        };

        let ollama_url = std::env::var("ASSISTANT_OLLAMA_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());

        let ollama_model =
            std::env::var("ASSISTANT_OLLAMA_MODEL").unwrap_or_else(|_| "llama2".to_string());

        let language_instruction = std::env::var("ASSISTANT_LANGUAGE_INSTRUCTION")
            .unwrap_or_else(|_| {
                "Answer naturally and concisely, in the language of the question.".to_string()
            });

        let transcriber_command = std::env::var("ASSISTANT_TRANSCRIBER_CMD")
            .ok()
            .as_deref()
            .and_then(parse_command_line);

        let tts_command = match std::env::var("ASSISTANT_TTS_CMD") {
            Ok(raw) => parse_command_line(&raw),
            Err(_) => default_tts_command(),
        };

        Ok(Self {
            wake_phrases,
            ollama_url,
            ollama_model,
            language_instruction,
            transcriber_command,
            tts_command,
            poll_interval: Duration::from_secs(1),
        })
    }
}

fn default_wake_phrases() -> Vec<String> {
    ["assistant", "computer", "hey assistant", "hello"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Platform default for speech synthesis: `say` on macOS, espeak-ng
/// elsewhere. Windows has no ubiquitous CLI synthesizer, so audible
/// output is opt-in there.
fn default_tts_command() -> Option<Vec<String>> {
    if cfg!(target_os = "macos") {
        Some(vec!["say".to_string()])
    } else if cfg!(target_os = "windows") {
        None
    } else {
        Some(vec!["espeak-ng".to_string(), "--stdin".to_string()])
    }
}

/// Split a comma-separated phrase list, dropping empty entries
fn parse_phrase_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split a command line on whitespace into program + args
fn parse_command_line(raw: &str) -> Option<Vec<String>> {
    let parts: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load_defaults() {
        let config = Config::load().unwrap();
        assert!(config.wake_phrases.contains(&"assistant".to_string()));
        assert!(config.ollama_url.starts_with("http"));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_phrase_list() {
        let phrases = parse_phrase_list("Assistant, hey assistant , ,hello");
        assert_eq!(phrases, vec!["assistant", "hey assistant", "hello"]);
    }

    #[test]
    fn test_parse_command_line() {
        assert_eq!(
            parse_command_line("espeak-ng --stdin"),
            Some(vec!["espeak-ng".to_string(), "--stdin".to_string()])
        );
        assert_eq!(parse_command_line("   "), None);
    }
}
