//! Ordered trigger-phrase registry
//!
//! Matching is case-normalized substring containment in registration
//! order: the first entry whose trigger occurs anywhere in the
//! utterance wins. Overlapping phrases therefore must be registered
//! most-specific-first.

use super::actions::{CommandAction, SystemAction};

/// One trigger phrase bound to an action
#[derive(Debug, Clone)]
pub struct CommandEntry {
    /// Phrase searched for inside the lowercased utterance
    pub trigger: String,
    /// Action to execute when the phrase matches
    pub action: CommandAction,
}

impl CommandEntry {
    fn new(trigger: &str, action: CommandAction) -> Self {
        Self {
            trigger: trigger.to_lowercase(),
            action,
        }
    }
}

/// Immutable, ordered command vocabulary
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    /// Build a registry from an explicit entry list (used by tests and
    /// alternate vocabularies)
    pub fn new(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    /// The built-in vocabulary
    pub fn default_table() -> Self {
        use CommandAction::System as Sys;
        use SystemAction::*;

        Self::new(vec![
            // Applications
            CommandEntry::new("open notepad", Sys(OpenNotepad)),
            CommandEntry::new("open calculator", Sys(OpenCalculator)),
            CommandEntry::new("open browser", Sys(OpenBrowser)),
            CommandEntry::new("open file explorer", Sys(OpenFileExplorer)),
            CommandEntry::new("open terminal", Sys(OpenTerminal)),
            // Media
            CommandEntry::new("play music", Sys(PlayMusic)),
            CommandEntry::new("stop music", Sys(StopMusic)),
            CommandEntry::new("open spotify", Sys(OpenSpotify)),
            CommandEntry::new("open youtube", Sys(OpenYoutube)),
            // System
            CommandEntry::new("lock computer", Sys(LockComputer)),
            CommandEntry::new("shutdown computer", Sys(ShutdownComputer)),
            CommandEntry::new("restart computer", Sys(RestartComputer)),
            CommandEntry::new("volume up", Sys(VolumeUp)),
            CommandEntry::new("volume down", Sys(VolumeDown)),
            CommandEntry::new("mute", Sys(Mute)),
            // Assistant control
            CommandEntry::new("stop listening", CommandAction::StopListening),
            CommandEntry::new("quit assistant", CommandAction::QuitAssistant),
            CommandEntry::new("help", CommandAction::Help),
        ])
    }

    /// Find the first entry whose trigger occurs in the utterance.
    /// Pure lookup, no side effects.
    pub fn lookup(&self, utterance: &str) -> Option<&CommandEntry> {
        let normalized = utterance.to_lowercase();
        self.entries
            .iter()
            .find(|entry| normalized.contains(&entry.trigger))
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multi-line summary of the vocabulary, for the help command
    pub fn summary(&self) -> String {
        let mut out = String::from("Available commands:\n");
        for entry in &self.entries {
            out.push_str("  - ");
            out.push_str(&entry.trigger);
            out.push('\n');
        }
        out.push_str("You can also ask me questions.");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_exact_phrase() {
        let registry = CommandRegistry::default_table();
        let entry = registry.lookup("open browser").unwrap();
        assert_eq!(entry.action, CommandAction::System(SystemAction::OpenBrowser));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::default_table();
        let entry = registry.lookup("Please OPEN Browser now").unwrap();
        assert_eq!(entry.action, CommandAction::System(SystemAction::OpenBrowser));
    }

    #[test]
    fn test_lookup_substring_containment() {
        let registry = CommandRegistry::default_table();
        let entry = registry.lookup("could you open notepad for me").unwrap();
        assert_eq!(entry.action, CommandAction::System(SystemAction::OpenNotepad));
    }

    #[test]
    fn test_lookup_no_match() {
        let registry = CommandRegistry::default_table();
        assert!(registry.lookup("what is the weather").is_none());
    }

    #[test]
    fn test_first_match_wins_by_registration_order() {
        let registry = CommandRegistry::new(vec![
            CommandEntry::new("volume up loud", CommandAction::System(SystemAction::VolumeUp)),
            CommandEntry::new("volume", CommandAction::System(SystemAction::Mute)),
        ]);
        // Both triggers are contained; the earlier registration wins.
        let entry = registry.lookup("volume up loud please").unwrap();
        assert_eq!(entry.action, CommandAction::System(SystemAction::VolumeUp));
        // Only the shorter trigger is contained here.
        let entry = registry.lookup("volume please").unwrap();
        assert_eq!(entry.action, CommandAction::System(SystemAction::Mute));
    }

    #[test]
    fn test_default_table_vocabulary() {
        let registry = CommandRegistry::default_table();
        assert_eq!(registry.len(), 18);
        for phrase in [
            "open notepad",
            "open calculator",
            "open browser",
            "open file explorer",
            "open terminal",
            "play music",
            "stop music",
            "lock computer",
            "shutdown computer",
            "restart computer",
            "volume up",
            "volume down",
            "mute",
            "stop listening",
            "quit assistant",
            "help",
        ] {
            assert!(registry.lookup(phrase).is_some(), "missing: {phrase}");
        }
    }

    #[test]
    fn test_summary_lists_triggers() {
        let registry = CommandRegistry::default_table();
        let summary = registry.summary();
        assert!(summary.contains("open browser"));
        assert!(summary.contains("quit assistant"));
    }
}
