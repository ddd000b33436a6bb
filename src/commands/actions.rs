//! Action variants and the OS launcher that executes them
//!
//! Control actions (stop listening, quit, help) are handled inside the
//! dispatcher; system actions are forwarded to an [`ActionRunner`],
//! which in production is [`SystemLauncher`] spawning platform-specific
//! subprocesses.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// A registered command resolves to one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Side-effecting OS-level action, executed by the runner
    System(SystemAction),
    /// Return the assistant to the dormant state
    StopListening,
    /// Stop the daemon entirely
    QuitAssistant,
    /// Print and speak the command summary
    Help,
}

/// OS-level actions the launcher knows how to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    OpenNotepad,
    OpenCalculator,
    OpenBrowser,
    OpenFileExplorer,
    OpenTerminal,
    PlayMusic,
    StopMusic,
    OpenSpotify,
    OpenYoutube,
    LockComputer,
    ShutdownComputer,
    RestartComputer,
    VolumeUp,
    VolumeDown,
    Mute,
}

/// Errors from executing a system action
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    #[error("home directory is not set")]
    NoHomeDir,
}

/// Executes system actions; the dispatcher only sees this trait so
/// tests can substitute a recording mock
#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Perform the action, returning the confirmation sentence to speak
    async fn run(&self, action: SystemAction) -> Result<String, ActionError>;
}

/// Production runner spawning platform subprocesses
pub struct SystemLauncher;

impl SystemLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionRunner for SystemLauncher {
    async fn run(&self, action: SystemAction) -> Result<String, ActionError> {
        debug!(?action, "executing system action");
        match action {
            SystemAction::OpenNotepad => {
                if cfg!(target_os = "windows") {
                    spawn("notepad.exe", &[])?;
                } else if cfg!(target_os = "macos") {
                    spawn("open", &["-a", "TextEdit"])?;
                } else {
                    spawn("gedit", &[])?;
                }
                Ok("Notepad opened.".to_string())
            }
            SystemAction::OpenCalculator => {
                if cfg!(target_os = "windows") {
                    spawn("calc.exe", &[])?;
                } else if cfg!(target_os = "macos") {
                    spawn("open", &["-a", "Calculator"])?;
                } else {
                    spawn("gnome-calculator", &[])?;
                }
                Ok("Calculator opened.".to_string())
            }
            SystemAction::OpenBrowser => {
                open_url("https://www.google.com")?;
                Ok("Browser opened.".to_string())
            }
            SystemAction::OpenFileExplorer => {
                if cfg!(target_os = "windows") {
                    spawn("explorer.exe", &[])?;
                } else if cfg!(target_os = "macos") {
                    spawn("open", &["."])?;
                } else {
                    spawn("nautilus", &[])?;
                }
                Ok("File explorer opened.".to_string())
            }
            SystemAction::OpenTerminal => {
                if cfg!(target_os = "windows") {
                    spawn("cmd.exe", &["/C", "start", "cmd.exe"])?;
                } else if cfg!(target_os = "macos") {
                    spawn("open", &["-a", "Terminal"])?;
                } else {
                    spawn("gnome-terminal", &[])?;
                }
                Ok("Terminal opened.".to_string())
            }
            SystemAction::PlayMusic => {
                let music_dir = music_directory()?;
                match find_music_file(&music_dir) {
                    Some(file) => {
                        open_url(&file.to_string_lossy())?;
                        Ok("Music playing.".to_string())
                    }
                    None => Ok("No music files found.".to_string()),
                }
            }
            // Stopping an arbitrary media player needs per-player
            // integration the launcher does not have.
            SystemAction::StopMusic => Ok("Stopping music is not supported yet.".to_string()),
            SystemAction::OpenSpotify => {
                let program = if cfg!(target_os = "windows") {
                    "spotify.exe"
                } else {
                    "spotify"
                };
                if spawn(program, &[]).is_err() {
                    // No local client; the web player still works.
                    open_url("https://open.spotify.com")?;
                }
                Ok("Spotify opened.".to_string())
            }
            SystemAction::OpenYoutube => {
                open_url("https://www.youtube.com")?;
                Ok("YouTube opened.".to_string())
            }
            SystemAction::LockComputer => {
                if cfg!(target_os = "windows") {
                    spawn("rundll32.exe", &["user32.dll,LockWorkStation"])?;
                } else if cfg!(target_os = "macos") {
                    spawn("pmset", &["displaysleepnow"])?;
                } else {
                    spawn("loginctl", &["lock-session"])?;
                }
                Ok("Computer locked.".to_string())
            }
            SystemAction::ShutdownComputer => {
                if cfg!(target_os = "windows") {
                    spawn("shutdown", &["/s", "/t", "60"])?;
                } else {
                    spawn("shutdown", &["-h", "+1"])?;
                }
                Ok("Shutting down the computer in one minute.".to_string())
            }
            SystemAction::RestartComputer => {
                if cfg!(target_os = "windows") {
                    spawn("shutdown", &["/r", "/t", "60"])?;
                } else {
                    spawn("shutdown", &["-r", "+1"])?;
                }
                Ok("Restarting the computer in one minute.".to_string())
            }
            SystemAction::VolumeUp => {
                if cfg!(target_os = "windows") {
                    Ok("Volume control is not supported on Windows.".to_string())
                } else if cfg!(target_os = "macos") {
                    spawn(
                        "osascript",
                        &[
                            "-e",
                            "set volume output volume (output volume of (get volume settings) + 10)",
                        ],
                    )?;
                    Ok("Volume up.".to_string())
                } else {
                    spawn("amixer", &["set", "Master", "5%+"])?;
                    Ok("Volume up.".to_string())
                }
            }
            SystemAction::VolumeDown => {
                if cfg!(target_os = "windows") {
                    Ok("Volume control is not supported on Windows.".to_string())
                } else if cfg!(target_os = "macos") {
                    spawn(
                        "osascript",
                        &[
                            "-e",
                            "set volume output volume (output volume of (get volume settings) - 10)",
                        ],
                    )?;
                    Ok("Volume down.".to_string())
                } else {
                    spawn("amixer", &["set", "Master", "5%-"])?;
                    Ok("Volume down.".to_string())
                }
            }
            SystemAction::Mute => {
                if cfg!(target_os = "windows") {
                    Ok("Volume control is not supported on Windows.".to_string())
                } else if cfg!(target_os = "macos") {
                    spawn("osascript", &["-e", "set volume with output muted"])?;
                    Ok("Muted.".to_string())
                } else {
                    spawn("amixer", &["set", "Master", "toggle"])?;
                    Ok("Muted.".to_string())
                }
            }
        }
    }
}

/// Fire-and-forget spawn with all stdio detached
fn spawn(program: &str, args: &[&str]) -> Result<(), ActionError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ActionError::Launch {
            program: program.to_string(),
            source,
        })?;
    Ok(())
}

/// Open a URL or file path with the platform opener
fn open_url(target: &str) -> Result<(), ActionError> {
    if cfg!(target_os = "windows") {
        spawn("cmd", &["/C", "start", "", target])
    } else if cfg!(target_os = "macos") {
        spawn("open", &[target])
    } else {
        spawn("xdg-open", &[target])
    }
}

fn music_directory() -> Result<PathBuf, ActionError> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE")
    } else {
        std::env::var("HOME")
    }
    .map_err(|_| ActionError::NoHomeDir)?;

    Ok(PathBuf::from(home).join("Music"))
}

/// First `.mp3` or `.wav` file in the directory, if any
fn find_music_file(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("mp3") | Some("wav")
            )
        })
}
