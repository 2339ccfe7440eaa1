//! Best-effort playback of answer text through an external speech program.
use crate::config::AudioConfig;
use log::{debug, warn};
use std::io;
use std::process::{Child, Command, Stdio};
use std::thread;

pub trait AudioPlayer: Send + Sync {
    /// Starts playback of `text` and returns immediately. Failures are logged, never returned.
    fn speak(&self, text: &str);
}

/// Runs `command args... text` for every request.
pub struct CommandPlayer {
    command: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    fn spawn(&self, text: &str) -> io::Result<Child> {
        Command::new(&self.command)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

impl AudioPlayer for CommandPlayer {
    fn speak(&self, text: &str) {
        match self.spawn(text) {
            Ok(mut child) => {
                debug!("Speaking {:?} with {} (pid {})", text, self.command, child.id());
                // Reap the child in the background
                thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        warn!("Speech process did not exit cleanly: {}", e);
                    }
                });
            }
            Err(e) => warn!("Failed to start speech command {:?}: {}", self.command, e),
        }
    }
}

pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn speak(&self, text: &str) {
        debug!("Audio disabled, not speaking {:?}", text);
    }
}

pub fn player_from_config(config: &AudioConfig) -> Box<dyn AudioPlayer> {
    if config.enabled && !config.command.is_empty() {
        Box::new(CommandPlayer::new(config.command.clone(), config.args.clone()))
    } else {
        Box::new(SilentPlayer)
    }
}
