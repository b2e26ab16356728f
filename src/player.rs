use std::collections::BTreeMap;
use std::process::Stdio;

use itertools::Itertools;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::PlayerConfig;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("failed to launch player '{0}': {1}")]
    LaunchError(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Request headers the stream host expects, if any
    pub extra_headers: Option<BTreeMap<String, String>>,
}

/// Playback collaborator: shows the stream at `url`
pub trait Player {
    fn render(&mut self, url: &str, options: &PlaybackOptions) -> Result<(), PlayerError>;

    /// Stop whatever is currently playing. A no-op when nothing is.
    fn stop(&mut self);
}

/// Plays streams in an external program (mpv, vlc, ...), one at a time
pub struct CommandPlayer {
    command: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            child: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_playing(&self) -> bool {
        self.child.is_some()
    }
}

/// Player arguments for `url`, translating headers into the player's own flags
pub fn build_args(
    command: &str,
    args: &[String],
    url: &str,
    options: &PlaybackOptions,
) -> Vec<String> {
    let mut out = Vec::new();
    let headers = options.extra_headers.as_ref().filter(|h| !h.is_empty());

    if command.contains("mpv") {
        out.push("--force-seekable=yes".to_string());
        if let Some(headers) = headers {
            let fields = headers
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .join(",");
            out.push(format!("--http-header-fields={}", fields));
        }
    } else if command.contains("vlc") {
        if let Some(referer) = headers.and_then(|h| h.get("referer")) {
            out.push(format!("--http-referrer={}", referer));
        }
    } else if headers.is_some() {
        warn!(command, "player does not support request headers, stream may refuse");
    }

    out.extend(args.iter().cloned());
    out.push(url.to_string());
    out
}

impl Player for CommandPlayer {
    fn render(&mut self, url: &str, options: &PlaybackOptions) -> Result<(), PlayerError> {
        self.stop();

        let args = build_args(&self.command, &self.args, url, options);
        info!(player = %self.command, url, "launching player");

        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::LaunchError(self.command.clone(), e.to_string()))?;

        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            info!(player = %self.command, "stopping player");
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "player already exited");
            }
        }
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
