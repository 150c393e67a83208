//! Sound output used by the audio helper

use std::{io::Write, path::PathBuf};

use futures::future::{BoxFuture, FutureExt};
use tokio::process::Command;
use tracing::debug;

/// Something that can make the completion sound
pub trait SoundSink: Send + Sync {
    fn play(&self) -> BoxFuture<'_, Result<(), String>>;
}

/// Plays a sound file through an external player such as `paplay`
#[derive(Debug, Clone)]
pub struct CommandSound {
    pub program: String,
    pub file: PathBuf,
}

impl SoundSink for CommandSound {
    fn play(&self) -> BoxFuture<'_, Result<(), String>> {
        async move {
            debug!("Playing {} with {}", self.file.display(), self.program);
            let output = Command::new(&self.program)
                .arg(&self.file)
                .output()
                .await
                .map_err(|e| format!("Failed to execute {}: {}", self.program, e))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(format!("{} failed: {}", self.program, stderr));
            }
            Ok(())
        }
        .boxed()
    }
}

/// Rings the terminal bell on the daemon's stderr
#[derive(Debug, Clone, Default)]
pub struct Bell;

impl SoundSink for Bell {
    fn play(&self) -> BoxFuture<'_, Result<(), String>> {
        async move {
            let mut stderr = std::io::stderr();
            stderr
                .write_all(b"\x07")
                .and_then(|_| stderr.flush())
                .map_err(|e| format!("Failed to ring bell: {}", e))
        }
        .boxed()
    }
}
