//! Reopening a panel when the timer finishes

use tokio::process::Command;
use tracing::{debug, warn};

/// Brings a panel up without waiting for it
pub trait PanelLauncher: Send + Sync {
    fn open(&self);
}

/// Runs a user-supplied shell command, e.g. a terminal running `better-timer panel`
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    pub command: String,
}

impl CommandLauncher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PanelLauncher for CommandLauncher {
    fn open(&self) {
        let command = self.command.clone();
        tokio::spawn(async move {
            if let Err(e) = run_launcher(&command).await {
                warn!("Failed to open panel: {}", e);
            }
        });
    }
}

/// Run the launcher command through `sh -c` and wait for it to exit
pub async fn run_launcher(command: &str) -> Result<(), String> {
    debug!("Opening panel with `{}`", command);
    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .await
        .map_err(|e| format!("Failed to execute launcher: {}", e))?;

    if !status.success() {
        return Err(format!("launcher exited with {}", status));
    }
    Ok(())
}
