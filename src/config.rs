//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::store::FileStore;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "better-timer")]
#[command(about = "A countdown timer shared by a background daemon and short-lived panels")]
#[command(version)]
pub struct Config {
    /// Timer record location
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Daemon host address
    #[arg(long, global = true, default_value = "127.0.0.1")]
    pub host: String,

    /// Daemon port
    #[arg(short, long, global = true, default_value = "20554")]
    pub port: u16,

    /// Seconds past a deadline before a panel finishes the timer without the daemon
    #[arg(long, global = true, default_value = "2")]
    pub finalize_grace: u64,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the background daemon: alarm, badge, sound and notifications
    Daemon(DaemonArgs),
    /// Open the interactive panel
    Panel,
    /// Start the timer, or resume a paused one
    Start {
        /// Duration as `m:ss` or seconds; ignored when resuming
        input: Option<String>,
    },
    /// Pause the running timer
    Pause,
    /// Start when stopped, pause when running
    Toggle {
        /// Duration as `m:ss` or seconds
        input: Option<String>,
    },
    /// Add time, also while running
    Add {
        /// Amount as `m:ss` or seconds
        amount: String,
    },
    /// Preview a duration on a stopped timer
    Set {
        /// Duration as `m:ss` or seconds
        input: String,
    },
    /// Clear everything back to defaults
    Reset,
    /// Dismiss a finished timer
    New,
    /// Show the timer
    Status {
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DaemonArgs {
    /// Sound played when the timer finishes; rings the terminal bell when unset
    #[arg(long)]
    pub sound_file: Option<PathBuf>,

    /// Player used for the sound file
    #[arg(long, default_value = "paplay")]
    pub sound_command: String,

    /// Write the badge as JSON to this file for status bars
    #[arg(long)]
    pub badge_file: Option<PathBuf>,

    /// Icon shown with the completion notification
    #[arg(long)]
    pub icon: Option<PathBuf>,

    /// Log completions instead of showing desktop notifications
    #[arg(long)]
    pub no_notify: bool,

    /// Shell command that opens a panel when a timer finishes and none is open
    #[arg(long)]
    pub open_panel_command: Option<String>,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL panels use to reach the daemon
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }

    /// Where the timer record lives
    pub fn store_path(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(FileStore::default_path)
    }

    pub fn finalize_grace_ms(&self) -> i64 {
        self.finalize_grace.saturating_mul(1000).min(i64::MAX as u64) as i64
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
