//! Host surfaces driven by the daemon
//!
//! Durable alarms, desktop notifications, the icon badge, sound output and
//! the panel launcher.

pub mod alarms;
pub mod badge;
pub mod launcher;
pub mod notifier;
pub mod sound;

// Re-export main types
pub use alarms::{Alarm, AlarmHost, TokioAlarms};
pub use badge::{BadgeRenderer, BadgeSurface, FileBadge, LogBadge};
pub use launcher::{CommandLauncher, PanelLauncher};
pub use notifier::{LogNotifier, Notification, Notifier, NotifySend};
pub use sound::{Bell, CommandSound, SoundSink};
