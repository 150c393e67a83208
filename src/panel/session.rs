//! Running the panel from a terminal

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::{parse_duration, HttpOutbox, Panel, PanelView};
use crate::{
    config::Command,
    error::{Result, TimerError},
    utils::shutdown_signal,
};

/// Refresh cadence while the panel is open
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const HELP: &str = "keys: s [m:ss] start/pause · p pause · +m:ss add · m:ss set · r reset · n new · q quit";

/// Open the panel, act once, and return what it shows afterwards.
/// Opening reconciles first, so a deadline that passed while every panel
/// was closed is already finished before the command runs.
pub async fn run_command(panel: &Panel, command: &Command) -> Result<PanelView> {
    panel.tick()?;

    let outcome = match command {
        Command::Start { input } => panel.start(input.as_deref().unwrap_or("")).await,
        Command::Pause => panel.pause().await,
        Command::Toggle { input } => panel.toggle(input.as_deref().unwrap_or("")).await,
        Command::Add { amount } => panel.add_time(parse_duration(amount)).await,
        Command::Set { input } => panel.set_input(input),
        Command::Reset => panel.reset(),
        Command::New => panel.new_timer(),
        Command::Status { .. } | Command::Panel | Command::Daemon(_) => panel.view(),
    };

    match outcome {
        Err(e) if e.is_rejection() => {
            info!("{}", e);
            panel.view()
        }
        other => other,
    }
}

/// Keep the panel open: redraw every second, apply keystrokes from stdin,
/// and switch views as soon as the daemon pushes a completion
pub async fn run_interactive(panel: Arc<Panel>, outbox: HttpOutbox) -> Result<()> {
    let (push_tx, mut pushes) = mpsc::channel(8);
    let listener = tokio::spawn(async move {
        if let Err(e) = outbox.forward_events(push_tx).await {
            info!("No live updates from the daemon, polling only: {}", e);
        }
    });

    let mut ticker = interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    println!("{}", HELP);
    loop {
        tokio::select! {
            _ = ticker.tick() => match panel.tick() {
                Ok(Some(view)) => draw(&view),
                Ok(None) => {}
                Err(e) => warn!("Failed to refresh panel: {}", e),
            },
            Some(message) = pushes.recv() => match panel.on_message(message) {
                Ok(Some(view)) => draw(&view),
                Ok(None) => {}
                Err(e) => warn!("Failed to apply push: {}", e),
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_key(&panel, line.trim()).await {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    listener.abort();
    println!();
    Ok(())
}

/// Apply one line of input; returns false when the panel should close
async fn handle_key(panel: &Panel, line: &str) -> bool {
    let outcome = match line {
        "" => return true,
        "q" => return false,
        "p" => panel.pause().await,
        "r" => panel.reset(),
        "n" => panel.new_timer(),
        "s" => panel.toggle("").await,
        _ if line.starts_with("s ") => panel.toggle(&line[2..]).await,
        _ if line.starts_with('+') => panel.add_time(parse_duration(&line[1..])).await,
        _ => panel.set_input(line),
    };

    match outcome {
        Ok(view) => draw(&view),
        Err(e) => report(&e),
    }
    true
}

fn report(error: &TimerError) {
    if error.is_rejection() {
        info!("{}", error);
    } else {
        warn!("{}", error);
    }
}

fn draw(view: &PanelView) {
    if let Err(e) = draw_to(&mut io::stdout(), view) {
        debug!("Failed to draw panel: {}", e);
    }
}

/// Redraw the panel line in place
fn draw_to(out: &mut impl Write, view: &PanelView) -> io::Result<()> {
    write!(out, "\r\x1b[2K{}", view.render())?;
    out.flush()
}
