//! Better Timer - a countdown shared by a background daemon and transient panels
//!
//! `better-timer daemon` runs the controller; every other subcommand opens
//! a panel against the same timer record.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use better_timer::{
    audio::AudioBridge,
    config::{Command, Config, DaemonArgs},
    controller::Controller,
    panel::{session, HttpOutbox, Panel},
    services::{
        BadgeRenderer, BadgeSurface, Bell, CommandLauncher, CommandSound, FileBadge, LogBadge,
        LogNotifier, Notification, Notifier, NotifySend, SoundSink, TokioAlarms,
    },
    state::{AppState, TimerRecord},
    store::{FileStore, TimerStore},
    tasks::{alarm_listener_task, alarm_recovery_task, badge_ticker_task},
    utils::{shutdown_signal, Clock, SystemClock},
    api::create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level; stdout belongs to the panel
    tracing_subscriber::fmt()
        .with_env_filter(format!("better_timer={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(FileStore::open(config.store_path())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match &config.command {
        Command::Daemon(args) => run_daemon(&config, args, store, clock).await,
        command => run_panel(&config, command, store, clock).await,
    }
}

async fn run_daemon(
    config: &Config,
    args: &DaemonArgs,
    store: Arc<FileStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    info!("Starting better-timer daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("Timer record: {}", store.path().display());

    if !store.path().exists() {
        store.set(&TimerRecord::new())?;
        info!("Installed default timer record");
    }

    let badge: Box<dyn BadgeSurface> = match &args.badge_file {
        Some(path) => Box::new(FileBadge::new(path.clone())),
        None => Box::new(LogBadge),
    };
    let state = Arc::new(AppState::new(
        store,
        Arc::clone(&clock),
        BadgeRenderer::new(badge),
        config.port,
        config.host.clone(),
    ));
    state.repair_store()?;

    let sound: Arc<dyn SoundSink> = match &args.sound_file {
        Some(file) => Arc::new(CommandSound {
            program: args.sound_command.clone(),
            file: file.clone(),
        }),
        None => Arc::new(Bell),
    };
    let notifier: Arc<dyn Notifier> = if args.no_notify {
        Arc::new(LogNotifier)
    } else {
        Arc::new(NotifySend)
    };
    let (alarms, fired) = TokioAlarms::new(clock);

    let mut controller = Controller::new(
        Arc::clone(&state),
        Arc::new(alarms),
        Arc::new(AudioBridge::new(sound)),
        notifier,
        Notification::timer_finished(args.icon.clone()),
    );
    if let Some(command) = &args.open_panel_command {
        info!("Panels reopen on completion with `{}`", command);
        controller = controller.with_launcher(Arc::new(CommandLauncher::new(command.clone())));
    }
    let controller = Arc::new(controller);

    // Start the background tasks
    tokio::spawn(alarm_listener_task(Arc::clone(&controller), fired));
    tokio::spawn(alarm_recovery_task(Arc::clone(&controller)));
    tokio::spawn(badge_ticker_task(Arc::clone(&state)));

    let app = create_router(controller);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Daemon listening on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message - Deliver start-timer / play-ding");
    info!("  GET  /events  - Completion pushes for open panels");
    info!("  GET  /status  - Timer record, view and badge");
    info!("  GET  /health  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        result = shutdown_signal() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for signals: {}", e);
            }
            info!("Shutdown signal received");
        }
    }

    state.badge.clear();
    info!("Daemon shutdown complete");
    Ok(())
}

async fn run_panel(
    config: &Config,
    command: &Command,
    store: Arc<FileStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<()> {
    let outbox = HttpOutbox::new(&config.base_url());
    let panel = Arc::new(
        Panel::new(store, clock, Arc::new(outbox.clone()))
            .with_finalize_grace(config.finalize_grace_ms()),
    );

    match command {
        Command::Panel => {
            session::run_interactive(panel, outbox).await?;
        }
        Command::Status { json: true } => {
            let view = session::run_command(&panel, command).await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        _ => {
            let view = session::run_command(&panel, command).await?;
            println!("{}", view.render());
        }
    }
    Ok(())
}
