mod alert;
mod audio;
mod config;
mod listener;
mod matcher;
mod messages;
mod services;
mod state;

use alert::DesktopAlert;
use audio::RodioPlayer;
use config::Config;
use listener::{ControlKind, FeedMessage};
use services::{AlarmController, AlarmHandle};
use state::{FileStateStore, RunState, StateStore};

use anyhow::Result;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting keybell keyword alarm daemon");

    // Load configuration
    let mut config = Config::load()?;
    config.validate()?;

    if config.first_launch {
        tracing::info!("First launch: add trigger words to the keywords list in the config file");
        config.first_launch = false;
        config.save()?;
    }

    if config.keywords.is_empty() {
        tracing::warn!("No keywords configured, no notification will ever ring the alarm");
    }

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let store = FileStateStore::new()?;

    // A fresh process cannot have a live ringing session, so a persisted
    // running flag can only be left over from a crash mid-ring.
    let startup_state = store.load().unwrap_or_default();
    if startup_state.running {
        tracing::warn!(
            "Resetting stale run guard (keyword was {:?})",
            startup_state.active_keyword
        );
        store.save(&RunState::idle())?;
    }

    // Control signal channel shared by the alert surface and the main loop
    let (cmd_tx, cmd_rx) = mpsc::channel(16);

    let controller = AlarmController::new(
        config.alarm_tone.clone(),
        config.snooze_minutes,
        cmd_rx,
        cmd_tx.clone(),
        Box::new(RodioPlayer),
        Box::new(DesktopAlert::new(cmd_tx.clone())),
        Box::new(store),
    );
    // Observable life cycle state, logged as it changes
    let mut state_rx = controller.subscribe();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            tracing::info!("Alarm state: {:?}", state);
        }
    });

    let controller_task = tokio::spawn(controller.run());
    let handle = AlarmHandle::new(cmd_tx);

    // Notification events and external control messages arrive as JSON
    // lines on stdin
    let (feed_tx, mut feed_rx) = mpsc::channel(32);
    tokio::spawn(listener::read_feed(feed_tx));

    tracing::info!(
        "Watching notifications for {} keyword(s)",
        config.keywords.len()
    );

    // Main event loop
    loop {
        tokio::select! {
            message = feed_rx.recv() => {
                match message {
                    Some(FeedMessage::Notification(event)) => {
                        if let Some(m) = listener::match_event(&event, &config) {
                            tracing::info!(
                                "Keyword {:?} matched in a notification from {}",
                                m.keyword,
                                event.app
                            );
                            tracing::debug!("Matched fragment: {:?}", m.text);
                            handle.trigger(&m.keyword).await?;
                        }
                    }
                    Some(FeedMessage::Control(control)) => match control.control {
                        ControlKind::Stop => handle.stop().await?,
                        ControlKind::Snooze => {
                            handle.snooze(control.minutes.unwrap_or(0)).await?;
                        }
                    },
                    None => {
                        tracing::info!("Notification feed ended, shutting down");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    handle.shutdown().await?;
    controller_task.await.ok();

    tracing::info!("Keybell shutdown complete");
    Ok(())
}
