use crate::messages::AlarmCommand;

use async_trait::async_trait;
use notify_rust::{Notification, Timeout, Urgency};
use tokio::sync::mpsc;

/// Notification id reused for every alert so `clear` can replace the
/// currently shown one.
const ALERT_ID: u32 = 0x4b42;

const ACTION_STOP: &str = "stop";
const ACTION_SNOOZE: &str = "snooze";

/// User-facing alert port: a persistent actionable alert while ringing.
///
/// Implementations are best-effort; the alarm core keeps ringing even when
/// no notification daemon is around to show anything.
#[async_trait]
pub trait AlertSurface: Send {
    async fn show(&self, keyword: &str);
    async fn clear(&self);
}

/// Desktop notification adapter.
///
/// Posts a critical, non-expiring notification with Stop and Snooze action
/// buttons and waits for the user's choice on a blocking task, feeding the
/// resulting signal back into the controller's command channel. That wait
/// is what keeps the dispatch path alive while the user reacts.
pub struct DesktopAlert {
    signals: mpsc::Sender<AlarmCommand>,
}

impl DesktopAlert {
    pub fn new(signals: mpsc::Sender<AlarmCommand>) -> Self {
        Self { signals }
    }
}

#[async_trait]
impl AlertSurface for DesktopAlert {
    async fn show(&self, keyword: &str) {
        let keyword = keyword.to_string();
        let signals = self.signals.clone();
        let (posted_tx, posted_rx) = tokio::sync::oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let posted = Notification::new()
                .summary("Keybell is ringing")
                .body(&format!("Keyword: {}", keyword))
                .icon("alarm-symbolic")
                .urgency(Urgency::Critical)
                .timeout(Timeout::Never)
                .action(ACTION_STOP, "Stop")
                .action(ACTION_SNOOZE, "Snooze")
                .id(ALERT_ID)
                .show();

            let _ = posted_tx.send(());

            match posted {
                Ok(handle) => handle.wait_for_action(|action| {
                    let signal = match action {
                        ACTION_STOP => Some(AlarmCommand::Stop),
                        // 0 minutes means "use the configured default".
                        ACTION_SNOOZE => Some(AlarmCommand::Snooze { minutes: 0 }),
                        _ => None,
                    };
                    if let Some(signal) = signal {
                        if signals.blocking_send(signal).is_err() {
                            tracing::warn!("Alarm controller gone, dropping alert action");
                        }
                    }
                }),
                Err(e) => tracing::warn!("Failed to show alarm alert: {}", e),
            }
        });

        // Return only once the alert is on screen (or the post failed).
        // Successive show/clear calls share ALERT_ID, so a later clear must
        // not be able to race ahead of this post. Only the action wait stays
        // detached.
        let _ = posted_rx.await;
    }

    async fn clear(&self) {
        tokio::task::spawn_blocking(|| {
            // Replace the persistent alert with one that expires immediately.
            let cleared = Notification::new()
                .summary("Alarm stopped")
                .timeout(Timeout::Milliseconds(1))
                .id(ALERT_ID)
                .show();

            if let Err(e) = cleared {
                tracing::warn!("Failed to clear alarm alert: {}", e);
            }
        })
        .await
        .ok();
    }
}
