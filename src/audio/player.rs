use crate::messages::PlaybackEvent;
use anyhow::Result;
use std::path::Path;
use tokio::sync::mpsc;

/// Trait for looping alarm playback
///
/// `begin` is the first half of a two-phase start: it hands back a
/// [`PlaybackHandle`] (or fails synchronously), and the session later
/// reports [`PlaybackEvent::Started`] or [`PlaybackEvent::Failed`] on the
/// event channel. The controller decides what to do with the outcome.
pub trait AlarmPlayer: Send {
    fn begin(
        &self,
        tone: Option<&Path>,
        session: u64,
        events: mpsc::Sender<PlaybackEvent>,
    ) -> Result<PlaybackHandle>;
}

/// Stops the playback session when signalled or dropped.
pub struct PlaybackHandle {
    stop_tx: std::sync::mpsc::Sender<()>,
}

impl PlaybackHandle {
    pub fn new(stop_tx: std::sync::mpsc::Sender<()>) -> Self {
        Self { stop_tx }
    }

    pub fn stop(self) {
        // A disconnected channel stops the session just as well; ignore it.
        let _ = self.stop_tx.send(());
    }
}
