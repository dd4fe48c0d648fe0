use crate::alert::AlertSurface;
use crate::audio::{AlarmPlayer, PlaybackHandle};
use crate::messages::{AlarmCommand, AlarmState, PlaybackEvent};
use crate::state::{RunState, StateStore};

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Label used when a snoozed alarm re-fires without a retained keyword.
const GENERIC_KEYWORD: &str = "Detected";

/// Owns the alarm life cycle: Idle -> Ringing -> Idle, with a snooze
/// sub-path that re-enters Ringing after a deferred timer.
///
/// This service:
/// - Consumes control signals (trigger, stop, snooze, timer fire) in
///   arrival order, each handled to completion
/// - Starts and stops looping playback through the audio port
/// - Shows and clears the persistent alert
/// - Mirrors the run guard into the state store so a restarted process
///   cannot stack a second ringing session on a live one
///
/// Arming a snooze timer always cancels a previously armed one, as does
/// entering Ringing while a timer is pending (cancel-and-replace).
pub struct AlarmController {
    cmd_rx: mpsc::Receiver<AlarmCommand>,
    cmd_tx: mpsc::Sender<AlarmCommand>,
    playback_rx: mpsc::Receiver<PlaybackEvent>,
    playback_tx: mpsc::Sender<PlaybackEvent>,
    player: Box<dyn AlarmPlayer>,
    alert: Box<dyn AlertSurface>,
    store: Box<dyn StateStore>,
    alarm_tone: Option<PathBuf>,
    default_snooze_minutes: u64,
    state: AlarmState,
    state_tx: watch::Sender<AlarmState>,
    playback: Option<PlaybackHandle>,
    session: u64,
    active_keyword: Option<String>,
    snoozed_keyword: Option<String>,
    snooze_timer: Option<JoinHandle<()>>,
}

impl AlarmController {
    pub fn new(
        alarm_tone: Option<PathBuf>,
        default_snooze_minutes: u64,
        cmd_rx: mpsc::Receiver<AlarmCommand>,
        cmd_tx: mpsc::Sender<AlarmCommand>,
        player: Box<dyn AlarmPlayer>,
        alert: Box<dyn AlertSurface>,
        store: Box<dyn StateStore>,
    ) -> Self {
        let (playback_tx, playback_rx) = mpsc::channel(8);
        let (state_tx, _) = watch::channel(AlarmState::Idle);

        Self {
            cmd_rx,
            cmd_tx,
            playback_rx,
            playback_tx,
            player,
            alert,
            store,
            alarm_tone,
            default_snooze_minutes,
            state: AlarmState::Idle,
            state_tx,
            playback: None,
            session: 0,
            active_keyword: None,
            snoozed_keyword: None,
            snooze_timer: None,
        }
    }

    /// Observe life cycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<AlarmState> {
        self.state_tx.subscribe()
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.cmd_rx.recv() => {
                    tracing::debug!("Controller: handling {:?} in {:?}", cmd, self.state);
                    match cmd {
                        AlarmCommand::Trigger { keyword } => self.handle_trigger(keyword).await,
                        AlarmCommand::Stop => self.handle_stop().await,
                        AlarmCommand::Snooze { minutes } => self.handle_snooze(minutes).await,
                        AlarmCommand::TimerFired => self.handle_timer_fired().await,
                        AlarmCommand::Shutdown => {
                            self.handle_stop().await;
                            tracing::info!("Alarm controller shut down");
                            break;
                        }
                    }
                }

                Some(event) = self.playback_rx.recv() => {
                    self.handle_playback_event(event).await;
                }

                else => break,
            }
        }
    }

    async fn handle_trigger(&mut self, keyword: String) {
        // Idempotent start: a second trigger while ringing changes nothing.
        if self.state == AlarmState::Ringing {
            tracing::debug!("Already ringing, ignoring trigger for {:?}", keyword);
            return;
        }

        // Run guard: a persisted running flag means another session (possibly
        // from before a crash) is live.
        if self.run_guard_active() {
            tracing::warn!(
                "Run guard is set, not starting a second session for {:?}",
                keyword
            );
            return;
        }

        self.start_ringing(keyword).await;
    }

    async fn start_ringing(&mut self, keyword: String) {
        // Entering Ringing supersedes any armed snooze timer.
        self.cancel_snooze_timer();
        self.snoozed_keyword = None;

        tracing::info!("Ringing for keyword {:?}", keyword);
        self.persist(RunState::ringing(&keyword));
        self.active_keyword = Some(keyword.clone());
        self.set_state(AlarmState::Ringing);

        self.alert.show(&keyword).await;

        self.session += 1;
        match self.player.begin(
            self.alarm_tone.as_deref(),
            self.session,
            self.playback_tx.clone(),
        ) {
            Ok(handle) => self.playback = Some(handle),
            Err(e) => {
                tracing::error!("Failed to begin alarm playback: {:#}", e);
                self.silence().await;
                self.set_state(AlarmState::Idle);
            }
        }
    }

    async fn handle_stop(&mut self) {
        if self.state == AlarmState::Idle {
            tracing::debug!("Stop while idle, nothing to do");
            return;
        }

        self.silence().await;
        self.cancel_snooze_timer();
        self.snoozed_keyword = None;
        self.set_state(AlarmState::Idle);
        tracing::info!("Alarm stopped");
    }

    async fn handle_snooze(&mut self, minutes: u64) {
        let minutes = if minutes == 0 {
            self.default_snooze_minutes
        } else {
            minutes
        };

        // Keep the keyword for the re-trigger; an already snoozed keyword
        // survives a repeated snooze.
        if let Some(keyword) = self.active_keyword.take() {
            self.snoozed_keyword = Some(keyword);
        }

        self.silence().await;
        self.cancel_snooze_timer();

        let tx = self.cmd_tx.clone();
        // `minutes` comes straight off the feed; saturate rather than let an
        // absurd value overflow the conversion to seconds.
        let delay = Duration::from_secs(minutes.saturating_mul(60));
        self.snooze_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AlarmCommand::TimerFired).await;
        }));

        self.set_state(AlarmState::SnoozePending);
        tracing::info!("Snoozed for {} minutes", minutes);
    }

    async fn handle_timer_fired(&mut self) {
        if self.state != AlarmState::SnoozePending {
            tracing::debug!("Timer fired outside snooze, ignoring");
            return;
        }

        self.snooze_timer = None;
        let keyword = self
            .snoozed_keyword
            .take()
            .unwrap_or_else(|| GENERIC_KEYWORD.to_string());

        tracing::info!("Snooze elapsed, ringing again for {:?}", keyword);
        self.start_ringing(keyword).await;
    }

    async fn handle_playback_event(&mut self, event: PlaybackEvent) {
        if event.session() != self.session || self.state != AlarmState::Ringing {
            tracing::debug!("Ignoring stale playback event {:?}", event);
            return;
        }

        match event {
            PlaybackEvent::Started { session } => {
                tracing::debug!("Playback session {} running", session);
            }
            PlaybackEvent::Failed { session, error } => {
                tracing::error!("Playback session {} failed: {}", session, error);
                self.silence().await;
                self.set_state(AlarmState::Idle);
            }
        }
    }

    /// Stop playback, clear the alert, and persist running=false. Every
    /// exit from Ringing goes through here, failure paths included.
    async fn silence(&mut self) {
        if let Some(handle) = self.playback.take() {
            handle.stop();
        }
        self.active_keyword = None;
        self.alert.clear().await;
        self.persist(RunState::idle());
    }

    fn cancel_snooze_timer(&mut self) {
        if let Some(timer) = self.snooze_timer.take() {
            timer.abort();
        }
    }

    fn run_guard_active(&self) -> bool {
        match self.store.load() {
            Ok(state) => state.running,
            Err(e) => {
                tracing::warn!("Failed to read run state, assuming idle: {}", e);
                false
            }
        }
    }

    fn persist(&self, state: RunState) {
        if let Err(e) = self.store.save(&state) {
            tracing::warn!("Failed to persist run state: {}", e);
        }
    }

    fn set_state(&mut self, state: AlarmState) {
        if self.state != state {
            tracing::debug!("State {:?} -> {:?}", self.state, state);
        }
        self.state = state.clone();
        self.state_tx.send_replace(state);
    }
}

/// Handle for signalling the alarm controller
#[derive(Clone)]
pub struct AlarmHandle {
    tx: mpsc::Sender<AlarmCommand>,
}

impl AlarmHandle {
    pub fn new(tx: mpsc::Sender<AlarmCommand>) -> Self {
        Self { tx }
    }

    pub async fn trigger(&self, keyword: &str) -> Result<()> {
        self.send(AlarmCommand::Trigger {
            keyword: keyword.to_string(),
        })
        .await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(AlarmCommand::Stop).await
    }

    pub async fn snooze(&self, minutes: u64) -> Result<()> {
        self.send(AlarmCommand::Snooze { minutes }).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(AlarmCommand::Shutdown).await
    }

    async fn send(&self, cmd: AlarmCommand) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send alarm command: {}", e))
    }
}
