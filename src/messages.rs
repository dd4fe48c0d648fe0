/// Commands for the alarm controller service
#[derive(Debug)]
pub enum AlarmCommand {
    /// A configured keyword was found in an incoming notification.
    Trigger { keyword: String },
    /// User asked the alarm to stop.
    Stop,
    /// User asked the alarm to snooze; 0 means "use the configured default".
    Snooze { minutes: u64 },
    /// The armed snooze timer elapsed.
    TimerFired,
    /// Tear everything down and exit the service loop.
    Shutdown,
}

/// Alarm life cycle state (observable via watch channel)
#[derive(Clone, Debug, PartialEq)]
pub enum AlarmState {
    Idle,
    Ringing,
    SnoozePending,
}

/// Reported by a playback session after `AlarmPlayer::begin`.
///
/// Sessions are numbered so that a stale report from an already-stopped
/// session cannot be confused with the current one.
#[derive(Debug)]
pub enum PlaybackEvent {
    Started { session: u64 },
    Failed { session: u64, error: String },
}

impl PlaybackEvent {
    pub fn session(&self) -> u64 {
        match self {
            PlaybackEvent::Started { session } => *session,
            PlaybackEvent::Failed { session, .. } => *session,
        }
    }
}
