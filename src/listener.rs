use crate::config::Config;
use crate::matcher::{self, KeywordMatch};

use anyhow::Result;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Anything the bridge can put on the feed: a control message from an
/// external surface (the popup's Stop button resolves this way) or a
/// notification to match against.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedMessage {
    Control(ControlMessage),
    Notification(NotificationEvent),
}

/// `{"control": "stop"}` or `{"control": "snooze", "minutes": 5}`.
#[derive(Debug, Deserialize)]
pub struct ControlMessage {
    pub control: ControlKind,

    /// Snooze duration; absent means the configured default.
    #[serde(default)]
    pub minutes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Stop,
    Snooze,
}

/// One notification as delivered by the bridge, one JSON object per stdin
/// line. Everything except the source app is optional; extraction just
/// skips what is missing.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationEvent {
    pub app: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub big_text: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    /// Grouped-notification lines.
    #[serde(default)]
    pub lines: Vec<String>,

    /// Conversation-style message bodies, most recent last.
    #[serde(default)]
    pub messages: Vec<String>,
}

impl NotificationEvent {
    /// Collect the text fragments to match against, in a fixed order:
    /// title, body, big text, summary, each grouped line, then the
    /// conversation messages joined into one fragment. Blank fragments
    /// are dropped.
    pub fn candidate_texts(&self) -> Vec<String> {
        let mut candidates = Vec::new();

        let mut push = |text: &str| {
            let text = text.trim();
            if !text.is_empty() {
                candidates.push(text.to_string());
            }
        };

        if let Some(title) = &self.title {
            push(title);
        }
        if let Some(body) = &self.body {
            push(body);
        }
        if let Some(big_text) = &self.big_text {
            push(big_text);
        }
        if let Some(summary) = &self.summary {
            push(summary);
        }
        for line in &self.lines {
            push(line);
        }

        let joined = self
            .messages
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        push(&joined);

        candidates
    }
}

/// Screen an incoming event against the configuration.
///
/// Returns the keyword match that should ring the alarm, or `None` when
/// alerts are disabled, the source app is not watched, or nothing matches.
pub fn match_event(event: &NotificationEvent, config: &Config) -> Option<KeywordMatch> {
    if !config.enabled {
        tracing::debug!("Alerts disabled, dropping event from {}", event.app);
        return None;
    }

    if !config.watches_app(&event.app) {
        tracing::debug!("Ignoring event from unwatched app {}", event.app);
        return None;
    }

    matcher::find_match(&event.candidate_texts(), &config.keywords)
}

/// Read newline-delimited JSON messages from stdin and forward them on the
/// channel. Malformed lines are logged and skipped; EOF ends the feed.
pub async fn read_feed(tx: mpsc::Sender<FeedMessage>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<FeedMessage>(line) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("Skipping malformed feed line: {}", e),
        }
    }

    tracing::info!("Notification feed closed");
    Ok(())
}
