use crate::audio::{AlarmPlayer, PlaybackHandle};
use crate::messages::PlaybackEvent;

use anyhow::{Context, Result};
use rodio::source::Source;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Platform default alarm sounds, tried in order when no tone is configured
/// or the configured file cannot be opened.
const FALLBACK_TONES: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga",
    "assets/alarm.oga",
    "/usr/share/keybell/assets/alarm.oga",
];

/// Loops an alarm tone on the default output device.
///
/// The blocking playback work runs on a dedicated task; the returned handle
/// stops it. The output stream must live on the playback task, so all audio
/// setup happens there and failures come back as `PlaybackEvent::Failed`.
pub struct RodioPlayer;

impl AlarmPlayer for RodioPlayer {
    fn begin(
        &self,
        tone: Option<&Path>,
        session: u64,
        events: mpsc::Sender<PlaybackEvent>,
    ) -> Result<PlaybackHandle> {
        let tone = tone.map(Path::to_path_buf);
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();

        tokio::task::spawn_blocking(move || {
            let (stream, sink) = match start_looping(tone.as_deref()) {
                Ok(playing) => {
                    let _ = events.blocking_send(PlaybackEvent::Started { session });
                    playing
                }
                Err(e) => {
                    let _ = events.blocking_send(PlaybackEvent::Failed {
                        session,
                        error: format!("{:#}", e),
                    });
                    return;
                }
            };

            // Park until the controller stops us or drops the handle. The
            // output stream must outlive the sink, so it stays bound here.
            let _ = stop_rx.recv();
            sink.stop();
            drop(stream);
            tracing::debug!("Playback session {} ended", session);
        });

        Ok(PlaybackHandle::new(stop_tx))
    }
}

fn start_looping(tone: Option<&Path>) -> Result<(rodio::OutputStream, Sink)> {
    let file = open_tone(tone)?;

    let stream = OutputStreamBuilder::open_default_stream()
        .context("Failed to open default audio output stream")?;

    let source = Decoder::new(BufReader::new(file))
        .context("Failed to decode alarm tone")?
        .repeat_infinite();

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);

    Ok((stream, sink))
}

fn open_tone(tone: Option<&Path>) -> Result<File> {
    if let Some(path) = tone {
        match File::open(path) {
            Ok(file) => return Ok(file),
            Err(e) => tracing::warn!(
                "Configured alarm tone {:?} unavailable ({}), falling back to default",
                path,
                e
            ),
        }
    }

    for candidate in FALLBACK_TONES {
        if let Ok(file) = File::open(PathBuf::from(candidate)) {
            return Ok(file);
        }
    }

    Err(anyhow::anyhow!("No alarm tone available"))
}
