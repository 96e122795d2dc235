//! Rodio-based playback adapter
//!
//! Each loaded sound gets its own audio thread, since rodio's output
//! stream cannot leave the thread that opened it.

use std::io::Cursor;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::application::ports::{
    AudioPlayback, CompletionCallback, PlaybackError, PlaybackHandle,
};

/// How often the audio thread checks for the end of the sound
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Pause,
    Rewind,
    Unload,
}

/// Playback implementation using rodio
pub struct RodioPlayback;

impl RodioPlayback {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioPlayback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPlayback for RodioPlayback {
    async fn load(
        &self,
        path: &Path,
        on_finish: CompletionCallback,
    ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PlaybackError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        let (commands, receiver) = mpsc::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::spawn(move || run_sound(bytes, receiver, ready_tx, on_finish));

        ready_rx
            .await
            .map_err(|_| PlaybackError::PlaybackFailed("Audio thread exited".into()))??;

        debug!(path = %path.display(), "sound loaded");
        Ok(Box::new(RodioSound { commands }))
    }
}

/// A sound loaded on its audio thread
pub struct RodioSound {
    commands: Sender<Command>,
}

impl RodioSound {
    fn send(&self, command: Command) -> Result<(), PlaybackError> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::PlaybackFailed("Sound is no longer loaded".into()))
    }
}

#[async_trait]
impl PlaybackHandle for RodioSound {
    async fn play(&mut self) -> Result<(), PlaybackError> {
        self.send(Command::Play)
    }

    async fn pause(&mut self) -> Result<(), PlaybackError> {
        self.send(Command::Pause)
    }

    async fn rewind(&mut self) -> Result<(), PlaybackError> {
        self.send(Command::Rewind)
    }

    async fn unload(&mut self) -> Result<(), PlaybackError> {
        // The thread may already be gone after an error; unloading twice is fine
        let _ = self.commands.send(Command::Unload);
        Ok(())
    }
}

impl Drop for RodioSound {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unload);
    }
}

fn decode(bytes: &[u8]) -> Result<Decoder<Cursor<Vec<u8>>>, PlaybackError> {
    Decoder::new(Cursor::new(bytes.to_vec())).map_err(|e| PlaybackError::LoadFailed(e.to_string()))
}

/// Audio thread body: owns the output stream and sink until unloaded
fn run_sound(
    bytes: Vec<u8>,
    commands: Receiver<Command>,
    ready: oneshot::Sender<Result<(), PlaybackError>>,
    on_finish: CompletionCallback,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::DeviceNotAvailable(e.to_string())));
            return;
        }
    };
    let sink = match Sink::try_new(&stream_handle) {
        Ok(sink) => sink,
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::PlaybackFailed(e.to_string())));
            return;
        }
    };
    match decode(&bytes) {
        Ok(source) => {
            sink.pause();
            sink.append(source);
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    }
    let _ = ready.send(Ok(()));

    let mut playing = false;
    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(Command::Play) => {
                if sink.empty() {
                    if let Ok(source) = decode(&bytes) {
                        sink.append(source);
                    }
                }
                sink.play();
                playing = true;
            }
            Ok(Command::Pause) => {
                sink.pause();
                playing = false;
            }
            Ok(Command::Rewind) => {
                // clear() also pauses the sink
                sink.clear();
                match decode(&bytes) {
                    Ok(source) => sink.append(source),
                    Err(e) => warn!(error = %e, "failed to rewind sound"),
                }
                if playing {
                    sink.play();
                }
            }
            Ok(Command::Unload) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if playing && sink.empty() {
            playing = false;
            on_finish();
        }
    }

    sink.stop();
}
