//! Playback use case
//!
//! Plays back a committed recording. At most one sound is loaded at a
//! time and it is unloaded automatically when it finishes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::ports::{AudioPlayback, CompletionCallback, PlaybackError, PlaybackHandle};

/// Errors from the playback use case
#[derive(Debug, Error)]
pub enum PlaybackControlError {
    #[error("{0}")]
    Playback(#[from] PlaybackError),

    #[error("No recording is loaded")]
    NothingLoaded,
}

/// Playback lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unloaded,
    Ready,
    Playing,
    Paused,
}

struct Loaded {
    generation: u64,
    path: PathBuf,
    handle: Box<dyn PlaybackHandle>,
}

struct Inner<P> {
    playback: P,
    current: Mutex<Option<Loaded>>,
    generation: AtomicU64,
    state: watch::Sender<PlaybackState>,
}

/// Controls playback of a single loaded recording
pub struct PlaybackController<P: AudioPlayback + 'static> {
    inner: Arc<Inner<P>>,
}

impl<P: AudioPlayback + 'static> PlaybackController<P> {
    pub fn new(playback: P) -> Self {
        let (state, _) = watch::channel(PlaybackState::Unloaded);
        Self {
            inner: Arc::new(Inner {
                playback,
                current: Mutex::new(None),
                generation: AtomicU64::new(0),
                state,
            }),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state.subscribe()
    }

    /// Path of the loaded sound
    pub async fn loaded_path(&self) -> Option<PathBuf> {
        self.inner.current.lock().await.as_ref().map(|l| l.path.clone())
    }

    /// Load a recording, unloading any previously loaded one first
    pub async fn load(&self, path: &Path) -> Result<(), PlaybackControlError> {
        let mut current = self.inner.current.lock().await;
        if let Some(previous) = current.take() {
            release(previous).await;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let on_finish = completion_callback(Arc::downgrade(&self.inner), generation);

        match self.inner.playback.load(path, on_finish).await {
            Ok(handle) => {
                *current = Some(Loaded {
                    generation,
                    path: path.to_path_buf(),
                    handle,
                });
                self.inner.state.send_replace(PlaybackState::Ready);
                debug!(path = %path.display(), generation, "sound loaded");
                Ok(())
            }
            Err(e) => {
                self.inner.state.send_replace(PlaybackState::Unloaded);
                Err(e.into())
            }
        }
    }

    /// Play the loaded sound from its beginning
    pub async fn play(&self) -> Result<(), PlaybackControlError> {
        let mut current = self.inner.current.lock().await;
        let loaded = current.as_mut().ok_or(PlaybackControlError::NothingLoaded)?;
        loaded.handle.rewind().await?;
        loaded.handle.play().await?;
        self.inner.state.send_replace(PlaybackState::Playing);
        info!(path = %loaded.path.display(), "playback started");
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), PlaybackControlError> {
        let mut current = self.inner.current.lock().await;
        let loaded = current.as_mut().ok_or(PlaybackControlError::NothingLoaded)?;
        loaded.handle.pause().await?;
        self.inner.state.send_replace(PlaybackState::Paused);
        Ok(())
    }

    /// Pause while playing; otherwise continue from the current position
    pub async fn toggle(&self) -> Result<PlaybackState, PlaybackControlError> {
        let mut current = self.inner.current.lock().await;
        let loaded = current.as_mut().ok_or(PlaybackControlError::NothingLoaded)?;
        let next = if self.state() == PlaybackState::Playing {
            loaded.handle.pause().await?;
            PlaybackState::Paused
        } else {
            loaded.handle.play().await?;
            PlaybackState::Playing
        };
        self.inner.state.send_replace(next);
        Ok(next)
    }

    /// Release the loaded sound; a no-op when nothing is loaded
    pub async fn unload(&self) {
        let mut current = self.inner.current.lock().await;
        if let Some(loaded) = current.take() {
            release(loaded).await;
        }
        self.inner.state.send_replace(PlaybackState::Unloaded);
    }

    /// Wait until the loaded sound has finished and been unloaded
    pub async fn wait_until_unloaded(&self) {
        let mut state = self.subscribe();
        let _ = state.wait_for(|s| *s == PlaybackState::Unloaded).await;
    }
}

impl<P: AudioPlayback + 'static> Inner<P> {
    async fn finished(&self, generation: u64) {
        let mut current = self.current.lock().await;
        match current.as_ref() {
            Some(loaded) if loaded.generation == generation => {}
            _ => {
                debug!(generation, "completion for a sound no longer loaded");
                return;
            }
        }
        if let Some(loaded) = current.take() {
            info!(path = %loaded.path.display(), "playback finished");
            release(loaded).await;
        }
        self.state.send_replace(PlaybackState::Unloaded);
    }
}

async fn release(mut loaded: Loaded) {
    if let Err(e) = loaded.handle.unload().await {
        warn!(error = %e, "failed to unload sound");
    }
}

/// Completion may be reported from an audio thread; hop back onto the
/// runtime before touching the controller.
fn completion_callback<P: AudioPlayback + 'static>(
    inner: Weak<Inner<P>>,
    generation: u64,
) -> CompletionCallback {
    let runtime = Handle::current();
    Arc::new(move || {
        let inner = inner.clone();
        runtime.spawn(async move {
            if let Some(inner) = inner.upgrade() {
                inner.finished(generation).await;
            }
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct Log {
        events: StdMutex<Vec<String>>,
        callbacks: StdMutex<Vec<CompletionCallback>>,
    }

    impl Log {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn finish(&self, index: usize) {
            let callback = self.callbacks.lock().unwrap()[index].clone();
            callback();
        }
    }

    struct MockPlayback {
        log: Arc<Log>,
    }

    struct MockSound {
        name: String,
        log: Arc<Log>,
    }

    #[async_trait]
    impl AudioPlayback for MockPlayback {
        async fn load(
            &self,
            path: &Path,
            on_finish: CompletionCallback,
        ) -> Result<Box<dyn PlaybackHandle>, PlaybackError> {
            if path.ends_with("missing.wav") {
                return Err(PlaybackError::LoadFailed("no such file".into()));
            }
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.log.push(format!("load {name}"));
            self.log.callbacks.lock().unwrap().push(on_finish);
            Ok(Box::new(MockSound {
                name,
                log: Arc::clone(&self.log),
            }))
        }
    }

    #[async_trait]
    impl PlaybackHandle for MockSound {
        async fn play(&mut self) -> Result<(), PlaybackError> {
            self.log.push(format!("play {}", self.name));
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), PlaybackError> {
            self.log.push(format!("pause {}", self.name));
            Ok(())
        }

        async fn rewind(&mut self) -> Result<(), PlaybackError> {
            self.log.push(format!("rewind {}", self.name));
            Ok(())
        }

        async fn unload(&mut self) -> Result<(), PlaybackError> {
            self.log.push(format!("unload {}", self.name));
            Ok(())
        }
    }

    fn controller() -> (PlaybackController<MockPlayback>, Arc<Log>) {
        let log = Arc::new(Log::default());
        (
            PlaybackController::new(MockPlayback {
                log: Arc::clone(&log),
            }),
            log,
        )
    }

    #[tokio::test]
    async fn play_always_starts_from_beginning() {
        let (controller, log) = controller();
        controller.load(Path::new("/cache/voice_1.wav")).await.unwrap();
        assert_eq!(controller.state(), PlaybackState::Ready);

        controller.play().await.unwrap();
        controller.pause().await.unwrap();
        controller.play().await.unwrap();

        assert_eq!(
            log.events(),
            vec![
                "load voice_1.wav",
                "rewind voice_1.wav",
                "play voice_1.wav",
                "pause voice_1.wav",
                "rewind voice_1.wav",
                "play voice_1.wav",
            ]
        );
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn toggle_pauses_and_continues() {
        let (controller, log) = controller();
        controller.load(Path::new("/cache/voice_1.wav")).await.unwrap();
        controller.play().await.unwrap();

        assert_eq!(controller.toggle().await.unwrap(), PlaybackState::Paused);
        assert_eq!(controller.toggle().await.unwrap(), PlaybackState::Playing);
        assert_eq!(log.events().last().unwrap(), "play voice_1.wav");
    }

    #[tokio::test]
    async fn completion_unloads_sound() {
        let (controller, log) = controller();
        controller.load(Path::new("/cache/voice_1.wav")).await.unwrap();
        controller.play().await.unwrap();

        log.finish(0);
        controller.wait_until_unloaded().await;

        assert_eq!(controller.state(), PlaybackState::Unloaded);
        assert!(controller.loaded_path().await.is_none());
        assert_eq!(log.events().last().unwrap(), "unload voice_1.wav");
    }

    #[tokio::test]
    async fn loading_replaces_previous_sound() {
        let (controller, log) = controller();
        controller.load(Path::new("/cache/voice_1.wav")).await.unwrap();
        controller.load(Path::new("/cache/voice_2.wav")).await.unwrap();

        assert!(log.events().contains(&"unload voice_1.wav".to_string()));
        assert_eq!(
            controller.loaded_path().await,
            Some(PathBuf::from("/cache/voice_2.wav"))
        );

        // A late completion from the first sound must not unload the second
        log.finish(0);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(controller.state(), PlaybackState::Ready);
        assert!(controller.loaded_path().await.is_some());
    }

    #[tokio::test]
    async fn commands_without_sound_fail() {
        let (controller, _) = controller();
        assert!(matches!(
            controller.play().await,
            Err(PlaybackControlError::NothingLoaded)
        ));
        assert!(controller.toggle().await.is_err());
        controller.unload().await;
        assert_eq!(controller.state(), PlaybackState::Unloaded);
    }

    #[tokio::test]
    async fn load_failure_leaves_nothing_loaded() {
        let (controller, _) = controller();
        let result = controller.load(Path::new("/cache/missing.wav")).await;
        assert!(matches!(result, Err(PlaybackControlError::Playback(_))));
        assert_eq!(controller.state(), PlaybackState::Unloaded);
    }
}
