//! Recording session use case
//!
//! Drives one audio capture at a time through its lifecycle, keeps the
//! elapsed-time tick, and hands the finished file off to the local cache.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::domain::diary::{DiaryDate, DiaryId, StorageKey};
use crate::domain::recording::{
    Duration, InvalidStateTransition, RecordingSession, SessionState, TickOutcome,
};

use super::ports::{
    AudioCapture, CaptureError, CaptureHandle, FileStorage, NoticeKind, Notifier,
    StorageError,
};

const NOTIFICATION_TITLE: &str = "Memento";

/// Errors from the recording use case
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Recording failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Saving recording failed: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    InvalidState(#[from] InvalidStateTransition),

    #[error("No capture handle is held for the current session")]
    NoActiveCapture,
}

/// Configuration for the recording manager
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Forced stop after this much recorded time
    pub max_duration: Duration,
    /// Directory committed recordings are stored in
    pub cache_dir: PathBuf,
    /// Whether to notify on routine transitions (start, stop).
    /// Failures and the duration limit are always reported.
    pub enable_notify: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::default_max_duration(),
            cache_dir: std::env::temp_dir().join("memento"),
            enable_notify: false,
        }
    }
}

/// Point-in-time view of the session, published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub elapsed_seconds: u64,
    /// Set when the last stop was forced by the duration limit
    pub limit_reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Requested,
    LimitReached,
}

/// Recording session manager.
///
/// Transitions are serialized by an async mutex that also owns the
/// capture handle slot. Tokio's mutex is fair, so a `stop` issued while
/// `start` is still resolving is applied once `start` completes.
pub struct RecordingSessionManager<C, S, N>
where
    C: AudioCapture + 'static,
    S: FileStorage + 'static,
    N: Notifier + 'static,
{
    inner: Arc<Inner<C, S, N>>,
}

struct Inner<C, S, N> {
    capture: C,
    storage: S,
    notifier: N,
    config: RecordingConfig,
    slot: Mutex<Option<Box<dyn CaptureHandle>>>,
    session: StdMutex<RecordingSession>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
    status: watch::Sender<SessionStatus>,
}

impl<C, S, N> RecordingSessionManager<C, S, N>
where
    C: AudioCapture + 'static,
    S: FileStorage + 'static,
    N: Notifier + 'static,
{
    /// Create a manager with an idle session
    pub fn new(capture: C, storage: S, notifier: N, config: RecordingConfig) -> Self {
        let (status, _) = watch::channel(SessionStatus {
            state: SessionState::Idle,
            elapsed_seconds: 0,
            limit_reached: false,
        });
        Self {
            inner: Arc::new(Inner {
                capture,
                storage,
                notifier,
                session: StdMutex::new(RecordingSession::new(config.max_duration)),
                config,
                slot: Mutex::new(None),
                ticker: StdMutex::new(None),
                status,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.session().state()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.inner.session().elapsed_seconds()
    }

    /// Current capture file, if the session has stopped
    pub fn local_file(&self) -> Option<PathBuf> {
        self.inner.session().local_file().map(|p| p.to_path_buf())
    }

    /// Copy of the whole session entity
    pub fn session(&self) -> RecordingSession {
        self.inner.session().clone()
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.inner.config
    }

    /// Watch session changes, including ticks and the automatic stop
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Start a new recording for `date`.
    ///
    /// Any handle still held from an earlier session is stopped and
    /// released first; errors from it are logged and ignored.
    pub async fn start(&self, date: DiaryDate) -> Result<(), RecordingError> {
        let mut slot = self.inner.slot.lock().await;
        self.inner.teardown(&mut slot).await;

        let mut handle = match self.inner.acquire().await {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, "failed to acquire capture resource");
                self.inner.publish(false);
                self.inner.notify(&failure_message(&e), NoticeKind::Error).await;
                return Err(e.into());
            }
        };

        if let Err(e) = handle.start().await {
            error!(error = %e, "capture failed to start");
            match handle.stop_and_release().await {
                Ok(partial) => {
                    let _ = self.inner.storage.delete(&partial, true).await;
                }
                Err(release) => debug!(error = %release, "release after failed start"),
            }
            drop(handle);
            self.inner.capture.force_release().await;
            self.inner.publish(false);
            self.inner.notify(&failure_message(&e), NoticeKind::Error).await;
            return Err(e.into());
        }

        self.inner.session().begin(date)?;
        *slot = Some(handle);
        self.inner.spawn_ticker();
        self.inner.publish(false);
        info!(%date, max = %self.inner.config.max_duration, "recording started");

        if self.inner.config.enable_notify {
            self.inner
                .notify("Recording started", NoticeKind::Recording)
                .await;
        }
        Ok(())
    }

    /// Suspend the tick; the capture handle stays held
    pub async fn pause(&self) -> Result<(), RecordingError> {
        let mut slot = self.inner.slot.lock().await;
        if self.inner.stop_at_limit(&mut slot).await? {
            return Ok(());
        }
        self.inner.session().pause()?;
        self.inner.abort_ticker();

        let result = match slot.as_mut() {
            Some(handle) => handle.pause().await.map_err(RecordingError::from),
            None => Err(RecordingError::NoActiveCapture),
        };
        if let Err(e) = result {
            warn!(error = %e, "pause failed, continuing to record");
            let _ = self.inner.session().resume();
            self.inner.spawn_ticker();
            return Err(e);
        }

        self.inner.publish(false);
        info!(elapsed = self.elapsed_seconds(), "recording paused");
        Ok(())
    }

    /// Continue a paused recording without resetting the elapsed count
    pub async fn resume(&self) -> Result<(), RecordingError> {
        let mut slot = self.inner.slot.lock().await;
        if self.inner.stop_at_limit(&mut slot).await? {
            return Ok(());
        }
        self.inner.session().resume()?;

        let result = match slot.as_mut() {
            Some(handle) => handle.resume().await.map_err(RecordingError::from),
            None => Err(RecordingError::NoActiveCapture),
        };
        if let Err(e) = result {
            warn!(error = %e, "resume failed, staying paused");
            let _ = self.inner.session().pause();
            return Err(e);
        }

        self.inner.spawn_ticker();
        self.inner.publish(false);
        info!(elapsed = self.elapsed_seconds(), "recording resumed");
        Ok(())
    }

    /// Stop the recording and release the capture resource.
    ///
    /// # Returns
    /// The temporary capture file
    pub async fn stop(&self) -> Result<PathBuf, RecordingError> {
        let mut slot = self.inner.slot.lock().await;
        self.inner.stop_locked(&mut slot, StopReason::Requested).await
    }

    /// Return to idle from any state, releasing held resources.
    /// Uncommitted capture files are discarded.
    pub async fn reset(&self) {
        let mut slot = self.inner.slot.lock().await;
        self.inner.teardown(&mut slot).await;
        self.inner.publish(false);
    }

    /// Move the stopped recording into the cache under its storage key.
    ///
    /// Without a diary id the file is stored under the date placeholder.
    /// On failure the session stays stopped with the temporary file, so
    /// the commit can be retried.
    pub async fn commit(&self, diary_id: Option<DiaryId>) -> Result<PathBuf, RecordingError> {
        let _slot = self.inner.slot.lock().await;

        let (temp, date) = {
            let session = self.inner.session();
            let temp = session.ensure_can_commit()?.to_path_buf();
            (temp, session.date().unwrap_or_else(DiaryDate::today))
        };

        let key = StorageKey::resolve(diary_id, date);
        if key.is_placeholder() {
            debug!(%date, "no diary id, storing under the date placeholder");
        }
        let target = key.path_in(&self.inner.config.cache_dir);
        debug!(from = %temp.display(), to = %target.display(), "committing recording");

        if let Err(e) = self.inner.store(&temp, &target).await {
            error!(error = %e, "commit failed, keeping temporary file");
            self.inner
                .notify(&format!("Could not save recording: {e}"), NoticeKind::Error)
                .await;
            return Err(e.into());
        }

        self.inner.session().mark_committed(target.clone())?;
        self.inner.publish(false);
        info!(path = %target.display(), key = %key, "recording committed");
        Ok(target)
    }
}

impl<C, S, N> Inner<C, S, N>
where
    C: AudioCapture + 'static,
    S: FileStorage + 'static,
    N: Notifier + 'static,
{
    fn session(&self) -> MutexGuard<'_, RecordingSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, limit_reached: bool) {
        let status = {
            let session = self.session();
            SessionStatus {
                state: session.state(),
                elapsed_seconds: session.elapsed_seconds(),
                limit_reached,
            }
        };
        self.status.send_replace(status);
    }

    async fn notify(&self, message: &str, kind: NoticeKind) {
        if let Err(e) = self.notifier.notify(NOTIFICATION_TITLE, message, kind).await {
            debug!(error = %e, "notification not shown");
        }
    }

    /// Acquire the capture resource, forcing a release and retrying once
    /// when the platform reports it busy
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        match self.capture.acquire().await {
            Err(CaptureError::ResourceBusy) => {
                warn!("capture resource busy, forcing release and retrying");
                self.capture.force_release().await;
                self.capture.acquire().await
            }
            other => other,
        }
    }

    /// Release everything an earlier session may still hold
    async fn teardown(&self, slot: &mut Option<Box<dyn CaptureHandle>>) {
        self.abort_ticker();

        let mut orphaned = None;
        if let Some(mut handle) = slot.take() {
            debug!("releasing capture handle from previous session");
            match handle.stop_and_release().await {
                Ok(path) => orphaned = Some(path),
                Err(e) => warn!(error = %e, "ignoring error from stale capture handle"),
            }
        }

        let uncommitted = {
            let mut session = self.session();
            let file = (!session.is_committed())
                .then(|| session.local_file().map(|p| p.to_path_buf()))
                .flatten();
            session.reset();
            file
        };

        for path in orphaned.into_iter().chain(uncommitted) {
            if let Err(e) = self.storage.delete(&path, true).await {
                warn!(error = %e, "failed to discard capture file");
            }
        }
    }

    async fn stop_locked(
        &self,
        slot: &mut Option<Box<dyn CaptureHandle>>,
        reason: StopReason,
    ) -> Result<PathBuf, RecordingError> {
        self.session().ensure_can_stop()?;
        match reason {
            StopReason::Requested => self.abort_ticker(),
            // The ticker is the caller; detach instead of aborting it.
            StopReason::LimitReached => drop(self.ticker().take()),
        }

        let Some(mut handle) = slot.take() else {
            error!("session active without a capture handle");
            self.session().reset();
            self.publish(false);
            return Err(RecordingError::NoActiveCapture);
        };

        match handle.stop_and_release().await {
            Ok(path) => {
                self.session().stop(path.clone())?;
                let limit_reached = reason == StopReason::LimitReached;
                self.publish(limit_reached);
                info!(
                    elapsed = self.session().elapsed_seconds(),
                    path = %path.display(),
                    limit_reached,
                    "recording stopped"
                );
                if limit_reached {
                    let message = format!(
                        "Maximum recording time of {} reached",
                        self.config.max_duration.as_clock()
                    );
                    self.notify(&message, NoticeKind::Limit).await;
                } else if self.config.enable_notify {
                    self.notify("Recording stopped", NoticeKind::Success)
                        .await;
                }
                Ok(path)
            }
            Err(e) => {
                error!(error = %e, "failed to stop capture");
                drop(handle);
                self.capture.force_release().await;
                self.session().reset();
                self.publish(false);
                self.notify(&failure_message(&e), NoticeKind::Error)
                    .await;
                Err(e.into())
            }
        }
    }

    /// Apply a forced stop the ticker has not delivered yet. A tick can
    /// reach the limit while a pause or resume already holds the slot.
    async fn stop_at_limit(
        &self,
        slot: &mut Option<Box<dyn CaptureHandle>>,
    ) -> Result<bool, RecordingError> {
        let at_limit = {
            let session = self.session();
            (session.is_recording() || session.is_paused()) && session.remaining().as_secs() == 0
        };
        if !at_limit {
            return Ok(false);
        }
        debug!("duration limit pending, stopping instead");
        self.abort_ticker();
        self.stop_locked(slot, StopReason::LimitReached).await?;
        Ok(true)
    }

    async fn auto_stop(&self) {
        let mut slot = self.slot.lock().await;
        if !self.session().is_recording() {
            debug!("duration limit reached after session moved on, ignoring");
            return;
        }
        if let Err(e) = self.stop_locked(&mut slot, StopReason::LimitReached).await {
            warn!(error = %e, "automatic stop failed");
        }
    }

    /// Copy the temporary file over the stable target and remove the source
    async fn store(&self, temp: &Path, target: &Path) -> Result<(), StorageError> {
        if self.storage.exists(target).await {
            self.storage.delete(target, true).await?;
        }
        self.storage.copy(temp, target).await?;
        self.storage.delete(temp, true).await
    }

    fn abort_ticker(&self) {
        if let Some(task) = self.ticker().take() {
            task.abort();
        }
    }

    /// Start the 1 Hz elapsed-time tick for the current session
    fn spawn_ticker(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = std::time::Duration::from_secs(1);

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { break };

                let outcome = inner.session().tick();
                match outcome {
                    TickOutcome::Counted => inner.publish(false),
                    TickOutcome::LimitReached => {
                        inner.publish(false);
                        inner.auto_stop().await;
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        });

        if let Some(previous) = self.ticker().replace(task) {
            previous.abort();
        }
    }
}

fn failure_message(error: &CaptureError) -> String {
    match error {
        CaptureError::PermissionDenied => {
            "Microphone access is required to record. Allow it in your system settings."
                .to_string()
        }
        other => format!("Recording could not start: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NotificationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CaptureCounters {
        acquired: AtomicUsize,
        released: AtomicUsize,
        forced: AtomicUsize,
        busy_once: AtomicBool,
        deny: AtomicBool,
        fail_start: AtomicBool,
        fail_next_stop: AtomicBool,
        acquire_delay_ms: AtomicUsize,
    }

    struct MockCapture {
        counters: Arc<CaptureCounters>,
        dir: PathBuf,
    }

    struct MockHandle {
        counters: Arc<CaptureCounters>,
        path: PathBuf,
        fail_stop: bool,
    }

    #[async_trait]
    impl AudioCapture for MockCapture {
        async fn acquire(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
            let delay = self.counters.acquire_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(StdDuration::from_millis(delay as u64)).await;
            }
            if self.counters.deny.load(Ordering::SeqCst) {
                return Err(CaptureError::PermissionDenied);
            }
            if self.counters.busy_once.swap(false, Ordering::SeqCst) {
                return Err(CaptureError::ResourceBusy);
            }
            let n = self.counters.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockHandle {
                counters: Arc::clone(&self.counters),
                path: self.dir.join(format!("capture-{n}.wav")),
                fail_stop: self.counters.fail_next_stop.swap(false, Ordering::SeqCst),
            }))
        }

        async fn force_release(&self) {
            self.counters.forced.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CaptureHandle for MockHandle {
        async fn start(&mut self) -> Result<(), CaptureError> {
            if self.counters.fail_start.load(Ordering::SeqCst) {
                return Err(CaptureError::Failed("device vanished".into()));
            }
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        async fn resume(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        async fn stop_and_release(&mut self) -> Result<PathBuf, CaptureError> {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                return Err(CaptureError::Failed("stale handle".into()));
            }
            std::fs::write(&self.path, b"RIFF....WAVE").map_err(|e| CaptureError::Failed(e.to_string()))?;
            Ok(self.path.clone())
        }
    }

    #[derive(Default)]
    struct MockStorage {
        fail_copies: AtomicUsize,
    }

    #[async_trait]
    impl FileStorage for MockStorage {
        async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
            let failing = self.fail_copies.load(Ordering::SeqCst);
            if failing > 0 {
                self.fail_copies.store(failing - 1, Ordering::SeqCst);
                return Err(StorageError::CopyFailed {
                    from: from.display().to_string(),
                    to: to.display().to_string(),
                    message: "disk full".into(),
                });
            }
            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::copy(from, to).unwrap();
            Ok(())
        }

        async fn delete(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
            match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if idempotent && e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::DeleteFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }),
            }
        }

        async fn exists(&self, path: &Path) -> bool {
            path.exists()
        }

        async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
            Ok(std::fs::read(path).unwrap())
        }

        async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
            std::fs::write(path, data).unwrap();
            Ok(())
        }

        async fn size(&self, path: &Path) -> Result<u64, StorageError> {
            Ok(std::fs::metadata(path).unwrap().len())
        }
    }

    #[derive(Default, Clone)]
    struct MockNotifier {
        sent: Arc<StdMutex<Vec<(String, NoticeKind)>>>,
    }

    impl MockNotifier {
        fn count(&self, kind: NoticeKind) -> usize {
            self.sent.lock().unwrap().iter().filter(|(_, i)| *i == kind).count()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(
            &self,
            _title: &str,
            message: &str,
            kind: NoticeKind,
        ) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push((message.to_string(), kind));
            Ok(())
        }
    }

    struct Fixture {
        manager: RecordingSessionManager<MockCapture, Arc<MockStorage>, MockNotifier>,
        counters: Arc<CaptureCounters>,
        storage: Arc<MockStorage>,
        notifier: MockNotifier,
        temp_dir: TempDir,
        cache_dir: TempDir,
    }

    #[async_trait]
    impl FileStorage for Arc<MockStorage> {
        async fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
            self.as_ref().copy(from, to).await
        }
        async fn delete(&self, path: &Path, idempotent: bool) -> Result<(), StorageError> {
            self.as_ref().delete(path, idempotent).await
        }
        async fn exists(&self, path: &Path) -> bool {
            self.as_ref().exists(path).await
        }
        async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
            self.as_ref().read(path).await
        }
        async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
            self.as_ref().write(path, data).await
        }
        async fn size(&self, path: &Path) -> Result<u64, StorageError> {
            self.as_ref().size(path).await
        }
    }

    fn fixture(max_secs: u64) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let counters = Arc::new(CaptureCounters::default());
        let storage = Arc::new(MockStorage::default());
        let notifier = MockNotifier::default();
        let manager = RecordingSessionManager::new(
            MockCapture {
                counters: Arc::clone(&counters),
                dir: temp_dir.path().to_path_buf(),
            },
            Arc::clone(&storage),
            notifier.clone(),
            RecordingConfig {
                max_duration: Duration::from_secs(max_secs),
                cache_dir: cache_dir.path().to_path_buf(),
                enable_notify: false,
            },
        );
        Fixture {
            manager,
            counters,
            storage,
            notifier,
            temp_dir,
            cache_dir,
        }
    }

    fn date() -> DiaryDate {
        DiaryDate::from_ymd(2024, 3, 15).unwrap()
    }

    async fn advance(millis: u64) {
        tokio::time::sleep(StdDuration::from_millis(millis)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_stop_commit_scenario() {
        let f = fixture(300);

        f.manager.start(date()).await.unwrap();
        assert_eq!(f.manager.state(), SessionState::Recording);

        advance(5_500).await;
        f.manager.pause().await.unwrap();
        assert_eq!(f.manager.elapsed_seconds(), 5);

        advance(10_000).await;
        assert_eq!(f.manager.elapsed_seconds(), 5);

        f.manager.resume().await.unwrap();
        assert_eq!(f.manager.elapsed_seconds(), 5);

        advance(3_200).await;
        let temp = f.manager.stop().await.unwrap();
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.manager.elapsed_seconds(), 8);
        assert_eq!(f.manager.local_file(), Some(temp.clone()));
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);

        advance(5_000).await;
        assert_eq!(f.manager.elapsed_seconds(), 8);

        let stable = f.manager.commit(Some(DiaryId::new(42))).await.unwrap();
        assert_eq!(stable, f.cache_dir.path().join("voice_42.wav"));
        assert!(stable.exists());
        assert!(!temp.exists());
        assert_eq!(f.manager.local_file(), Some(stable));
    }

    #[tokio::test(start_paused = true)]
    async fn start_stop_releases_exactly_once() {
        let f = fixture(300);
        f.manager.start(date()).await.unwrap();
        advance(2_500).await;
        f.manager.stop().await.unwrap();

        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert!(f.manager.local_file().is_some());
        assert_eq!(f.counters.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_tears_down_previous_handle() {
        let f = fixture(300);
        f.counters.fail_next_stop.store(true, Ordering::SeqCst);
        f.manager.start(date()).await.unwrap();
        advance(4_500).await;
        assert_eq!(f.manager.elapsed_seconds(), 4);

        f.manager.start(date()).await.unwrap();
        assert_eq!(f.manager.state(), SessionState::Recording);
        assert_eq!(f.manager.elapsed_seconds(), 0);
        assert_eq!(f.counters.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);

        advance(1_500).await;
        assert_eq!(f.manager.elapsed_seconds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_paused_releases_previous_handle() {
        let f = fixture(300);
        f.manager.start(date()).await.unwrap();
        f.manager.pause().await.unwrap();

        f.manager.start(date()).await.unwrap();
        assert_eq!(f.manager.state(), SessionState::Recording);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_dir(f.temp_dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn busy_resource_is_forced_and_retried_once() {
        let f = fixture(300);
        f.counters.busy_once.store(true, Ordering::SeqCst);

        f.manager.start(date()).await.unwrap();
        assert_eq!(f.manager.state(), SessionState::Recording);
        assert_eq!(f.counters.forced.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.count(NoticeKind::Error), 0);
    }

    #[tokio::test]
    async fn permission_denied_stays_idle() {
        let f = fixture(300);
        f.counters.deny.store(true, Ordering::SeqCst);

        let result = f.manager.start(date()).await;
        assert!(matches!(
            result,
            Err(RecordingError::Capture(CaptureError::PermissionDenied))
        ));
        assert_eq!(f.manager.state(), SessionState::Idle);
        assert_eq!(f.counters.acquired.load(Ordering::SeqCst), 0);
        assert_eq!(f.notifier.count(NoticeKind::Error), 1);
    }

    #[tokio::test]
    async fn start_failure_clears_resource() {
        let f = fixture(300);
        f.counters.fail_start.store(true, Ordering::SeqCst);

        assert!(f.manager.start(date()).await.is_err());
        assert_eq!(f.manager.state(), SessionState::Idle);
        assert_eq!(f.counters.forced.load(Ordering::SeqCst), 1);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_forces_exactly_one_stop() {
        let f = fixture(3);
        let mut status = f.manager.subscribe();
        f.manager.start(date()).await.unwrap();

        advance(10_500).await;
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.manager.elapsed_seconds(), 3);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.count(NoticeKind::Limit), 1);
        assert!(f.manager.local_file().is_some());

        let latest = *status.borrow_and_update();
        assert!(latest.limit_reached);
        assert_eq!(latest.state, SessionState::Stopped);

        let stable = f.manager.commit(None).await.unwrap();
        assert_eq!(stable, f.cache_dir.path().join("recording_2024-03-15.wav"));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_queued_behind_limit_tick_stops_instead() {
        let f = fixture(3);
        let mut status = f.manager.subscribe();
        f.manager.start(date()).await.unwrap();
        advance(2_500).await;

        // Hold the slot so the pause queues first and the limit tick second
        let guard = f.manager.inner.slot.lock().await;
        let (paused, ()) = tokio::join!(f.manager.pause(), async {
            advance(1_000).await;
            assert_eq!(f.manager.elapsed_seconds(), 3);
            drop(guard);
        });

        paused.unwrap();
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert!(status.borrow_and_update().limit_reached);

        advance(5_000).await;
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.manager.elapsed_seconds(), 3);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
        assert_eq!(f.notifier.count(NoticeKind::Limit), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_reached_while_paused_stops_on_resume() {
        let f = fixture(3);
        f.manager.start(date()).await.unwrap();
        advance(2_500).await;
        f.manager.pause().await.unwrap();
        advance(60_000).await;
        assert_eq!(f.manager.state(), SessionState::Paused);

        f.manager.resume().await.unwrap();
        advance(1_500).await;
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.manager.elapsed_seconds(), 3);
        assert_eq!(f.notifier.count(NoticeKind::Limit), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_start_is_applied_after_start() {
        let f = fixture(300);
        f.counters.acquire_delay_ms.store(200, Ordering::SeqCst);

        let (started, stopped) = tokio::join!(f.manager.start(date()), f.manager.stop());
        assert!(started.is_ok());
        assert!(stopped.is_ok());
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn commit_retry_after_io_error() {
        let f = fixture(300);
        let stable = f.cache_dir.path().join("voice_7.wav");
        std::fs::write(&stable, b"old recording").unwrap();

        f.manager.start(date()).await.unwrap();
        let temp = f.manager.stop().await.unwrap();

        f.storage.fail_copies.store(1, Ordering::SeqCst);
        let failed = f.manager.commit(Some(DiaryId::new(7))).await;
        assert!(matches!(failed, Err(RecordingError::Storage(_))));
        assert_eq!(f.manager.state(), SessionState::Stopped);
        assert_eq!(f.manager.local_file(), Some(temp.clone()));
        assert!(temp.exists());

        let committed = f.manager.commit(Some(DiaryId::new(7))).await.unwrap();
        assert_eq!(committed, stable);
        assert_eq!(std::fs::read(&stable).unwrap(), b"RIFF....WAVE");
        assert!(!temp.exists());
        assert_eq!(std::fs::read_dir(f.cache_dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn second_commit_is_rejected() {
        let f = fixture(300);
        f.manager.start(date()).await.unwrap();
        f.manager.stop().await.unwrap();
        f.manager.commit(Some(DiaryId::new(1))).await.unwrap();

        let again = f.manager.commit(Some(DiaryId::new(1))).await;
        assert!(matches!(again, Err(RecordingError::InvalidState(_))));
    }

    #[tokio::test]
    async fn invalid_transitions_leave_state_unchanged() {
        let f = fixture(300);
        let err = f.manager.pause().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot pause recording while idle"
        );
        assert!(f.manager.resume().await.is_err());
        assert!(f.manager.stop().await.is_err());
        assert!(f.manager.commit(None).await.is_err());
        assert_eq!(f.manager.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn reset_is_idempotent_and_discards_capture() {
        let f = fixture(300);
        f.manager.reset().await;
        assert_eq!(f.manager.state(), SessionState::Idle);

        f.manager.start(date()).await.unwrap();
        let temp = f.manager.stop().await.unwrap();
        assert!(temp.exists());

        f.manager.reset().await;
        f.manager.reset().await;
        assert_eq!(f.manager.state(), SessionState::Idle);
        assert!(f.manager.local_file().is_none());
        assert!(!temp.exists());
        assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
    }
}
