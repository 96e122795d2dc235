//! Cross-platform audio capture using cpal
//!
//! Captures mono 16-bit PCM from the default input device and writes it
//! to a temporary WAV file with hound when the capture is stopped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfigRange};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::application::ports::{AudioCapture, CaptureError, CaptureHandle};

/// Preferred capture rate for speech
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Audio capture backed by the default cpal input device.
///
/// Only one handle may hold the device at a time. `owner` carries the token
/// of the holding handle, 0 when the device is free.
pub struct CpalCapture {
    owner: Arc<AtomicU64>,
    next_token: AtomicU64,
    temp_dir: PathBuf,
}

impl CpalCapture {
    /// Create a capture writing temporary files to the system temp dir
    pub fn new() -> Self {
        Self::with_temp_dir(std::env::temp_dir())
    }

    pub fn with_temp_dir(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            owner: Arc::new(AtomicU64::new(0)),
            next_token: AtomicU64::new(1),
            temp_dir: temp_dir.into(),
        }
    }

    /// Whether a handle currently holds the device
    pub fn is_active(&self) -> bool {
        self.owner.load(Ordering::SeqCst) != 0
    }

    fn temp_file(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        self.temp_dir
            .join(format!("memento-capture-{}-{}.wav", std::process::id(), stamp))
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoDevice)
    }

    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let ranges = device
            .supported_input_configs()
            .map_err(|e| classify(e.to_string()))?;
        pick_config(ranges)
            .ok_or_else(|| CaptureError::Failed("No suitable input config".into()))
    }
}

/// Prefer ranges that can run at 16 kHz, then fewer channels, then the
/// lowest rate. Only i16 and f32 samples are handled by the writer.
fn pick_config(
    ranges: impl IntoIterator<Item = SupportedStreamConfigRange>,
) -> Option<(StreamConfig, SampleFormat)> {
    ranges
        .into_iter()
        .filter(|r| matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .map(|r| {
            let covers =
                (r.min_sample_rate().0..=r.max_sample_rate().0).contains(&TARGET_SAMPLE_RATE);
            let rate = if covers {
                SampleRate(TARGET_SAMPLE_RATE)
            } else {
                r.min_sample_rate()
            };
            (covers, r, rate)
        })
        .min_by_key(|(covers, r, rate)| (!covers, r.channels(), rate.0))
        .map(|(_, r, rate)| {
            let config = StreamConfig {
                channels: r.channels(),
                sample_rate: rate,
                buffer_size: cpal::BufferSize::Default,
            };
            (config, r.sample_format())
        })
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>, CaptureError> {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        if self
            .owner
            .compare_exchange(0, token, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CaptureError::ResourceBusy);
        }
        if let Err(e) = Self::input_device() {
            self.owner.store(0, Ordering::SeqCst);
            return Err(e);
        }

        let path = self.temp_file();
        debug!(path = %path.display(), token, "capture device acquired");
        Ok(Box::new(CpalHandle::new(Arc::clone(&self.owner), token, path)))
    }

    async fn force_release(&self) {
        if self.owner.swap(0, Ordering::SeqCst) != 0 {
            warn!("forcibly released capture device");
        }
    }
}

/// One capture on the cpal device.
///
/// The cpal stream is not `Send`, so it lives on a dedicated thread for the
/// lifetime of the capture.
pub struct CpalHandle {
    owner: Arc<AtomicU64>,
    token: u64,
    path: PathBuf,
    samples: Arc<StdMutex<Vec<i16>>>,
    sample_rate: Arc<AtomicU32>,
    capturing: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalHandle {
    fn new(owner: Arc<AtomicU64>, token: u64, path: PathBuf) -> Self {
        Self {
            owner,
            token,
            path,
            samples: Arc::new(StdMutex::new(Vec::new())),
            sample_rate: Arc::new(AtomicU32::new(0)),
            capturing: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    fn release(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.capturing.store(false, Ordering::SeqCst);
        // A forced release may already have handed the device to someone else
        let _ = self
            .owner
            .compare_exchange(self.token, 0, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Mix interleaved multi-channel audio down to mono
    fn to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels <= 1 {
            return samples.to_vec();
        }

        samples
            .chunks(channels as usize)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / chunk.len() as i32) as i16
            })
            .collect()
    }

    fn run_stream(
        samples: Arc<StdMutex<Vec<i16>>>,
        sample_rate: Arc<AtomicU32>,
        capturing: Arc<AtomicBool>,
        running: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<(), CaptureError>>,
    ) {
        let stream = match Self::build_stream(samples, &sample_rate, capturing) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        if let Err(e) = stream.play() {
            let _ = ready.send(Err(classify(e.to_string())));
            return;
        }
        let _ = ready.send(Ok(()));

        while running.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        drop(stream);
    }

    fn build_stream(
        samples: Arc<StdMutex<Vec<i16>>>,
        sample_rate: &AtomicU32,
        capturing: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, CaptureError> {
        let device = CpalCapture::input_device()?;
        let (config, sample_format) = CpalCapture::input_config(&device)?;
        let channels = config.channels;
        sample_rate.store(config.sample_rate.0, Ordering::SeqCst);

        let on_error = |err: cpal::StreamError| error!(error = %err, "audio input stream error");

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if capturing.load(Ordering::SeqCst) {
                        let mono = Self::to_mono(data, channels);
                        if let Ok(mut buffer) = samples.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if capturing.load(Ordering::SeqCst) {
                        let pcm: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                            .collect();
                        let mono = Self::to_mono(&pcm, channels);
                        if let Ok(mut buffer) = samples.lock() {
                            buffer.extend_from_slice(&mono);
                        }
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(CaptureError::Failed(format!(
                    "Unsupported sample format: {other:?}"
                )))
            }
        };

        stream.map_err(|e| classify(e.to_string()))
    }
}

#[async_trait]
impl CaptureHandle for CpalHandle {
    async fn start(&mut self) -> Result<(), CaptureError> {
        if self.thread.is_some() {
            return Err(CaptureError::Failed("Capture already started".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        self.capturing.store(true, Ordering::SeqCst);

        let (ready_tx, ready_rx) = oneshot::channel();
        let samples = Arc::clone(&self.samples);
        let sample_rate = Arc::clone(&self.sample_rate);
        let capturing = Arc::clone(&self.capturing);
        let running = Arc::clone(&self.running);

        self.thread = Some(std::thread::spawn(move || {
            Self::run_stream(samples, sample_rate, capturing, running, ready_tx)
        }));

        let started = ready_rx
            .await
            .unwrap_or_else(|_| Err(CaptureError::Failed("Capture thread exited".into())));
        if started.is_err() {
            self.running.store(false, Ordering::SeqCst);
            self.capturing.store(false, Ordering::SeqCst);
        }
        started
    }

    async fn pause(&mut self) -> Result<(), CaptureError> {
        self.capturing.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CaptureError::Failed("Capture stream is not running".into()));
        }
        self.capturing.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_and_release(&mut self) -> Result<PathBuf, CaptureError> {
        self.release();

        if let Some(thread) = self.thread.take() {
            tokio::task::spawn_blocking(move || thread.join())
                .await
                .map_err(|e| CaptureError::Failed(format!("Task join error: {}", e)))?
                .map_err(|_| CaptureError::Failed("Capture thread panicked".into()))?;
        }

        let samples = std::mem::take(
            &mut *self.samples.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let sample_rate = match self.sample_rate.load(Ordering::SeqCst) {
            0 => TARGET_SAMPLE_RATE,
            rate => rate,
        };
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_wav(&path, &samples, sample_rate))
            .await
            .map_err(|e| CaptureError::Failed(format!("Task join error: {}", e)))??;

        debug!(path = %self.path.display(), sample_rate, "capture written");
        Ok(self.path.clone())
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Write mono 16-bit PCM samples as a WAV file
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), CaptureError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let to_error = |e: hound::Error| CaptureError::Failed(format!("Failed to write WAV: {}", e));

    let mut writer = hound::WavWriter::create(path, spec).map_err(to_error)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(to_error)?;
    }
    writer.finalize().map_err(to_error)
}

/// Map a platform error message onto the capture error taxonomy
fn classify(message: String) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not authorized") || lower.contains("denied")
    {
        CaptureError::PermissionDenied
    } else if lower.contains("no longer available")
        || lower.contains("not available")
        || lower.contains("no such device")
    {
        CaptureError::NoDevice
    } else {
        CaptureError::Failed(message)
    }
}
