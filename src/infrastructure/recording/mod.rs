//! Recording infrastructure module
//!
//! Cross-platform audio capture using cpal. Captured audio is stored as
//! mono 16-bit WAV.

mod cpal_capture;

pub use cpal_capture::{write_wav, CpalCapture, CpalHandle, TARGET_SAMPLE_RATE};

/// Create the default capture for the current platform
pub fn create_capture() -> CpalCapture {
    CpalCapture::new()
}
