//! Audio playback adapters

mod rodio;

pub use self::rodio::{RodioPlayback, RodioSound};
