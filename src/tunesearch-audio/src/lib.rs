mod engine;
#[cfg(feature = "cpal-backend")]
mod real;

pub use engine::{
    AudioEngine, AudioError, AudioHandle, AudioResult, AudioState, NullAudioEngine,
    PREVIEW_LENGTH,
};
#[cfg(feature = "cpal-backend")]
pub use real::CpalAudioEngine;
