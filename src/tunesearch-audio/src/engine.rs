use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use thiserror::Error;

/// Audio playback errors.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio backend unavailable: {0}")]
    Backend(String),
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("{0}")]
    Other(String),
}

pub type AudioResult<T> = Result<T, AudioError>;

/// Runtime playback state for a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Playing,
    Completed,
    Stopped,
    Error,
}

impl AudioState {
    pub fn is_finished(self) -> bool {
        !matches!(self, AudioState::Playing)
    }
}

pub(crate) type SharedState = Arc<Mutex<AudioState>>;

pub(crate) fn read_state(state: &SharedState) -> AudioState {
    *state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_state(state: &SharedState, value: AudioState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

/// An open playback resource.
///
/// Releasing happens exactly once, either through [`AudioHandle::stop`] or when
/// the handle is dropped: the worker thread is told to stop and joined, and any
/// backend resources kept alive by the handle are dropped.
pub struct AudioHandle {
    state: SharedState,
    stop_flag: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
    keepalive: Option<Box<dyn Send>>,
}

impl std::fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl AudioHandle {
    pub(crate) fn new(
        state: SharedState,
        stop_flag: Arc<AtomicBool>,
        join: JoinHandle<()>,
        keepalive: Option<Box<dyn Send>>,
    ) -> Self {
        Self {
            state,
            stop_flag,
            join: Some(join),
            keepalive,
        }
    }

    pub(crate) fn spawn_simulated(duration: Duration, keepalive: Box<dyn Send>) -> Self {
        let state = Arc::new(Mutex::new(AudioState::Playing));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let state_clone = state.clone();
        let stop_clone = stop_flag.clone();

        let join = thread::spawn(move || {
            let tick = Duration::from_millis(10);
            let mut elapsed = Duration::ZERO;
            while elapsed < duration && !stop_clone.load(Ordering::SeqCst) {
                thread::sleep(tick);
                elapsed += tick;
            }
            if stop_clone.load(Ordering::SeqCst) {
                write_state(&state_clone, AudioState::Stopped);
            } else {
                write_state(&state_clone, AudioState::Completed);
            }
        });

        Self::new(state, stop_flag, join, Some(keepalive))
    }

    pub fn state(&self) -> AudioState {
        read_state(&self.state)
    }

    pub fn stop(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
        let _ = self.keepalive.take();
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Audio backend interface: open a URL and start playing it.
pub trait AudioEngine: Send + Sync {
    fn play(&self, url: &str) -> AudioResult<AudioHandle>;
}

/// Length of a catalog preview clip.
pub const PREVIEW_LENGTH: Duration = Duration::from_secs(30);

/// Audio engine that only simulates playback, for tests and headless runs.
///
/// Clones share a counter of handles that are still open, which lets callers
/// check that every handle they acquired was released.
#[derive(Debug, Clone)]
pub struct NullAudioEngine {
    duration: Duration,
    open: Arc<AtomicUsize>,
}

impl Default for NullAudioEngine {
    fn default() -> Self {
        Self::with_duration(PREVIEW_LENGTH)
    }
}

impl NullAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

struct OpenHandle(Arc<AtomicUsize>);

impl Drop for OpenHandle {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AudioEngine for NullAudioEngine {
    fn play(&self, url: &str) -> AudioResult<AudioHandle> {
        if url.trim().is_empty() {
            return Err(AudioError::UnsupportedSource("empty url".into()));
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        let guard = OpenHandle(self.open.clone());
        Ok(AudioHandle::spawn_simulated(self.duration, Box::new(guard)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_engine_completes() {
        let engine = NullAudioEngine::with_duration(Duration::from_millis(50));
        let handle = engine
            .play("https://example.test/a.m4a")
            .expect("null engine should succeed");
        thread::sleep(Duration::from_millis(300));
        assert_eq!(handle.state(), AudioState::Completed);
        assert!(handle.state().is_finished());
    }

    #[test]
    fn handle_can_stop_early() {
        let engine = NullAudioEngine::new();
        let handle = engine
            .play("https://example.test/a.m4a")
            .expect("null engine should succeed");
        assert_eq!(handle.state(), AudioState::Playing);
        assert_eq!(engine.open_handles(), 1);
        handle.stop();
        assert_eq!(engine.open_handles(), 0);
    }

    #[test]
    fn dropping_a_handle_releases_it() {
        let engine = NullAudioEngine::new();
        {
            let _first = engine.play("https://example.test/a.m4a").expect("play");
            let _second = engine.play("https://example.test/b.m4a").expect("play");
            assert_eq!(engine.open_handles(), 2);
        }
        assert_eq!(engine.open_handles(), 0);
    }

    #[test]
    fn empty_url_is_rejected() {
        let engine = NullAudioEngine::new();
        let err = engine.play("  ").expect_err("empty url should fail");
        assert!(matches!(err, AudioError::UnsupportedSource(_)));
        assert_eq!(engine.open_handles(), 0);
    }
}
