use std::sync::Arc;

use thiserror::Error;
use tunesearch_audio::{AudioEngine, AudioHandle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("failed to start preview: {reason}")]
    AcquisitionFailed { reason: String },
}

/// What a [`PreviewPlayer::play`] call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// The url was already playing and has been stopped.
    Stopped,
    /// Nothing is playing; the failure has already been logged.
    Failed(PlaybackError),
}

struct ActivePreview {
    url: String,
    handle: AudioHandle,
}

/// Plays at most one preview clip at a time.
///
/// The active url and its open handle live and die together, so a url is
/// reported as active only while its handle is held. Dropping the player
/// releases whatever is still open.
pub struct PreviewPlayer {
    engine: Arc<dyn AudioEngine>,
    active: Option<ActivePreview>,
}

impl std::fmt::Debug for PreviewPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewPlayer")
            .field("active_url", &self.active_url())
            .finish_non_exhaustive()
    }
}

impl PreviewPlayer {
    pub fn new(engine: Arc<dyn AudioEngine>) -> Self {
        Self {
            engine,
            active: None,
        }
    }

    pub fn active_url(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.url.as_str())
    }

    pub fn is_playing(&self, url: &str) -> bool {
        !url.is_empty() && self.active_url() == Some(url)
    }

    /// Toggles `url`: stops it if it is the active preview, otherwise releases
    /// the active one and starts `url`.
    pub fn play(&mut self, url: &str) -> PlayOutcome {
        self.reap_finished();
        if self.is_playing(url) {
            self.stop();
            return PlayOutcome::Stopped;
        }

        self.stop();
        if url.trim().is_empty() {
            return self.failed(url, "no preview available".into());
        }

        match self.engine.play(url) {
            Ok(handle) => {
                tracing::info!(%url, "preview started");
                self.active = Some(ActivePreview {
                    url: url.to_string(),
                    handle,
                });
                PlayOutcome::Started
            }
            Err(err) => self.failed(url, err.to_string()),
        }
    }

    /// Releases the active preview, if any.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(url = %active.url, "preview stopped");
            active.handle.stop();
        }
    }

    /// Final release before the owning screen goes away. Safe to call more
    /// than once; `Drop` calls it too.
    pub fn dispose(&mut self) {
        self.stop();
    }

    /// Releases the active preview if it finished on its own (clip ended or
    /// the backend errored). Returns whether anything was released.
    pub fn reap_finished(&mut self) -> bool {
        let finished = self
            .active
            .as_ref()
            .is_some_and(|active| active.handle.state().is_finished());
        if finished {
            self.stop();
        }
        finished
    }

    fn failed(&self, url: &str, reason: String) -> PlayOutcome {
        tracing::warn!(%url, %reason, "failed to start preview");
        PlayOutcome::Failed(PlaybackError::AcquisitionFailed { reason })
    }
}

impl Drop for PreviewPlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}
