mod controller;
mod preview;

pub use controller::{SearchController, SearchPhase, SearchState, SearchStatus, SearchTicket};
pub use preview::{PlayOutcome, PlaybackError, PreviewPlayer};
