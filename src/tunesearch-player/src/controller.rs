use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tunesearch_core::{map_results, NetworkResult, SearchResponse, SearchResultItem, SearchService};

/// Coarse request status, derived from [`SearchPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Loading,
    Success {
        items: Vec<SearchResultItem>,
    },
    Error {
        message: String,
    },
}

/// Immutable snapshot of the search screen state.
///
/// The controller never edits a published snapshot; each transition publishes
/// a new one, so status, items and error always change together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    query: String,
    phase: SearchPhase,
}

impl SearchState {
    fn loading(query: String) -> Self {
        Self {
            query,
            phase: SearchPhase::Loading,
        }
    }

    fn settled(query: String, result: NetworkResult<SearchResponse>) -> Self {
        let phase = match result {
            Ok(response) => SearchPhase::Success {
                items: map_results(response),
            },
            Err(err) => SearchPhase::Error {
                message: format!("Error: {err}"),
            },
        };
        Self { query, phase }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> &SearchPhase {
        &self.phase
    }

    pub fn status(&self) -> SearchStatus {
        match self.phase {
            SearchPhase::Idle => SearchStatus::Idle,
            SearchPhase::Loading => SearchStatus::Loading,
            SearchPhase::Success { .. } => SearchStatus::Success,
            SearchPhase::Error { .. } => SearchStatus::Error,
        }
    }

    /// Result rows; empty unless the last search succeeded.
    pub fn items(&self) -> &[SearchResultItem] {
        match &self.phase {
            SearchPhase::Success { items } => items.as_slice(),
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            SearchPhase::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// A search that has entered Loading but whose response is not applied yet.
#[derive(Debug)]
pub struct SearchTicket {
    seq: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Owns the request lifecycle of one search screen.
///
/// Clones share the same state and sequence counter. Every accepted submit
/// takes the next sequence number; a response is applied only if its number is
/// still the latest, otherwise it is dropped without a transition. The counter
/// and the published state are updated under the same lock, so a stale
/// response can never land between a newer Loading and its result.
#[derive(Clone)]
pub struct SearchController {
    service: Arc<dyn SearchService>,
    state: Arc<watch::Sender<SearchState>>,
    latest: Arc<Mutex<u64>>,
}

impl SearchController {
    pub fn new(service: Arc<dyn SearchService>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            service,
            state: Arc::new(state),
            latest: Arc::new(Mutex::new(0)),
        }
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Starts a search for the trimmed `query` on the current tokio runtime.
    ///
    /// Blank queries are ignored and return `None`. Otherwise the state is
    /// Loading by the time this returns.
    pub fn submit(&self, query: &str) -> Option<JoinHandle<()>> {
        let ticket = self.begin(query)?;
        let controller = self.clone();
        Some(tokio::spawn(async move { controller.complete(ticket).await }))
    }

    /// First half of [`submit`](Self::submit): validates the query and
    /// publishes Loading.
    pub fn begin(&self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("ignoring blank search query");
            return None;
        }

        let mut latest = self.lock_latest();
        *latest += 1;
        let ticket = SearchTicket {
            seq: *latest,
            query: query.to_string(),
        };
        self.state
            .send_replace(SearchState::loading(ticket.query.clone()));
        tracing::info!(seq = ticket.seq, query = %ticket.query, "search started");
        Some(ticket)
    }

    /// Second half of [`submit`](Self::submit): runs the request and applies
    /// its result unless a newer search was started meanwhile.
    pub async fn complete(&self, ticket: SearchTicket) {
        let result = self.service.search(&ticket.query).await;
        if let Err(err) = &result {
            tracing::warn!(
                provider = self.service.id(),
                seq = ticket.seq,
                error = %err,
                "search failed"
            );
        }

        let latest = self.lock_latest();
        if *latest != ticket.seq {
            tracing::debug!(
                seq = ticket.seq,
                latest = *latest,
                "discarding stale search response"
            );
            return;
        }
        let state = SearchState::settled(ticket.query, result);
        tracing::info!(
            seq = ticket.seq,
            status = ?state.status(),
            results = state.items().len(),
            "search finished"
        );
        self.state.send_replace(state);
    }

    fn lock_latest(&self) -> MutexGuard<'_, u64> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
