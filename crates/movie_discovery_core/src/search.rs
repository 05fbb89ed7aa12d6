//! crates/movie_discovery_core/src/search.rs
//!
//! Debounced free-text search with pagination over the catalog.
//!
//! Input is committed only after a quiet period. Each fetch carries a sequence
//! number, and a response is applied only if no newer fetch was issued after it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::{Movie, MoviePage};
use crate::ports::{CatalogGateway, PortResult, SearchUsageTracker};

/// Quiet period before typed text is committed.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// The catalog only keeps a stable ordering within this many pages.
pub const MAX_TOTAL_PAGES: u32 = 50;

/// Invoked with the new page number whenever the page actually moves.
pub type PageChangeListener = Arc<dyn Fn(u32) + Send + Sync>;

//=========================================================================================
// Published State
//=========================================================================================

/// The single user-visible message slot of the results area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMessage {
    NoResults,
    FetchFailed,
}

impl fmt::Display for SearchMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMessage::NoResults => f.write_str("No movies found."),
            SearchMessage::FetchFailed => {
                f.write_str("Error fetching movies. Please try again later.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Debouncing,
    Fetching,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPaginationState {
    /// Literal input, echoed back to the search box.
    pub raw_query_text: String,
    /// The text the current results were requested for.
    pub committed_query_text: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub results: Vec<Movie>,
    pub is_loading: bool,
    pub message: Option<SearchMessage>,
    pub phase: SearchPhase,
}

impl Default for SearchPaginationState {
    fn default() -> Self {
        Self {
            raw_query_text: String::new(),
            committed_query_text: String::new(),
            current_page: 1,
            total_pages: 1,
            results: Vec::new(),
            is_loading: false,
            message: None,
            phase: SearchPhase::Idle,
        }
    }
}

//=========================================================================================
// Controller
//=========================================================================================

/// Optional collaborators and tuning for the controller.
#[derive(Clone)]
pub struct SearchOptions {
    pub debounce: Duration,
    pub tracker: Option<Arc<dyn SearchUsageTracker>>,
    pub on_page_change: Option<PageChangeListener>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: SEARCH_DEBOUNCE,
            tracker: None,
            on_page_change: None,
        }
    }
}

/// Everything a fetch needs to run and to later prove it is still current.
#[derive(Debug, Clone)]
struct FetchTicket {
    seq: u64,
    query: String,
    page: u32,
}

struct ControllerState {
    state: SearchPaginationState,
    latest_request: u64,
    /// The single live debounce timer, if any.
    debounce_slot: Option<CancellationToken>,
}

impl ControllerState {
    fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_request += 1;
        self.state.is_loading = true;
        self.state.message = None;
        self.state.phase = SearchPhase::Fetching;
        FetchTicket {
            seq: self.latest_request,
            query: self.state.committed_query_text.clone(),
            page: self.state.current_page,
        }
    }
}

struct Shared {
    gateway: Arc<dyn CatalogGateway>,
    options: SearchOptions,
    inner: Mutex<ControllerState>,
    updates: watch::Sender<SearchPaginationState>,
}

/// A cheap, cloneable handle; all clones drive the same search state.
#[derive(Clone)]
pub struct SearchPaginationController {
    shared: Arc<Shared>,
}

impl SearchPaginationController {
    pub fn new(gateway: Arc<dyn CatalogGateway>, options: SearchOptions) -> Self {
        let state = SearchPaginationState::default();
        let (updates, _) = watch::channel(state.clone());
        Self {
            shared: Arc::new(Shared {
                gateway,
                options,
                inner: Mutex::new(ControllerState {
                    state,
                    latest_request: 0,
                    debounce_slot: None,
                }),
                updates,
            }),
        }
    }

    /// A receiver that sees every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchPaginationState> {
        self.shared.updates.subscribe()
    }

    pub async fn snapshot(&self) -> SearchPaginationState {
        self.shared.inner.lock().await.state.clone()
    }

    /// Issues the mount-time fetch for the committed text without waiting for a debounce.
    pub async fn load_initial(&self) {
        let ticket = {
            let mut inner = self.shared.inner.lock().await;
            inner.state.current_page = 1;
            let ticket = inner.begin_fetch();
            self.shared.publish(&inner.state);
            ticket
        };
        tokio::spawn(self.shared.clone().run_fetch(ticket));
    }

    /// Records the literal input and re-arms the debounce timer.
    pub async fn set_query_text(&self, text: impl Into<String>) {
        let token = CancellationToken::new();
        {
            let mut inner = self.shared.inner.lock().await;
            if let Some(previous) = inner.debounce_slot.replace(token.clone()) {
                previous.cancel();
            }
            inner.state.raw_query_text = text.into();
            inner.state.phase = SearchPhase::Debouncing;
            self.shared.publish(&inner.state);
        }
        tokio::spawn(self.shared.clone().debounce_then_commit(token));
    }

    /// Returns `false` without fetching when already on the last page.
    pub async fn go_to_next_page(&self) -> bool {
        self.move_page(PageStep::Next).await
    }

    /// Returns `false` without fetching when already on the first page.
    pub async fn go_to_previous_page(&self) -> bool {
        self.move_page(PageStep::Previous).await
    }

    async fn move_page(&self, step: PageStep) -> bool {
        let ticket = {
            let mut inner = self.shared.inner.lock().await;
            let state = &mut inner.state;
            match step {
                PageStep::Next if state.current_page < state.total_pages => {
                    state.current_page += 1
                }
                PageStep::Previous if state.current_page > 1 => state.current_page -= 1,
                _ => return false,
            }
            let ticket = inner.begin_fetch();
            self.shared.publish(&inner.state);
            ticket
        };

        if let Some(listener) = &self.shared.options.on_page_change {
            listener(ticket.page);
        }
        tokio::spawn(self.shared.clone().run_fetch(ticket));
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum PageStep {
    Next,
    Previous,
}

impl Shared {
    fn publish(&self, state: &SearchPaginationState) {
        self.updates.send_replace(state.clone());
    }

    async fn debounce_then_commit(self: Arc<Self>, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(self.options.debounce) => {}
        }

        let ticket = {
            let mut inner = self.inner.lock().await;
            // A newer keystroke may have re-armed the slot while we waited for the lock.
            if token.is_cancelled() {
                return;
            }
            inner.debounce_slot = None;
            inner.state.committed_query_text = inner.state.raw_query_text.clone();
            inner.state.current_page = 1;
            let ticket = inner.begin_fetch();
            self.publish(&inner.state);
            ticket
        };

        info!(query = %ticket.query, "Search text committed");
        self.run_fetch(ticket).await;
    }

    async fn run_fetch(self: Arc<Self>, mut ticket: FetchTicket) {
        let top_result = loop {
            debug!(seq = ticket.seq, query = %ticket.query, page = ticket.page, "Fetching movies");
            let outcome: PortResult<MoviePage> = if ticket.query.trim().is_empty() {
                self.gateway.discover_movies(ticket.page).await
            } else {
                self.gateway.search_movies(&ticket.query, ticket.page).await
            };

            match self.apply_response(&ticket, outcome).await {
                Applied::Stale => return,
                Applied::Refetch(next) => ticket = next,
                Applied::Done(top_result) => break top_result,
            }
        };

        if let (Some(tracker), Some(top)) = (&self.options.tracker, top_result) {
            if !ticket.query.trim().is_empty() {
                let tracker = tracker.clone();
                let query = ticket.query;
                tokio::spawn(async move {
                    if let Err(e) = tracker.record_search(&query, &top).await {
                        warn!(query = %query, "Failed to record search usage: {}", e);
                    }
                });
            }
        }
    }

    async fn apply_response(
        &self,
        ticket: &FetchTicket,
        outcome: PortResult<MoviePage>,
    ) -> Applied {
        let mut inner = self.inner.lock().await;
        if inner.latest_request != ticket.seq {
            debug!(
                seq = ticket.seq,
                latest = inner.latest_request,
                "Dropping stale movie response"
            );
            return Applied::Stale;
        }

        // A re-armed debounce keeps the box in the typing phase until it commits.
        let debouncing = inner.debounce_slot.is_some();
        let settled = |phase| if debouncing { SearchPhase::Debouncing } else { phase };

        let top_result = match outcome {
            Ok(page) => {
                let total_pages = page.total_pages.clamp(1, MAX_TOTAL_PAGES);
                inner.state.total_pages = total_pages;
                if ticket.page > total_pages {
                    // The catalog shrank under us; these results belong to no valid page.
                    debug!(page = ticket.page, total_pages, "Requested page is past the end");
                    inner.state.current_page = total_pages;
                    let next = inner.begin_fetch();
                    self.publish(&inner.state);
                    return Applied::Refetch(next);
                }

                let state = &mut inner.state;
                state.is_loading = false;
                if page.results.is_empty() {
                    state.results.clear();
                    state.message = Some(SearchMessage::NoResults);
                } else {
                    state.results = page.results;
                }
                state.phase = settled(SearchPhase::Loaded);
                state.results.first().cloned()
            }
            Err(e) => {
                error!(query = %ticket.query, page = ticket.page, "Error fetching movies: {}", e);
                let state = &mut inner.state;
                state.is_loading = false;
                state.results.clear();
                state.message = Some(SearchMessage::FetchFailed);
                state.phase = settled(SearchPhase::Errored);
                None
            }
        };
        self.publish(&inner.state);
        Applied::Done(top_result)
    }
}

/// What became of a fetch response once it reached the controller.
enum Applied {
    Stale,
    /// The page was out of range; a fetch for the clamped page was issued instead.
    Refetch(FetchTicket),
    /// Applied; carries the top result for usage tracking.
    Done(Option<Movie>),
}
