//! crates/movie_discovery_core/src/selection.rs
//!
//! Tracks the one movie currently opened for detail viewing and its watch availability.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::{Movie, MovieId, WatchOffer};
use crate::ports::CatalogGateway;
use crate::watch_providers::{resolve_watch_offers, RegionPriority};

/// Where a selected movie can be watched.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum WatchAvailability {
    /// The lookup has not completed yet.
    #[default]
    Unresolved,
    /// No allow-listed region offers the movie, or the lookup failed.
    Unavailable,
    Available(Vec<WatchOffer>),
}

impl WatchAvailability {
    pub fn offers(&self) -> Option<&[WatchOffer]> {
        match self {
            WatchAvailability::Available(offers) => Some(offers.as_slice()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_movie: Option<Movie>,
    pub watch_offers: WatchAvailability,
}

struct SessionInner {
    state: SelectionState,
    /// Bumped on every select and close; resolutions from older generations are dropped.
    generation: u64,
}

struct Shared {
    gateway: Arc<dyn CatalogGateway>,
    regions: RegionPriority,
    inner: Mutex<SessionInner>,
    updates: watch::Sender<SelectionState>,
}

#[derive(Clone)]
pub struct SelectionSession {
    shared: Arc<Shared>,
}

impl SelectionSession {
    pub fn new(gateway: Arc<dyn CatalogGateway>, regions: RegionPriority) -> Self {
        let (updates, _) = watch::channel(SelectionState::default());
        Self {
            shared: Arc::new(Shared {
                gateway,
                regions,
                inner: Mutex::new(SessionInner {
                    state: SelectionState::default(),
                    generation: 0,
                }),
                updates,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SelectionState> {
        self.shared.updates.subscribe()
    }

    pub async fn snapshot(&self) -> SelectionState {
        self.shared.inner.lock().await.state.clone()
    }

    /// Opens `movie`, discarding any previous offers, and starts the availability lookup.
    pub async fn select(&self, movie: Movie) {
        let movie_id = movie.id;
        let generation = {
            let mut inner = self.shared.inner.lock().await;
            inner.generation += 1;
            inner.state = SelectionState {
                selected_movie: Some(movie),
                watch_offers: WatchAvailability::Unresolved,
            };
            self.shared.updates.send_replace(inner.state.clone());
            inner.generation
        };
        info!(movie_id, "Movie selected");
        tokio::spawn(self.shared.clone().resolve_offers(generation, movie_id));
        tokio::spawn(self.shared.clone().enrich_details(generation, movie_id));
    }

    pub async fn close(&self) {
        let mut inner = self.shared.inner.lock().await;
        inner.generation += 1;
        inner.state = SelectionState::default();
        self.shared.updates.send_replace(inner.state.clone());
    }
}

impl Shared {
    /// Availability and details land independently; neither waits for the other.
    async fn resolve_offers(self: Arc<Self>, generation: u64, movie_id: MovieId) {
        let availability = match self.gateway.get_watch_providers(movie_id).await {
            Ok(document) => match resolve_watch_offers(&document, &self.regions) {
                Some(offers) => WatchAvailability::Available(offers),
                None => WatchAvailability::Unavailable,
            },
            Err(e) => {
                warn!(movie_id, "Error fetching watch providers: {}", e);
                WatchAvailability::Unavailable
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(movie_id, "Dropping stale watch providers");
            return;
        }
        inner.state.watch_offers = availability;
        self.updates.send_replace(inner.state.clone());
    }

    async fn enrich_details(self: Arc<Self>, generation: u64, movie_id: MovieId) {
        let movie = match self.gateway.get_movie_details(movie_id).await {
            Ok(movie) => movie,
            Err(e) => {
                warn!(movie_id, "Error fetching movie details: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!(movie_id, "Dropping stale movie details");
            return;
        }
        inner.state.selected_movie = Some(movie);
        self.updates.send_replace(inner.state.clone());
    }
}
