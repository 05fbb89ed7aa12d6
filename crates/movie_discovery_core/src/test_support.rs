//! A scripted `CatalogGateway` used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Movie, MovieId, MoviePage, WatchProviderDocument};
use crate::ports::{CatalogGateway, PortError, PortResult, SearchUsageTracker};

#[derive(Clone)]
enum Outcome<T> {
    Ok(T),
    Fail,
}

#[derive(Clone)]
struct Scripted<T> {
    delay: Duration,
    outcome: Outcome<T>,
}

impl<T: Clone> Scripted<T> {
    async fn play(self) -> PortResult<T> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.outcome {
            Outcome::Ok(value) => Ok(value),
            Outcome::Fail => Err(PortError::Status(500)),
        }
    }
}

#[derive(Default)]
struct Script {
    pages: HashMap<(String, u32), Scripted<MoviePage>>,
    trending: Option<Scripted<Vec<Movie>>>,
    details: HashMap<MovieId, Scripted<Movie>>,
    providers: HashMap<MovieId, Scripted<WatchProviderDocument>>,
    calls: Vec<String>,
}

/// Discover pages are keyed by the empty query.
#[derive(Default)]
pub(crate) struct ScriptedCatalog {
    script: Mutex<Script>,
}

pub(crate) fn movies(ids: &[MovieId]) -> Vec<Movie> {
    ids.iter()
        .map(|id| Movie::new(*id, format!("Movie {}", id)))
        .collect()
}

pub(crate) fn page(ids: &[MovieId], total_pages: u32) -> MoviePage {
    MoviePage {
        results: movies(ids),
        total_pages,
    }
}

impl ScriptedCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_page(&self, query: &str, page: u32, delay_ms: u64, result: MoviePage) {
        self.script.lock().unwrap().pages.insert(
            (query.to_string(), page),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                outcome: Outcome::Ok(result),
            },
        );
    }

    pub(crate) fn fail_page(&self, query: &str, page: u32) {
        self.script.lock().unwrap().pages.insert(
            (query.to_string(), page),
            Scripted {
                delay: Duration::ZERO,
                outcome: Outcome::Fail,
            },
        );
    }

    pub(crate) fn set_trending(&self, result: Vec<Movie>) {
        self.script.lock().unwrap().trending = Some(Scripted {
            delay: Duration::ZERO,
            outcome: Outcome::Ok(result),
        });
    }

    pub(crate) fn set_details(&self, movie: Movie) {
        self.set_details_delayed(movie, 0);
    }

    pub(crate) fn set_details_delayed(&self, movie: Movie, delay_ms: u64) {
        self.script.lock().unwrap().details.insert(
            movie.id,
            Scripted {
                delay: Duration::from_millis(delay_ms),
                outcome: Outcome::Ok(movie),
            },
        );
    }

    pub(crate) fn set_providers(&self, id: MovieId, delay_ms: u64, doc: WatchProviderDocument) {
        self.script.lock().unwrap().providers.insert(
            id,
            Scripted {
                delay: Duration::from_millis(delay_ms),
                outcome: Outcome::Ok(doc),
            },
        );
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    fn record<T>(
        &self,
        call: String,
        pick: impl FnOnce(&Script) -> Option<Scripted<T>>,
    ) -> Option<Scripted<T>> {
        let mut script = self.script.lock().unwrap();
        script.calls.push(call);
        pick(&script)
    }

    async fn page_for(&self, query: &str, page: u32, call: String) -> PortResult<MoviePage> {
        let key = (query.to_string(), page);
        match self.record(call, |s| s.pages.get(&key).cloned()) {
            Some(scripted) => scripted.play().await,
            None => Err(PortError::Status(404)),
        }
    }
}

#[async_trait]
impl CatalogGateway for ScriptedCatalog {
    async fn search_movies(&self, query: &str, page: u32) -> PortResult<MoviePage> {
        self.page_for(query, page, format!("search:{}:{}", query, page))
            .await
    }

    async fn discover_movies(&self, page: u32) -> PortResult<MoviePage> {
        self.page_for("", page, format!("discover:{}", page)).await
    }

    async fn trending_movies_this_week(&self) -> PortResult<Vec<Movie>> {
        match self.record("trending".to_string(), |s| s.trending.clone()) {
            Some(scripted) => scripted.play().await,
            None => Err(PortError::Transport("connection refused".into())),
        }
    }

    async fn get_movie_details(&self, id: MovieId) -> PortResult<Movie> {
        match self.record(format!("details:{}", id), |s| s.details.get(&id).cloned()) {
            Some(scripted) => scripted.play().await,
            None => Err(PortError::NotFound(format!("movie {}", id))),
        }
    }

    async fn get_watch_providers(&self, id: MovieId) -> PortResult<WatchProviderDocument> {
        match self.record(format!("providers:{}", id), |s| s.providers.get(&id).cloned()) {
            Some(scripted) => scripted.play().await,
            None => Err(PortError::Status(503)),
        }
    }
}

/// Remembers every reported search.
#[derive(Default)]
pub(crate) struct RecordingTracker {
    pub(crate) searches: Mutex<Vec<(String, MovieId)>>,
}

#[async_trait]
impl SearchUsageTracker for RecordingTracker {
    async fn record_search(&self, query: &str, top_result: &Movie) -> PortResult<()> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), top_result.id));
        Ok(())
    }
}
