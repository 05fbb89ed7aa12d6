//! crates/movie_discovery_core/src/trending.rs
//!
//! The short "trending this week" strip, fetched once per session.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::domain::Movie;
use crate::ports::CatalogGateway;

/// How many trending movies are kept.
pub const TRENDING_LIMIT: usize = 5;

pub struct TrendingAggregator {
    gateway: Arc<dyn CatalogGateway>,
    movies: OnceCell<Vec<Movie>>,
}

impl TrendingAggregator {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self {
            gateway,
            movies: OnceCell::new(),
        }
    }

    /// Fetches the trending list on first call; later calls return the stored list.
    ///
    /// A failed fetch is logged and stored as an empty list. It is not retried.
    pub async fn load_trending(&self) -> &[Movie] {
        self.movies
            .get_or_init(|| async {
                match self.gateway.trending_movies_this_week().await {
                    Ok(mut movies) => {
                        movies.truncate(TRENDING_LIMIT);
                        info!(count = movies.len(), "Trending movies loaded");
                        movies
                    }
                    Err(e) => {
                        error!("Error fetching trending movies: {}", e);
                        Vec::new()
                    }
                }
            })
            .await
    }

    /// The stored list, empty until `load_trending` has completed.
    pub fn trending(&self) -> &[Movie] {
        self.movies.get().map(Vec::as_slice).unwrap_or_default()
    }
}
