//! crates/movie_discovery_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete catalog API, storage surface and analytics sink.

use async_trait::async_trait;

use crate::domain::{Movie, MovieId, MoviePage, WatchProviderDocument};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Catalog responded with status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Storage unavailable: {0}")]
    Storage(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Remote movie catalog. All calls are independent GETs.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Free-text search, one page at a time.
    async fn search_movies(&self, query: &str, page: u32) -> PortResult<MoviePage>;

    /// Discover listing sorted by descending popularity.
    async fn discover_movies(&self, page: u32) -> PortResult<MoviePage>;

    async fn trending_movies_this_week(&self) -> PortResult<Vec<Movie>>;

    /// Full detail record (genres, tagline, homepage).
    async fn get_movie_details(&self, id: MovieId) -> PortResult<Movie>;

    async fn get_watch_providers(&self, id: MovieId) -> PortResult<WatchProviderDocument>;
}

/// A persistent string key/value surface.
///
/// Synchronous on purpose: a favorites toggle must read and write without yielding.
pub trait KeyValueStorage: Send + Sync {
    /// Returns `None` when the key has never been written.
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Atomic read-modify-write of one slot.
    ///
    /// `apply` sees the current value and returns the replacement, or `None` to leave
    /// the slot untouched. No other `set` or `update` on this storage may interleave.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> PortResult<Option<String>>,
    ) -> PortResult<()>;
}

/// Receives successful, non-empty text searches. Fire-and-forget.
#[async_trait]
pub trait SearchUsageTracker: Send + Sync {
    async fn record_search(&self, query: &str, top_result: &Movie) -> PortResult<()>;
}
