pub mod domain;
pub mod favorites;
pub mod ports;
pub mod search;
pub mod selection;
pub mod trending;
pub mod watch_providers;

#[cfg(test)]
pub(crate) mod test_support;

pub use domain::{
    Genre, Movie, MovieId, MoviePage, OfferKind, ProviderEntry, RegionOffers, WatchOffer,
    WatchProviderDocument,
};
pub use favorites::{FavoriteMarker, FavoritesCollection, FavoritesStore, InMemoryStorage};
pub use ports::{CatalogGateway, KeyValueStorage, PortError, PortResult, SearchUsageTracker};
pub use search::{
    SearchMessage, SearchOptions, SearchPaginationController, SearchPaginationState, SearchPhase,
};
pub use selection::{SelectionSession, SelectionState, WatchAvailability};
pub use trending::TrendingAggregator;
pub use watch_providers::{resolve_watch_offers, RegionPriority};
