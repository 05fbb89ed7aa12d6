//! services/client/src/state.rs
//!
//! Assembles the core components into the shared state a presentation layer drives.

use std::sync::Arc;

use movie_discovery_core::favorites::{FavoritesCollection, FavoritesStore};
use movie_discovery_core::ports::{CatalogGateway, KeyValueStorage, SearchUsageTracker};
use movie_discovery_core::search::{PageChangeListener, SearchOptions, SearchPaginationController};
use movie_discovery_core::selection::SelectionSession;
use movie_discovery_core::trending::TrendingAggregator;
use tracing::info;

use crate::config::Config;

//=========================================================================================
// ClientState (Shared Across All Views)
//=========================================================================================

/// The shared client state, created once at startup and handed to every view.
#[derive(Clone)]
pub struct ClientState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogGateway>,
    pub favorites: FavoritesStore,
    pub search: SearchPaginationController,
    pub trending: Arc<TrendingAggregator>,
    pub selection: SelectionSession,
}

impl ClientState {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<dyn CatalogGateway>,
        storage: Arc<dyn KeyValueStorage>,
        tracker: Option<Arc<dyn SearchUsageTracker>>,
        on_page_change: Option<PageChangeListener>,
    ) -> Self {
        let search = SearchPaginationController::new(
            catalog.clone(),
            SearchOptions {
                debounce: config.search_debounce,
                tracker,
                on_page_change,
            },
        );
        let selection = SelectionSession::new(catalog.clone(), config.watch_regions.clone());

        Self {
            trending: Arc::new(TrendingAggregator::new(catalog.clone())),
            favorites: FavoritesStore::new(storage),
            config,
            catalog,
            search,
            selection,
        }
    }

    /// The home view's mount: first discover page plus the trending strip.
    pub async fn mount(&self) {
        info!("Mounting discovery view");
        self.search.load_initial().await;
        self.trending.load_trending().await;
    }

    /// Hydrates the favorites view from storage and the catalog.
    pub async fn favorites_collection(&self) -> FavoritesCollection {
        FavoritesCollection::load(&self.favorites, self.catalog.as_ref()).await
    }
}
