//! crates/movie_discovery_core/src/favorites.rs
//!
//! The persisted favorites set and the views derived from it.
//!
//! Storage is the only source of truth. Every change is a single atomic
//! `KeyValueStorage::update`, so independent views never clobber each other's toggles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::domain::{Movie, MovieId};
use crate::ports::{CatalogGateway, KeyValueStorage, PortError, PortResult};

/// Storage key holding the JSON array of favorited ids.
pub const FAVORITES_KEY: &str = "favoriteMovies";

//=========================================================================================
// FavoritesStore
//=========================================================================================

/// Read-modify-write access to the favorites slot.
#[derive(Clone)]
pub struct FavoritesStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl FavoritesStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn is_favorite(&self, movie_id: MovieId) -> PortResult<bool> {
        Ok(self.list_favorites()?.contains(&movie_id))
    }

    /// Flips membership of `movie_id` and returns the new state.
    pub fn toggle_favorite(&self, movie_id: MovieId) -> PortResult<bool> {
        let mut now_favorite = false;
        self.rewrite(&mut |ids: &mut Vec<MovieId>| {
            now_favorite = if ids.contains(&movie_id) {
                ids.retain(|id| *id != movie_id);
                false
            } else {
                ids.push(movie_id);
                true
            };
            true
        })?;
        debug!(movie_id, now_favorite, "Toggled favorite");
        Ok(now_favorite)
    }

    /// Removes `movie_id` if present. Returns whether anything changed.
    pub fn remove_favorite(&self, movie_id: MovieId) -> PortResult<bool> {
        let mut removed = false;
        self.rewrite(&mut |ids: &mut Vec<MovieId>| {
            let before = ids.len();
            ids.retain(|id| *id != movie_id);
            removed = ids.len() != before;
            removed
        })?;
        Ok(removed)
    }

    /// All favorited ids, oldest first, without duplicates.
    pub fn list_favorites(&self) -> PortResult<Vec<MovieId>> {
        decode(self.storage.get(FAVORITES_KEY)?.as_deref())
    }

    /// Applies `change` to the stored ids under the storage's update guard.
    /// `change` returns `false` when it left the ids as they were.
    fn rewrite(&self, change: &mut dyn FnMut(&mut Vec<MovieId>) -> bool) -> PortResult<()> {
        self.storage.update(FAVORITES_KEY, &mut |raw: Option<String>| {
            let mut ids = decode(raw.as_deref())?;
            if !change(&mut ids) {
                return Ok(None);
            }
            serde_json::to_string(&ids)
                .map(Some)
                .map_err(|e| PortError::Unexpected(e.to_string()))
        })
    }
}

fn decode(raw: Option<&str>) -> PortResult<Vec<MovieId>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let stored: Vec<MovieId> = serde_json::from_str(raw)
        .map_err(|e| PortError::Storage(format!("corrupt favorites slot: {}", e)))?;

    let mut ids = Vec::with_capacity(stored.len());
    for id in stored {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

//=========================================================================================
// Per-card marker
//=========================================================================================

/// The favorite flag shown on a single movie card.
///
/// A cache only: membership is re-derived from storage on mount and after every toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteMarker {
    movie_id: MovieId,
    is_favorite: bool,
}

impl FavoriteMarker {
    pub fn mount(store: &FavoritesStore, movie_id: MovieId) -> Self {
        let mut marker = Self {
            movie_id,
            is_favorite: false,
        };
        marker.refresh(store);
        marker
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn refresh(&mut self, store: &FavoritesStore) {
        match store.is_favorite(self.movie_id) {
            Ok(flag) => self.is_favorite = flag,
            Err(e) => {
                warn!(movie_id = self.movie_id, "Favorites temporarily unavailable: {}", e);
                self.is_favorite = false;
            }
        }
    }

    /// Toggles through the store. On a storage failure the marker keeps its last value.
    pub fn toggle(&mut self, store: &FavoritesStore) -> bool {
        match store.toggle_favorite(self.movie_id) {
            Ok(flag) => self.is_favorite = flag,
            Err(e) => warn!(movie_id = self.movie_id, "Failed to toggle favorite: {}", e),
        }
        self.is_favorite
    }
}

//=========================================================================================
// Favorites collection view
//=========================================================================================

/// The hydrated list behind a favorites page.
#[derive(Debug, Clone, Default)]
pub struct FavoritesCollection {
    movies: Vec<Movie>,
}

impl FavoritesCollection {
    /// Fetches details for every favorited id concurrently, keeping stored order.
    ///
    /// Ids whose details cannot be fetched are left out of the view but stay favorited.
    pub async fn load(store: &FavoritesStore, gateway: &dyn CatalogGateway) -> Self {
        let ids = match store.list_favorites() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Favorites temporarily unavailable: {}", e);
                return Self::default();
            }
        };

        let lookups = ids.iter().map(|id| gateway.get_movie_details(*id));
        let results = join_all(lookups).await;

        let movies = ids
            .into_iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(movie) => Some(movie),
                Err(e) => {
                    warn!(movie_id = id, "Error fetching favorite movie: {}", e);
                    None
                }
            })
            .collect();

        Self { movies }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Drops the movie from the view immediately, then from storage.
    pub fn remove(&mut self, store: &FavoritesStore, movie_id: MovieId) {
        self.movies.retain(|movie| movie.id != movie_id);
        if let Err(e) = store.remove_favorite(movie_id) {
            warn!(movie_id, "Failed to persist favorite removal: {}", e);
        }
    }
}

//=========================================================================================
// In-memory storage
//=========================================================================================

/// A process-local `KeyValueStorage`.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> PortResult<Option<String>>,
    ) -> PortResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        if let Some(value) = apply(entries.get(key).cloned())? {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedCatalog;

    fn store() -> (Arc<InMemoryStorage>, FavoritesStore) {
        let storage = Arc::new(InMemoryStorage::new());
        (storage.clone(), FavoritesStore::new(storage))
    }

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> PortResult<Option<String>> {
            Err(PortError::Storage("quota exceeded".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> PortResult<()> {
            Err(PortError::Storage("quota exceeded".into()))
        }

        fn update(
            &self,
            _key: &str,
            _apply: &mut dyn FnMut(Option<String>) -> PortResult<Option<String>>,
        ) -> PortResult<()> {
            Err(PortError::Storage("quota exceeded".into()))
        }
    }

    #[test]
    fn toggle_twice_adds_then_removes() {
        let (storage, store) = store();

        assert!(store.toggle_favorite(42).unwrap());
        assert_eq!(storage.get(FAVORITES_KEY).unwrap().as_deref(), Some("[42]"));

        assert!(!store.toggle_favorite(42).unwrap());
        assert_eq!(storage.get(FAVORITES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn absent_key_is_an_empty_set() {
        let (_, store) = store();
        assert!(store.list_favorites().unwrap().is_empty());
        assert!(!store.is_favorite(7).unwrap());
    }

    #[test]
    fn duplicates_in_storage_are_collapsed() {
        let (storage, store) = store();
        storage.set(FAVORITES_KEY, "[3,5,3]").unwrap();

        assert_eq!(store.list_favorites().unwrap(), vec![3, 5]);
        assert!(!store.toggle_favorite(3).unwrap());
        assert_eq!(store.list_favorites().unwrap(), vec![5]);
    }

    #[test]
    fn interleaved_views_do_not_clobber_each_other() {
        let (_, store) = store();
        let mut first = FavoriteMarker::mount(&store, 1);
        let mut second = FavoriteMarker::mount(&store, 2);

        assert!(first.toggle(&store));
        assert!(second.toggle(&store));

        assert_eq!(store.list_favorites().unwrap(), vec![1, 2]);
    }

    #[test]
    fn concurrent_toggles_from_many_threads_are_all_kept() {
        let (_, store) = store();

        let workers: Vec<_> = (0..4u64)
            .map(|worker| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..50u64 {
                        assert!(store.toggle_favorite(worker * 1_000 + n).unwrap());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let ids = store.list_favorites().unwrap();
        assert_eq!(ids.len(), 200);
        assert!(ids.contains(&3_049));
    }

    #[test]
    fn removing_an_absent_id_leaves_the_slot_untouched() {
        let (storage, store) = store();
        assert!(!store.remove_favorite(8).unwrap());
        assert_eq!(storage.get(FAVORITES_KEY).unwrap(), None);
    }

    #[test]
    fn marker_rederives_membership_on_toggle() {
        let (_, store) = store();
        let mut card = FavoriteMarker::mount(&store, 9);
        assert!(!card.is_favorite());

        // Another view favorites the same movie behind this card's back.
        store.toggle_favorite(9).unwrap();

        assert!(!card.toggle(&store));
        assert!(!store.is_favorite(9).unwrap());
    }

    #[test]
    fn corrupt_slot_surfaces_as_storage_error() {
        let (storage, store) = store();
        storage.set(FAVORITES_KEY, "not json").unwrap();

        assert!(matches!(store.is_favorite(1), Err(PortError::Storage(_))));
        assert!(!FavoriteMarker::mount(&store, 1).is_favorite());
    }

    #[test]
    fn broken_storage_keeps_marker_state() {
        let store = FavoritesStore::new(Arc::new(BrokenStorage));
        let mut card = FavoriteMarker::mount(&store, 4);
        assert!(!card.toggle(&store));
    }

    #[tokio::test]
    async fn collection_hydrates_in_stored_order_and_skips_failures() {
        let (_, store) = store();
        store.toggle_favorite(20).unwrap();
        store.toggle_favorite(404).unwrap();
        store.toggle_favorite(10).unwrap();

        let catalog = ScriptedCatalog::new();
        catalog.set_details(Movie::new(10, "Ten"));
        catalog.set_details(Movie::new(20, "Twenty"));

        let collection = FavoritesCollection::load(&store, &catalog).await;
        let ids: Vec<_> = collection.movies().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![20, 10]);
        assert_eq!(store.list_favorites().unwrap(), vec![20, 404, 10]);
    }

    #[tokio::test]
    async fn removing_from_collection_updates_view_and_storage() {
        let (_, store) = store();
        store.toggle_favorite(1).unwrap();
        store.toggle_favorite(2).unwrap();

        let catalog = ScriptedCatalog::new();
        catalog.set_details(Movie::new(1, "One"));
        catalog.set_details(Movie::new(2, "Two"));

        let mut collection = FavoritesCollection::load(&store, &catalog).await;
        collection.remove(&store, 1);

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.movies()[0].id, 2);
        assert_eq!(store.list_favorites().unwrap(), vec![2]);
    }
}
