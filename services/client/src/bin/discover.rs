//! services/client/src/bin/discover.rs
//!
//! Wires the TMDB adapter, file storage and the core together and prints one
//! round of results. Any command-line words become the search text.

use client_lib::{
    adapters::{storage::JsonFileStorage, tmdb::TmdbCatalogAdapter, usage::TracingUsageTracker},
    config::Config,
    error::ClientError,
    state::ClientState,
};
use movie_discovery_core::selection::WatchAvailability;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded.");

    // --- 2. Initialize Adapters ---
    let http = reqwest::Client::builder().build()?;
    let tmdb = Arc::new(TmdbCatalogAdapter::new(http, &config));
    let storage = Arc::new(JsonFileStorage::new(config.favorites_path.clone()));
    info!("Favorites stored at {}", storage.path().display());

    // --- 3. Build the Shared ClientState ---
    let state = ClientState::new(
        config.clone(),
        tmdb.clone(),
        storage,
        Some(Arc::new(TracingUsageTracker)),
        Some(Arc::new(|page: u32| info!(page, "Page changed"))),
    );
    state.mount().await;

    // --- 4. Run One Search ---
    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let mut updates = state.search.subscribe();
    if !query.is_empty() {
        state.search.set_query_text(query.clone()).await;
    }
    let results = updates
        .wait_for(|s| s.committed_query_text == query && !s.is_loading)
        .await
        .map_err(|e| ClientError::Internal(e.to_string()))?
        .clone();

    println!("Trending this week:");
    for (rank, movie) in state.trending.trending().iter().enumerate() {
        println!("  {}. {}", rank + 1, movie.title);
    }

    println!("\nPage {} of {}:", results.current_page, results.total_pages);
    if let Some(message) = results.message {
        println!("  {}", message);
    }
    for movie in &results.results {
        let year = movie
            .release_year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let favorite = if state.favorites.is_favorite(movie.id)? { "*" } else { " " };
        println!(
            " {} {} ({}) {} {} {}",
            favorite,
            movie.title,
            year,
            movie.rating_label(),
            movie.language_label(),
            tmdb.poster_url(movie).unwrap_or_else(|| "-".to_string())
        );
    }

    // --- 5. Open the Top Result ---
    let Some(top) = results.results.first().cloned() else {
        return Ok(());
    };
    let mut selection_updates = state.selection.subscribe();
    state.selection.select(top).await;
    let selected = selection_updates
        .wait_for(|s| s.watch_offers != WatchAvailability::Unresolved)
        .await
        .map_err(|e| ClientError::Internal(e.to_string()))?
        .clone();

    if let Some(movie) = &selected.selected_movie {
        println!("\n{}", movie.title);
        if let Some(tagline) = &movie.tagline {
            println!("  \"{}\"", tagline);
        }
        let genres: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
        if !genres.is_empty() {
            println!("  {}", genres.join(", "));
        }
    }
    match &selected.watch_offers {
        WatchAvailability::Available(offers) => {
            for offer in offers {
                println!(
                    "  [{}] {} {:?}",
                    offer.region, offer.provider_name, offer.offer_kinds
                );
            }
        }
        _ => println!("  Not available to stream, rent or buy in the configured regions."),
    }
    state.selection.close().await;

    Ok(())
}
