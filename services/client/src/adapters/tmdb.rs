//! services/client/src/adapters/tmdb.rs
//!
//! This module contains the adapter for The Movie Database (TMDB) v3 API.
//! It implements the `CatalogGateway` port from the `core` crate.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use movie_discovery_core::domain::{
    Genre, Movie, MovieId, MoviePage, ProviderEntry, RegionOffers, WatchProviderDocument,
};
use movie_discovery_core::ports::{CatalogGateway, PortError, PortResult};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogGateway` port over HTTP with bearer auth.
#[derive(Clone)]
pub struct TmdbCatalogAdapter {
    client: Client,
    base_url: String,
    image_base: String,
    api_token: String,
    language: String,
}

impl TmdbCatalogAdapter {
    /// Creates a new `TmdbCatalogAdapter`.
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.api_base.clone(),
            image_base: config.image_base.clone(),
            api_token: config.api_token.clone(),
            language: config.language.clone(),
        }
    }

    /// Full poster URL, or `None` when the caller should show a placeholder.
    pub fn poster_url(&self, movie: &Movie) -> Option<String> {
        movie.poster_path.as_deref().map(|path| self.image_url(path))
    }

    pub fn backdrop_url(&self, movie: &Movie) -> Option<String> {
        movie.backdrop_path.as_deref().map(|path| self.image_url(path))
    }

    fn image_url(&self, path: &str) -> String {
        format!("{}/{}", self.image_base, path.trim_start_matches('/'))
    }

    /// Performs a GET with query parameters and deserializes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> PortResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path, "Catalog request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .header(header::ACCEPT, "application/json")
            .query(params)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("request to {} failed: {}", path, e)))?;

        check_status(response.status(), path)?;

        response
            .json::<T>()
            .await
            .map_err(|e| PortError::Decode(format!("response from {}: {}", path, e)))
    }
}

/// Maps a non-success status to the matching port error.
fn check_status(status: StatusCode, path: &str) -> PortResult<()> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(PortError::Unauthorized),
        StatusCode::NOT_FOUND => Err(PortError::NotFound(path.to_string())),
        other => Err(PortError::Status(other.as_u16())),
    }
}

//=========================================================================================
// `CatalogGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogGateway for TmdbCatalogAdapter {
    async fn search_movies(&self, query: &str, page: u32) -> PortResult<MoviePage> {
        let params = [("query", query.to_string()), ("page", page.to_string())];
        let record: PageRecord = self.get_json("/search/movie", &params).await?;
        Ok(record.to_domain())
    }

    async fn discover_movies(&self, page: u32) -> PortResult<MoviePage> {
        let params = [
            ("sort_by", "popularity.desc".to_string()),
            ("page", page.to_string()),
        ];
        let record: PageRecord = self.get_json("/discover/movie", &params).await?;
        Ok(record.to_domain())
    }

    async fn trending_movies_this_week(&self) -> PortResult<Vec<Movie>> {
        let record: PageRecord = self.get_json("/trending/movie/week", &[]).await?;
        Ok(record.to_domain().results)
    }

    async fn get_movie_details(&self, id: MovieId) -> PortResult<Movie> {
        let params = [("language", self.language.clone())];
        let record: MovieRecord = self.get_json(&format!("/movie/{}", id), &params).await?;
        Ok(record.to_domain())
    }

    async fn get_watch_providers(&self, id: MovieId) -> PortResult<WatchProviderDocument> {
        let record: WatchProvidersRecord = self
            .get_json(&format!("/movie/{}/watch/providers", id), &[])
            .await?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// "Impure" API Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct GenreRecord {
    id: u32,
    name: String,
}

#[derive(Deserialize)]
struct MovieRecord {
    id: MovieId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    original_title: String,
    release_date: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    vote_count: u32,
    #[serde(default)]
    popularity: f64,
    #[serde(default)]
    original_language: String,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    homepage: Option<String>,
    #[serde(default)]
    genres: Vec<GenreRecord>,
}

/// TMDB sends "" for unknown text fields as often as null.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl MovieRecord {
    fn to_domain(self) -> Movie {
        Movie {
            id: self.id,
            title: self.title,
            original_title: self.original_title,
            release_date: self
                .release_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            original_language: self.original_language,
            poster_path: non_empty(self.poster_path),
            backdrop_path: non_empty(self.backdrop_path),
            overview: self.overview.unwrap_or_default(),
            tagline: non_empty(self.tagline),
            homepage: non_empty(self.homepage),
            genres: self
                .genres
                .into_iter()
                .map(|g| Genre {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct PageRecord {
    #[serde(default)]
    results: Vec<MovieRecord>,
    #[serde(default)]
    total_pages: u32,
}

impl PageRecord {
    fn to_domain(self) -> MoviePage {
        MoviePage {
            results: self.results.into_iter().map(MovieRecord::to_domain).collect(),
            total_pages: self.total_pages,
        }
    }
}

#[derive(Deserialize)]
struct ProviderRecord {
    provider_id: u32,
    #[serde(default)]
    provider_name: String,
    logo_path: Option<String>,
}

#[derive(Deserialize)]
struct RegionRecord {
    link: Option<String>,
    flatrate: Option<Vec<ProviderRecord>>,
    rent: Option<Vec<ProviderRecord>>,
    buy: Option<Vec<ProviderRecord>>,
}

#[derive(Deserialize)]
struct WatchProvidersRecord {
    #[serde(default)]
    results: HashMap<String, RegionRecord>,
}

fn to_entries(records: Option<Vec<ProviderRecord>>) -> Option<Vec<ProviderEntry>> {
    records.map(|records| {
        records
            .into_iter()
            .map(|r| ProviderEntry {
                provider_id: r.provider_id,
                provider_name: r.provider_name,
                logo_path: non_empty(r.logo_path),
            })
            .collect()
    })
}

impl WatchProvidersRecord {
    fn to_domain(self) -> WatchProviderDocument {
        WatchProviderDocument {
            regions: self
                .results
                .into_iter()
                .map(|(code, region)| {
                    let offers = RegionOffers {
                        link: non_empty(region.link),
                        flatrate: to_entries(region.flatrate),
                        rent: to_entries(region.rent),
                        buy: to_entries(region.buy),
                    };
                    (code, offers)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movie_discovery_core::watch_providers::{resolve_watch_offers, RegionPriority};

    fn adapter() -> TmdbCatalogAdapter {
        let config = Config::from_lookup(|key| match key {
            "TMDB_API_TOKEN" => Some("token".to_string()),
            _ => None,
        })
        .unwrap();
        TmdbCatalogAdapter::new(Client::new(), &config)
    }

    #[test]
    fn search_page_maps_nullable_fields() {
        let body = r#"{
            "page": 1,
            "total_pages": 812,
            "total_results": 16224,
            "results": [
                {
                    "id": 603,
                    "title": "The Matrix",
                    "original_title": "The Matrix",
                    "release_date": "1999-03-31",
                    "vote_average": 8.2,
                    "vote_count": 25000,
                    "popularity": 81.5,
                    "original_language": "en",
                    "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
                    "backdrop_path": null,
                    "overview": "Set in the 22nd century..."
                },
                {
                    "id": 1,
                    "title": "Untitled",
                    "release_date": "",
                    "vote_average": null,
                    "overview": null
                }
            ]
        }"#;

        let page = serde_json::from_str::<PageRecord>(body).unwrap().to_domain();
        assert_eq!(page.total_pages, 812);
        assert_eq!(page.results.len(), 2);

        let matrix = &page.results[0];
        assert_eq!(matrix.release_year(), Some(1999));
        assert_eq!(matrix.backdrop_path, None);
        assert_eq!(matrix.rating_label(), "8.2");

        let untitled = &page.results[1];
        assert_eq!(untitled.release_date, None);
        assert_eq!(untitled.rating_label(), "N/A");
        assert!(untitled.overview.is_empty());
    }

    #[test]
    fn details_map_genres_and_blank_homepage() {
        let body = r#"{
            "id": 27205,
            "title": "Inception",
            "original_title": "Inception",
            "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
            "homepage": "",
            "tagline": "Your mind is the scene of the crime."
        }"#;

        let movie = serde_json::from_str::<MovieRecord>(body).unwrap().to_domain();
        assert_eq!(movie.genres.len(), 2);
        assert_eq!(movie.genres[1].name, "Science Fiction");
        assert_eq!(movie.homepage, None);
        assert!(movie.tagline.is_some());
    }

    #[test]
    fn watch_providers_feed_the_resolver() {
        let body = r#"{
            "id": 550,
            "results": {
                "US": {"link": "https://www.themoviedb.org/movie/550/watch?locale=US"},
                "GB": {
                    "link": "https://www.themoviedb.org/movie/550/watch?locale=GB",
                    "flatrate": [{"provider_id": 9, "provider_name": "Amazon Prime Video", "logo_path": "/f"}],
                    "buy": [{"provider_id": 9, "provider_name": "Amazon Video", "logo_path": "/b"}]
                }
            }
        }"#;

        let document = serde_json::from_str::<WatchProvidersRecord>(body)
            .unwrap()
            .to_domain();
        let offers = resolve_watch_offers(&document, &RegionPriority::default()).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].region, "GB");
        assert_eq!(offers[0].provider_name, "Amazon Video");
        assert_eq!(offers[0].logo_path.as_deref(), Some("/b"));
    }

    #[test]
    fn status_codes_map_to_port_errors() {
        assert!(check_status(StatusCode::OK, "/x").is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, "/x"),
            Err(PortError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "/movie/1"),
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE, "/x"),
            Err(PortError::Status(503))
        ));
    }

    #[test]
    fn image_urls_fall_back_to_placeholder() {
        let tmdb = adapter();
        let mut movie = Movie::new(1, "Poster");
        assert_eq!(tmdb.poster_url(&movie), None);

        movie.poster_path = Some("/abc.jpg".into());
        assert_eq!(
            tmdb.poster_url(&movie).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
    }
}
