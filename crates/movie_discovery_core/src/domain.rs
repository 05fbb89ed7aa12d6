//! crates/movie_discovery_core/src/domain.rs
//!
//! Defines the pure, core data structures for the discovery client.
//! These structs are independent of any HTTP API or serialization format.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Stable catalog identifier of a movie.
pub type MovieId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// A movie as returned by the catalog. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub original_title: String,
    pub release_date: Option<NaiveDate>,
    /// `None` means "not rated".
    pub vote_average: Option<f64>,
    pub vote_count: u32,
    pub popularity: f64,
    /// ISO-639-1 code.
    pub original_language: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub overview: String,
    pub tagline: Option<String>,
    pub homepage: Option<String>,
    pub genres: Vec<Genre>,
}

impl Movie {
    /// Creates a movie with only an id and a title; every other field is empty.
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id,
            original_title: title.clone(),
            title,
            release_date: None,
            vote_average: None,
            vote_count: 0,
            popularity: 0.0,
            original_language: String::new(),
            poster_path: None,
            backdrop_path: None,
            overview: String::new(),
            tagline: None,
            homepage: None,
            genres: Vec::new(),
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// Rating with one decimal, or "N/A" when the movie is unrated.
    pub fn rating_label(&self) -> String {
        match self.vote_average {
            Some(avg) if avg > 0.0 => format!("{:.1}", avg),
            _ => "N/A".to_string(),
        }
    }

    pub fn language_label(&self) -> String {
        self.original_language.to_uppercase()
    }

    pub fn has_distinct_original_title(&self) -> bool {
        !self.original_title.is_empty() && self.original_title != self.title
    }
}

/// One page of a paged catalog query.
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePage {
    pub results: Vec<Movie>,
    /// Total pages as reported by the server, before any local cap.
    pub total_pages: u32,
}

//=========================================================================================
// Watch Availability
//=========================================================================================

/// A single provider entry inside one offer category of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    pub provider_id: u32,
    pub provider_name: String,
    pub logo_path: Option<String>,
}

/// The offers of one region, split by category. Any category may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionOffers {
    /// Region-level storefront link.
    pub link: Option<String>,
    pub flatrate: Option<Vec<ProviderEntry>>,
    pub rent: Option<Vec<ProviderEntry>>,
    pub buy: Option<Vec<ProviderEntry>>,
}

impl RegionOffers {
    /// True when at least one category holds an entry.
    pub fn has_offers(&self) -> bool {
        [&self.flatrate, &self.rent, &self.buy]
            .into_iter()
            .any(|category| category.as_ref().is_some_and(|entries| !entries.is_empty()))
    }
}

/// The raw per-region availability document for one movie, keyed by region code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchProviderDocument {
    pub regions: HashMap<String, RegionOffers>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OfferKind {
    Streaming,
    Rental,
    Purchase,
}

/// A resolved availability entry for one provider in the selected region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOffer {
    pub provider_id: u32,
    pub provider_name: String,
    pub logo_path: Option<String>,
    pub region: String,
    pub link: Option<String>,
    /// Every category the provider appeared in, in concatenation order.
    pub offer_kinds: Vec<OfferKind>,
}
