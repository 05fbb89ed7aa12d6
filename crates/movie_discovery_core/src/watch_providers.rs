//! crates/movie_discovery_core/src/watch_providers.rs
//!
//! Resolves a raw multi-region availability document into one ordered offer list.
//!
//! Resolution is two pure stages: pick the first allow-listed region that has any
//! offer, then merge its categories with last-occurrence-wins deduplication.

use crate::domain::{OfferKind, ProviderEntry, RegionOffers, WatchOffer, WatchProviderDocument};

/// Primary region followed by the fallback regions.
pub const DEFAULT_REGIONS: [&str; 4] = ["US", "GB", "CA", "AU"];

/// Priority-ordered allow-list of regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPriority {
    regions: Vec<String>,
}

impl RegionPriority {
    /// Returns `None` for an empty list.
    pub fn new<I, S>(regions: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regions: Vec<String> = regions.into_iter().map(Into::into).collect();
        if regions.is_empty() {
            None
        } else {
            Some(Self { regions })
        }
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }
}

impl Default for RegionPriority {
    fn default() -> Self {
        Self {
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Resolves availability for one movie.
///
/// `None` means no allow-listed region has any offer, which is distinct from
/// "not resolved yet".
pub fn resolve_watch_offers(
    document: &WatchProviderDocument,
    priority: &RegionPriority,
) -> Option<Vec<WatchOffer>> {
    let (region, offers) = select_region(document, priority)?;
    Some(merge_offers(region, offers))
}

/// First region in priority order with at least one non-empty category.
pub fn select_region<'a>(
    document: &'a WatchProviderDocument,
    priority: &'a RegionPriority,
) -> Option<(&'a str, &'a RegionOffers)> {
    priority.regions.iter().find_map(|code| {
        document
            .regions
            .get(code)
            .filter(|offers| offers.has_offers())
            .map(|offers| (code.as_str(), offers))
    })
}

/// Concatenates flatrate, rent and buy, keeping only the last entry per provider.
///
/// Survivors keep the position of their last occurrence. A provider's offer kinds
/// accumulate across every category it appeared in.
pub fn merge_offers(region: &str, offers: &RegionOffers) -> Vec<WatchOffer> {
    let concatenated: Vec<(OfferKind, &ProviderEntry)> = [
        (OfferKind::Streaming, &offers.flatrate),
        (OfferKind::Rental, &offers.rent),
        (OfferKind::Purchase, &offers.buy),
    ]
    .into_iter()
    .flat_map(|(kind, entries)| {
        entries
            .iter()
            .flatten()
            .map(move |entry| (kind, entry))
    })
    .collect();

    concatenated
        .iter()
        .enumerate()
        .filter(|(index, (_, entry))| {
            !concatenated[index + 1..]
                .iter()
                .any(|(_, later)| later.provider_id == entry.provider_id)
        })
        .map(|(_, (_, entry))| {
            let mut offer_kinds: Vec<OfferKind> = Vec::new();
            for (kind, _) in concatenated
                .iter()
                .filter(|(_, other)| other.provider_id == entry.provider_id)
            {
                if !offer_kinds.contains(kind) {
                    offer_kinds.push(*kind);
                }
            }
            WatchOffer {
                provider_id: entry.provider_id,
                provider_name: entry.provider_name.clone(),
                logo_path: entry.logo_path.clone(),
                region: region.to_string(),
                link: offers.link.clone(),
                offer_kinds,
            }
        })
        .collect()
}
