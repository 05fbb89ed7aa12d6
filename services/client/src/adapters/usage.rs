//! services/client/src/adapters/usage.rs
//!
//! Implements the `SearchUsageTracker` port by emitting a structured log event.

use async_trait::async_trait;
use movie_discovery_core::domain::Movie;
use movie_discovery_core::ports::{PortResult, SearchUsageTracker};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct TracingUsageTracker;

#[async_trait]
impl SearchUsageTracker for TracingUsageTracker {
    async fn record_search(&self, query: &str, top_result: &Movie) -> PortResult<()> {
        info!(
            query,
            movie_id = top_result.id,
            title = %top_result.title,
            "Search recorded"
        );
        Ok(())
    }
}
