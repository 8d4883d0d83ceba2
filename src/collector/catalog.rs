//! Batched catalog lookup

use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::collector::config::CATALOG_LIMIT;
use crate::collector::group::BoundedGroup;
use crate::collector::{CollectError, CollectResult};
use crate::fetcher::catalog_parser::{build_query, parse_catalog_response};
use crate::fetcher::http::RateLimitedFetcher;
use crate::fetcher::pagination::chunk_ids;
use crate::fetcher::{FetchRequest, Transport};
use crate::metrics::StageMetrics;
use crate::settings::{Credentials, Settings};
use crate::GameRecord;

/// Looks game ids up in the catalog, up to `chunk_size` per request
#[derive(Clone)]
pub struct CatalogCollector {
    catalog_url: String,
    credentials: Credentials,
    chunk_size: usize,
    fetcher: RateLimitedFetcher,
    group: BoundedGroup,
}

impl CatalogCollector {
    /// Build from run settings and a shared transport
    pub fn new(settings: &Settings, transport: Arc<dyn Transport>) -> Self {
        Self {
            catalog_url: settings.catalog_url.clone(),
            credentials: settings.credentials.clone(),
            chunk_size: settings.chunk_size,
            fetcher: RateLimitedFetcher::new("catalog", transport, settings.catalog_retry),
            group: BoundedGroup::new("catalog", settings.catalog_concurrency),
        }
    }

    /// Fetch records for `ids`.
    ///
    /// No ids means no request. Up to `chunk_size` ids go out as one request;
    /// more are split into contiguous chunks fetched concurrently. Records come
    /// back in response order within a chunk, and in completion order across
    /// chunks.
    pub async fn collect(&self, ids: &[u64]) -> CollectResult<Vec<GameRecord>> {
        if ids.is_empty() {
            debug!("No ids to look up, skipping catalog");
            return Ok(Vec::new());
        }

        let metrics = StageMetrics::start("catalog");
        let result = self
            .collect_inner(ids)
            .instrument(info_span!("catalog", ids = ids.len()))
            .await;
        match &result {
            Ok(records) => metrics.record_success(records.len()),
            Err(e) => metrics.record_failure(e.kind().as_str()),
        }
        result
    }

    async fn collect_inner(&self, ids: &[u64]) -> CollectResult<Vec<GameRecord>> {
        if ids.len() <= self.chunk_size {
            return self.lookup(ids).await;
        }

        let chunks = chunk_ids(ids, self.chunk_size)?;
        info!(
            ids = ids.len(),
            chunks = chunks.len(),
            chunk_size = self.chunk_size,
            "Looking up catalog in chunks"
        );
        let batches = self
            .group
            .run(chunks.into_iter().map(|chunk| self.lookup(chunk)))
            .await?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// The request sent for one chunk
    pub fn request_for(&self, ids: &[u64]) -> FetchRequest {
        FetchRequest::post(&self.catalog_url, build_query(ids, CATALOG_LIMIT))
            .header("Authorization", self.credentials.authorization())
            .header("Client-ID", self.credentials.client_id())
    }

    async fn lookup(&self, ids: &[u64]) -> CollectResult<Vec<GameRecord>> {
        let body = self.fetcher.fetch(&self.request_for(ids)).await?;
        let records = parse_catalog_response(&body).map_err(CollectError::from)?;
        if records.is_empty() {
            warn!(ids = ids.len(), "Catalog returned no games for chunk");
        } else {
            debug!(ids = ids.len(), records = records.len(), "Catalog chunk parsed");
        }
        Ok(records)
    }
}
