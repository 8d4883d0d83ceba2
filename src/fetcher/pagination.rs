//! Pagination helpers
//!
//! Two ways a large collection gets split into requests:
//! - Listing pages: the site reports its last page, every page 1..=last is fetched
//! - Catalog chunks: an id list is cut into contiguous slices the API accepts
//!
//! Includes a maximum page guard so a bogus pagination control cannot fan out
//! an unbounded number of requests.

use crate::collector::config::MAX_PAGES;
use crate::fetcher::{FetcherError, FetcherResult};
use std::ops::RangeInclusive;
use tracing::debug;

/// Page numbers to fetch for a listing whose last page is `last_page`.
///
/// # Errors
/// Returns a parse error when `last_page` is zero or exceeds [`MAX_PAGES`].
pub fn page_numbers(last_page: usize) -> FetcherResult<RangeInclusive<usize>> {
    if last_page == 0 {
        return Err(FetcherError::Parse(
            "pagination reported zero pages".to_string(),
        ));
    }
    if last_page > MAX_PAGES {
        return Err(FetcherError::Parse(format!(
            "pagination reported {last_page} pages, more than the limit of {MAX_PAGES}"
        )));
    }
    Ok(1..=last_page)
}

/// Split `ids` into contiguous chunks of `chunk_size` (last may be shorter).
///
/// Concatenating the chunks reproduces `ids` exactly, and there are
/// `ceil(ids.len() / chunk_size)` of them. An empty input yields no chunks.
///
/// # Errors
/// Returns a parse error when `chunk_size` is zero.
pub fn chunk_ids(ids: &[u64], chunk_size: usize) -> FetcherResult<Vec<&[u64]>> {
    if chunk_size == 0 {
        return Err(FetcherError::Parse("chunk size must be at least 1".to_string()));
    }
    let chunks: Vec<&[u64]> = ids.chunks(chunk_size).collect();
    debug!(
        ids = ids.len(),
        chunk_size = chunk_size,
        chunks = chunks.len(),
        "Partitioned id list"
    );
    Ok(chunks)
}
