//! Catalog API query building and response mapping
//!
//! The catalog speaks a semicolon-separated text query language. One batch
//! query selects the fields below for an explicit id list. Responses are JSON
//! arrays of game objects with nested name-bearing objects, mapped here into
//! flat [`GameRecord`]s.

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;

use crate::fetcher::{FetcherError, FetcherResult};
use crate::GameRecord;

/// Field selection clause for batch lookups
pub const CATALOG_FIELDS: &str = "fields name,first_release_date,genres.name,collections.name,\
involved_companies.company.name,involved_companies.*,platforms.name;";

/// Build the query body for one chunk of ids.
///
/// ```
/// use gamelog_harvester::fetcher::catalog_parser::build_query;
/// let body = build_query(&[1, 2, 3], 500);
/// assert!(body.ends_with("where id = (1, 2, 3);limit 500;"));
/// ```
pub fn build_query(ids: &[u64], limit: usize) -> String {
    let id_list = ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{CATALOG_FIELDS}where id = ({id_list});limit {limit};")
}

#[derive(Debug, Deserialize)]
struct CatalogGame {
    id: u64,
    name: Option<String>,
    first_release_date: Option<i64>,
    #[serde(default)]
    genres: Vec<Named>,
    #[serde(default)]
    involved_companies: Vec<InvolvedCompany>,
    #[serde(default)]
    platforms: Vec<Named>,
    #[serde(default)]
    collections: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvolvedCompany {
    company: Option<Named>,
    #[serde(default)]
    developer: bool,
    #[serde(default)]
    publisher: bool,
}

fn names(items: Vec<Named>) -> Option<Vec<String>> {
    let names: Vec<String> = items.into_iter().filter_map(|n| n.name).collect();
    (!names.is_empty()).then_some(names)
}

/// Calendar year (UTC) of a Unix timestamp in seconds
pub fn release_year(timestamp: i64) -> Option<i32> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).map(|dt| dt.year())
}

impl From<CatalogGame> for GameRecord {
    fn from(game: CatalogGame) -> Self {
        let mut developers = Vec::new();
        let mut publishers = Vec::new();
        for involved in game.involved_companies {
            let Some(name) = involved.company.and_then(|c| c.name) else {
                continue;
            };
            if involved.developer {
                developers.push(name.clone());
            }
            if involved.publisher {
                publishers.push(name);
            }
        }

        GameRecord {
            game_id: game.id,
            title: game.name,
            release_year: game.first_release_date.and_then(release_year),
            genres: names(game.genres),
            developers: (!developers.is_empty()).then_some(developers),
            publishers: (!publishers.is_empty()).then_some(publishers),
            platforms: names(game.platforms),
            series: names(game.collections),
        }
    }
}

/// Map a batch response body into records, preserving response order.
///
/// An empty body is treated like an empty array.
///
/// # Errors
/// Returns [`FetcherError::Parse`] when the body is not a JSON array of games.
pub fn parse_catalog_response(body: &str) -> FetcherResult<Vec<GameRecord>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let games: Vec<CatalogGame> = serde_json::from_str(body)
        .map_err(|e| FetcherError::Parse(format!("invalid catalog response: {e}")))?;
    Ok(games.into_iter().map(GameRecord::from).collect())
}
