//! Profile site HTML extraction
//!
//! Turns listing and log pages into [`LogEntry`] stubs and [`DetailFields`].
//! Parsing is synchronous and never holds a parsed document across an await.
//!
//! Identifying data (page count, game id, slug) is required and its absence is
//! a parse error. Everything else is optional and simply left unset.

use scraper::{ElementRef, Html, Selector};

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{DetailFields, LogEntry};

fn selector(css: &str) -> FetcherResult<Selector> {
    Selector::parse(css).map_err(|e| FetcherError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn has_child(element: ElementRef<'_>, matches: impl Fn(ElementRef<'_>) -> bool) -> bool {
    element.children().filter_map(ElementRef::wrap).any(matches)
}

/// Highest page number advertised by the listing's pagination controls.
///
/// # Errors
/// Returns [`FetcherError::Parse`] when no numeric `span.page` marker exists.
pub fn parse_last_page(html: &str) -> FetcherResult<usize> {
    let document = Html::parse_document(html);
    let pages = selector("span.page")?;

    document
        .select(&pages)
        .filter_map(|span| element_text(span).parse::<usize>().ok())
        .max()
        .ok_or_else(|| FetcherError::Parse("no pagination markers on listing page".to_string()))
}

/// Extract every game stub on one listing page, in page order.
///
/// # Errors
/// Returns [`FetcherError::Parse`] when a game card lacks its id or link.
pub fn parse_log_entries(html: &str, username: &str) -> FetcherResult<Vec<LogEntry>> {
    let document = Html::parse_document(html);
    let cards = selector("div.rating-hover")?;
    let cover = selector("div.game-cover")?;
    let link = selector("a[href]")?;
    let rating = selector("div[data-rating]")?;

    let mut entries = Vec::new();
    for card in document.select(&cards) {
        let game_id = card
            .select(&cover)
            .next()
            .and_then(|c| c.value().attr("game_id"))
            .and_then(|id| id.trim().parse::<u64>().ok())
            .ok_or_else(|| FetcherError::Parse("game card without a numeric game_id".to_string()))?;

        let slug = card
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(slug_from_href)
            .ok_or_else(|| FetcherError::Parse(format!("game card {game_id} without a link")))?;

        let mut entry = LogEntry::new(username, game_id, slug);
        if let Some(value) = card
            .select(&rating)
            .next()
            .and_then(|r| r.value().attr("data-rating"))
            .and_then(|r| r.trim().parse::<u8>().ok())
        {
            entry.user_rating = Some(value);
        }
        entries.push(entry);
    }
    Ok(entries)
}

fn slug_from_href(href: &str) -> Option<String> {
    href.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract status, play time and platforms from a game's log page.
pub fn parse_log_details(html: &str) -> FetcherResult<DetailFields> {
    let document = Html::parse_document(html);
    let current = selector("div.current")?;
    let paragraphs = selector("p")?;
    let columns = selector("div.col-auto")?;

    let status = document
        .select(&current)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());

    let hours_played = document
        .select(&paragraphs)
        .find(|p| has_child(*p, |c| c.value().name() == "i"))
        .and_then(|p| parse_hours(&element_text(p)));

    let mut platforms: Vec<String> = Vec::new();
    for column in document.select(&columns) {
        if !has_child(column, |c| c.value().classes().any(|cl| cl == "game-page-platform")) {
            continue;
        }
        let text = element_text(column);
        let name = text.split(" via ").next().unwrap_or_default().trim();
        if !name.is_empty() && !platforms.iter().any(|p| p == name) {
            platforms.push(name.to_string());
        }
    }

    Ok(DetailFields {
        status,
        hours_played,
        platforms: (!platforms.is_empty()).then_some(platforms),
    })
}

/// Convert `"<H>h <M>m"` into fractional hours rounded to 2 decimals.
///
/// Text without an `h` means no time was logged and yields `None`, as does
/// text whose numbers do not parse. A missing minutes part counts as zero.
pub fn parse_hours(text: &str) -> Option<f64> {
    let text = text.trim();
    if !text.contains('h') {
        return None;
    }

    let mut parts = text.split_whitespace();
    let hours: u32 = parts.next()?.strip_suffix('h')?.parse().ok()?;
    let minutes: u32 = match parts.next() {
        Some(part) => part.strip_suffix('m')?.parse().ok()?,
        None => 0,
    };

    let total = f64::from(hours) + f64::from(minutes) / 60.0;
    Some((total * 100.0).round() / 100.0)
}
