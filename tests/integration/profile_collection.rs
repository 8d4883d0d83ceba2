//! Integration tests for paginated profile collection

use crate::support::{
    card, games_url, log_html, log_url, page_url, profile_transport, test_settings, Card,
};
use gamelog_harvester::collector::{FatalKind, ProfileCollector};
use gamelog_harvester::fetcher::RawResponse;
use std::sync::Arc;
use std::time::Duration;

fn many_cards(prefix: &'static str, ids: std::ops::Range<u64>) -> Vec<Card<'static>> {
    ids.map(|id| Card {
        id,
        slug: Box::leak(format!("{prefix}-{id}").into_boxed_str()),
        rating: Some((id % 10) as u8),
    })
    .collect()
}

#[tokio::test(start_paused = true)]
async fn test_entries_follow_listing_order() {
    let pages = vec![
        many_cards("p1", 1..4),
        many_cards("p2", 4..7),
        many_cards("p3", 7..9),
    ];
    let transport = Arc::new(profile_transport("alice", &pages).with_latency(Duration::from_millis(50)));
    let entries = ProfileCollector::new(&test_settings(), transport.clone())
        .collect("alice")
        .await
        .unwrap();

    let ids: Vec<u64> = entries.iter().map(|e| e.game_id).collect();
    assert_eq!(ids, (1..9).collect::<Vec<_>>());
    assert!(entries.iter().all(|e| e.username == "alice"));
    assert!(entries.iter().all(|e| e.status.as_deref() == Some("Completed")));
    assert!(entries.iter().all(|e| e.hours_played == Some(10.5)));
    assert!(entries
        .iter()
        .all(|e| e.platforms_played == Some(vec!["PC".to_string()])));
    assert_eq!(entries[2].user_rating, Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_stage_concurrency_ceilings() {
    let pages: Vec<Vec<Card<'static>>> = (0..6)
        .map(|p| many_cards("g", p * 5..p * 5 + 5))
        .collect();
    let transport = Arc::new(profile_transport("alice", &pages).with_latency(Duration::from_millis(100)));
    let entries = ProfileCollector::new(&test_settings(), transport.clone())
        .collect("alice")
        .await
        .unwrap();

    assert_eq!(entries.len(), 30);
    assert_eq!(transport.count("root"), 1);
    assert_eq!(transport.count("pages"), 6);
    assert_eq!(transport.count("details"), 30);
    assert!(transport.peak("pages") <= 2);
    assert!(transport.peak("details") <= 4);
    assert_eq!(transport.peak("details"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_each_detail_page_fetched_once() {
    let pages = vec![vec![card(1, "a"), card(2, "b"), card(3, "c")]];
    let transport = Arc::new(profile_transport("alice", &pages));
    ProfileCollector::new(&test_settings(), transport.clone())
        .collect("alice")
        .await
        .unwrap();

    for slug in ["a", "b", "c"] {
        assert_eq!(transport.hits(&log_url("alice", slug)), 1);
    }
    assert_eq!(transport.hits(&page_url("alice", 1)), 1);
    assert_eq!(transport.hits(&games_url("alice")), 1);
}

#[tokio::test(start_paused = true)]
async fn test_detail_fields_can_be_missing() {
    let pages = vec![vec![card(1, "a"), card(2, "b")]];
    let transport = Arc::new(profile_transport("alice", &pages).page(log_url("alice", "b"), log_html(None, None, &[])));
    let entries = ProfileCollector::new(&test_settings(), transport)
        .collect("alice")
        .await
        .unwrap();

    assert_eq!(entries[0].status.as_deref(), Some("Completed"));
    assert!(entries[1].status.is_none());
    assert!(entries[1].hours_played.is_none());
    assert!(entries[1].platforms_played.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_detail_404_is_fatal() {
    let pages = vec![vec![card(1, "a"), card(2, "b")]];
    let transport = Arc::new(
        profile_transport("alice", &pages).route(log_url("alice", "b"), vec![RawResponse::new(404, "")]),
    );
    let err = ProfileCollector::new(&test_settings(), transport)
        .collect("alice")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FatalKind::ResourceAbsent);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_detail_retries_without_failing_siblings() {
    let pages = vec![vec![
        card(1, "a"),
        card(2, "b"),
        card(3, "c"),
        card(4, "d"),
        card(5, "e"),
    ]];
    let transport = Arc::new(
        profile_transport("alice", &pages)
            .route(
                log_url("alice", "c"),
                vec![
                    RawResponse::new(429, ""),
                    RawResponse::new(429, ""),
                    RawResponse::new(200, log_html(Some("Played"), None, &[])),
                ],
            )
            .with_latency(Duration::from_millis(100)),
    );
    let entries = ProfileCollector::new(&test_settings(), transport.clone())
        .collect("alice")
        .await
        .unwrap();

    assert_eq!(entries.len(), 5);
    assert_eq!(transport.hits(&log_url("alice", "c")), 3);
    for slug in ["a", "b", "d", "e"] {
        assert_eq!(transport.hits(&log_url("alice", slug)), 1);
    }
    assert!(entries.iter().all(|e| e.status.is_some()));
    assert_eq!(entries[2].status.as_deref(), Some("Played"));
    assert!(transport.peak("details") <= 4);
}

#[tokio::test(start_paused = true)]
async fn test_empty_profile() {
    let transport = Arc::new(profile_transport("nobody", &[vec![]]));
    let err = ProfileCollector::new(&test_settings(), transport.clone())
        .collect("nobody")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FatalKind::EmptyProfile);
    assert_eq!(transport.count("details"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_listing_without_pagination_is_malformed() {
    let transport = Arc::new(
        crate::support::ScriptedTransport::new().page(games_url("alice"), "<html><body>maintenance</body></html>"),
    );
    let err = ProfileCollector::new(&test_settings(), transport)
        .collect("alice")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FatalKind::MalformedResponse);
}

#[tokio::test(start_paused = true)]
async fn test_detail_pages_are_paced() {
    let pages = vec![vec![card(1, "a"), card(2, "b")]];
    let mut settings = test_settings();
    settings.detail_concurrency = 1;
    let transport = Arc::new(profile_transport("alice", &pages));

    let start = tokio::time::Instant::now();
    ProfileCollector::new(&settings, transport)
        .collect("alice")
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[test]
fn test_urls() {
    let collector = ProfileCollector::new(
        &test_settings(),
        Arc::new(crate::support::ScriptedTransport::new()),
    );
    assert_eq!(collector.games_url("alice"), "http://site.test/u/alice/games/");
    assert_eq!(collector.page_url("alice", 3), "http://site.test/u/alice/games/?page=3");
    assert_eq!(collector.log_url("alice", "celeste"), "http://site.test/u/alice/logs/celeste");
}
