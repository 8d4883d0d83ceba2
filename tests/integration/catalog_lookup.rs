//! Integration tests for batched catalog lookups

use crate::support::{catalog_json, ids_in_query, test_settings, ScriptedTransport, CATALOG};
use gamelog_harvester::collector::{CatalogCollector, FatalKind};
use gamelog_harvester::fetcher::{Method, RawResponse};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_empty_input_sends_nothing() {
    let transport = Arc::new(ScriptedTransport::new().with_full_catalog());
    let records = CatalogCollector::new(&test_settings(), transport.clone())
        .collect(&[])
        .await
        .unwrap();
    assert!(records.is_empty());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_small_input_is_one_request() {
    let transport = Arc::new(ScriptedTransport::new().with_full_catalog());
    let records = CatalogCollector::new(&test_settings(), transport.clone())
        .collect(&[1, 2, 3])
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, CATALOG);
    assert!(request
        .headers
        .contains(&("Authorization".to_string(), "Bearer test-token".to_string())));
    assert!(request
        .headers
        .contains(&("Client-ID".to_string(), "test-client".to_string())));
    let body = request.body.as_deref().unwrap();
    assert!(body.starts_with("fields name,first_release_date,"));
    assert!(body.ends_with("where id = (1, 2, 3);limit 500;"));

    let ids: Vec<u64> = records.iter().map(|r| r.game_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(records[0].title.as_deref(), Some("Game 1"));
    assert_eq!(records[0].release_year, Some(2018));
    assert_eq!(records[0].developers, Some(vec!["Studio".to_string()]));
    assert_eq!(records[0].publishers, Some(vec!["Label".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_large_input_is_chunked_and_bounded() {
    let ids: Vec<u64> = (1..=1201).collect();
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_full_catalog()
            .with_latency(Duration::from_millis(200)),
    );
    let records = CatalogCollector::new(&test_settings(), transport.clone())
        .collect(&ids)
        .await
        .unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    let mut sizes: Vec<usize> = requests
        .iter()
        .map(|r| ids_in_query(r.body.as_deref().unwrap()).len())
        .collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![201, 500, 500]);
    assert!(transport.peak("catalog") <= 3);

    let seen: HashSet<u64> = records.iter().map(|r| r.game_id).collect();
    assert_eq!(records.len(), 1201);
    assert_eq!(seen.len(), 1201);
}

#[tokio::test(start_paused = true)]
async fn test_throttled_chunks_retry_within_cap() {
    let ids: Vec<u64> = (1..=2600).collect();
    let calls = Arc::new(AtomicUsize::new(0));
    let throttled = Arc::new(AtomicUsize::new(0));
    let transport = {
        let calls = Arc::clone(&calls);
        let throttled = Arc::clone(&throttled);
        Arc::new(
            ScriptedTransport::new()
                .with_catalog(move |ids| {
                    if calls.fetch_add(1, Ordering::SeqCst) % 3 == 2 {
                        throttled.fetch_add(1, Ordering::SeqCst);
                        RawResponse::new(429, "")
                    } else {
                        RawResponse::new(200, catalog_json(ids))
                    }
                })
                .with_latency(Duration::from_millis(200)),
        )
    };
    let records = CatalogCollector::new(&test_settings(), transport.clone())
        .collect(&ids)
        .await
        .unwrap();

    let seen: HashSet<u64> = records.iter().map(|r| r.game_id).collect();
    assert_eq!(records.len(), 2600);
    assert_eq!(seen.len(), 2600);
    assert!(throttled.load(Ordering::SeqCst) > 0);
    assert_eq!(
        transport.count("catalog"),
        6 + throttled.load(Ordering::SeqCst)
    );
    assert!(transport.peak("catalog") <= 3);
}

#[tokio::test(start_paused = true)]
async fn test_custom_chunk_size_and_concurrency() {
    let mut settings = test_settings();
    settings.chunk_size = 2;
    settings.catalog_concurrency = 1;
    let transport = Arc::new(
        ScriptedTransport::new()
            .with_full_catalog()
            .with_latency(Duration::from_millis(10)),
    );
    let records = CatalogCollector::new(&settings, transport.clone())
        .collect(&[5, 6, 7, 8, 9])
        .await
        .unwrap();

    assert_eq!(transport.count("catalog"), 3);
    assert_eq!(transport.peak("catalog"), 1);
    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn test_empty_response_is_not_fatal() {
    for body in ["", "[]"] {
        let transport = Arc::new(ScriptedTransport::new().with_catalog(move |_| RawResponse::new(200, body)));
        let records = CatalogCollector::new(&test_settings(), transport)
            .collect(&[404_404])
            .await
            .unwrap();
        assert!(records.is_empty());
    }
}

#[tokio::test]
async fn test_unparseable_response_is_fatal() {
    let transport = Arc::new(ScriptedTransport::new().with_catalog(|_| RawResponse::new(200, "<html>")));
    let err = CatalogCollector::new(&test_settings(), transport)
        .collect(&[1])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FatalKind::MalformedResponse);
}

#[tokio::test]
async fn test_bad_query_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new().with_catalog(|_| {
        RawResponse::new(400, r#"[{"title":"Syntax Error","status":400}]"#)
    }));
    let err = CatalogCollector::new(&test_settings(), transport.clone())
        .collect(&[1])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FatalKind::Rejected);
    assert_eq!(transport.count("catalog"), 1);
}

#[test]
fn test_request_for_chunk() {
    let collector = CatalogCollector::new(&test_settings(), Arc::new(ScriptedTransport::new()));
    let request = collector.request_for(&[42]);
    assert_eq!(request.body.as_deref().map(|b| b.ends_with("where id = (42);limit 500;")), Some(true));
    assert_eq!(catalog_json(&[]), "[]");
}
