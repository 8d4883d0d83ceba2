//! Integration tests for logging and tracing

use crate::support::{catalog_json, test_settings, ScriptedTransport};
use gamelog_harvester::collector::CatalogCollector;
use gamelog_harvester::fetcher::RawResponse;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Writer that appends into a shared buffer
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

fn capture(json: bool) -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("gamelog_harvester=debug"))
        .with_ansi(false)
        .with_writer(move || writer.clone());
    let guard = if json {
        tracing::subscriber::set_default(builder.json().finish())
    } else {
        tracing::subscriber::set_default(builder.finish())
    };
    (captured, guard)
}

#[tokio::test(start_paused = true)]
async fn test_retry_and_recovery_are_logged() {
    let (captured, _guard) = capture(false);
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = {
        let calls = Arc::clone(&calls);
        Arc::new(ScriptedTransport::new().with_catalog(move |ids| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                RawResponse::new(429, "")
            } else {
                RawResponse::new(200, catalog_json(ids))
            }
        }))
    };

    CatalogCollector::new(&test_settings(), transport)
        .collect(&[1])
        .await
        .unwrap();

    let text = captured.text();
    assert!(text.contains("WARN"), "{text}");
    assert!(text.contains("Retrying (attempt 1/6) after rate limit exceeded - waiting 1.0 seconds"));
    assert!(text.contains("Retry attempt 2/6 succeeded [catalog]"));
    assert!(text.contains("Stage completed"));
}

#[tokio::test]
async fn test_fatal_status_is_logged_with_suggestion() {
    let (captured, _guard) = capture(false);
    let transport = Arc::new(ScriptedTransport::new().with_catalog(|_| RawResponse::new(401, "nope")));

    CatalogCollector::new(&test_settings(), transport)
        .collect(&[1])
        .await
        .unwrap_err();

    let text = captured.text();
    assert!(text.contains("ERROR"));
    assert!(text.contains("[FAILED] Request failed after 1 attempt(s)"));
    assert!(text.contains("Verify TOKEN and CLIENT_ID"));
    assert!(text.contains("Stage failed"));
}

#[tokio::test]
async fn test_json_format_carries_structured_fields() {
    let (captured, _guard) = capture(true);
    let transport = Arc::new(ScriptedTransport::new().with_full_catalog());

    CatalogCollector::new(&test_settings(), transport)
        .collect(&[1, 2])
        .await
        .unwrap();

    let text = captured.text();
    let stage_line = text
        .lines()
        .find(|line| line.contains("Stage completed"))
        .expect("stage completion logged");
    let value: serde_json::Value = serde_json::from_str(stage_line).unwrap();
    assert_eq!(value["fields"]["stage"], "catalog");
    assert_eq!(value["fields"]["items_count"], 2);
}

#[test]
fn test_env_filter_parsing() {
    let _filter = EnvFilter::new("gamelog_harvester::fetcher=debug,gamelog_harvester=info");
    let _filter = EnvFilter::new("warn,gamelog_harvester=trace");
}
