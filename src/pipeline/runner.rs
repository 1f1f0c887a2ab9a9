//! One topic's pass: fetch, extract, diff, notify, report.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use url::Url;

use crate::error::{AppError, Result, error_chain};
use crate::models::{ScanReport, Topic, TopicOutcome};
use crate::pipeline::diff::DiffEngine;
use crate::services::{Extraction, Extractor, Fetcher, Notifier};
use crate::storage::StateStore;

/// Runs the per-topic pipeline against borrowed collaborators.
///
/// `run` never returns an error and never lets a panic escape: whatever
/// happens ends up in the report's `TopicOutcome`.
pub struct TopicRunner<'a> {
    fetcher: &'a dyn Fetcher,
    extractor: &'a Extractor,
    store: &'a dyn StateStore,
    notifier: &'a dyn Notifier,
}

impl<'a> TopicRunner<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        extractor: &'a Extractor,
        store: &'a dyn StateStore,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            store,
            notifier,
        }
    }

    pub async fn run(&self, topic: &Topic) -> ScanReport {
        if topic.name.trim().is_empty() || topic.url.trim().is_empty() {
            log::error!("Skipping topic with missing name or URL: {topic:?}");
            return ScanReport::new(
                &topic.name,
                &topic.url,
                TopicOutcome::Failed {
                    message: "missing topic name or URL".to_string(),
                    trace: String::new(),
                },
            );
        }

        let base = match Url::parse(&topic.url) {
            Ok(base) => base,
            Err(e) => {
                log::error!("Topic '{}' has an invalid URL: {e}", topic.name);
                return ScanReport::new(
                    &topic.name,
                    &topic.url,
                    TopicOutcome::Failed {
                        message: format!("invalid URL '{}': {e}", topic.url),
                        trace: String::new(),
                    },
                );
            }
        };

        let outcome = match AssertUnwindSafe(self.pass(topic, &base))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                log::error!("Scan of '{}' failed: {e}", topic.name);
                TopicOutcome::Failed {
                    message: e.to_string(),
                    trace: error_chain(&e),
                }
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Scan of '{}' panicked: {message}", topic.name);
                TopicOutcome::Failed {
                    trace: format!("panic: {message}"),
                    message,
                }
            }
        };

        ScanReport::new(&topic.name, &topic.url, outcome)
    }

    async fn pass(&self, topic: &Topic, base: &Url) -> Result<TopicOutcome> {
        log::info!("Scanning '{}' ({})", topic.name, topic.url);

        let html = match self.fetcher.fetch(&topic.url).await {
            Ok(html) => html,
            Err(AppError::Fetch { reason, .. }) => {
                log::warn!("Could not fetch '{}': {reason}", topic.name);
                return Ok(TopicOutcome::FetchFailed { reason });
            }
            Err(e) => return Err(e),
        };

        let items = match self.extractor.parse(&html, Some(base)) {
            Extraction::Challenge => return Ok(TopicOutcome::Challenge),
            Extraction::Listings(items) if items.is_empty() => {
                log::info!("No listings found for '{}'", topic.name);
                return Ok(TopicOutcome::NoListings);
            }
            Extraction::Listings(items) => items,
        };
        log::debug!("Extracted {} listings for '{}'", items.len(), topic.name);

        let new_items = DiffEngine::new(self.store)
            .diff_and_persist(&topic.name, &items)
            .await?;

        let delivery = if new_items.is_empty() {
            None
        } else {
            Some(self.notifier.notify(&new_items, &topic.name).await)
        };

        Ok(TopicOutcome::Scanned {
            new_items,
            delivery,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Delivery, ExtractorConfig, ListingItem};
    use crate::storage::LocalStateStore;

    const PAGE: &str = r#"<html><head><title>Results</title></head><body>
        <div class="feeditem" item-id="1"><span class="title">Flat</span></div>
        <div class="feeditem" item-id="2"><span class="title">House</span></div>
    </body></html>"#;

    const CHALLENGE: &str =
        "<html><head><title>ShieldSquare Captcha</title></head><body></body></html>";

    enum Page {
        Html(&'static str),
        Fetch(&'static str),
        Other,
        Panic,
    }

    struct StaticFetcher(Page);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            match &self.0 {
                Page::Html(html) => Ok(html.to_string()),
                Page::Fetch(reason) => Err(AppError::fetch(url, reason)),
                Page::Other => Err(AppError::config("no user agents")),
                Page::Panic => panic!("fetcher exploded"),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, items: &[ListingItem], topic: &str) -> Delivery {
            self.calls
                .lock()
                .unwrap()
                .push((topic.to_string(), items.len()));
            Delivery::Sent {
                recipient: "me@example.com".into(),
            }
        }
    }

    /// Mail server that always refuses the message.
    struct RejectingNotifier;

    #[async_trait]
    impl Notifier for RejectingNotifier {
        async fn notify(&self, _items: &[ListingItem], _topic: &str) -> Delivery {
            Delivery::Failed {
                reason: "535 authentication failed".into(),
            }
        }
    }

    /// Store whose writes always fail, reading through to a local store.
    struct ReadOnlyStore(LocalStateStore);

    #[async_trait]
    impl StateStore for ReadOnlyStore {
        async fn load(&self, topic: &str) -> Vec<ListingItem> {
            self.0.load(topic).await
        }

        async fn save(&self, _topic: &str, _items: &[ListingItem]) -> Result<()> {
            Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only file system",
            )))
        }
    }

    fn haifa() -> Topic {
        Topic::new("Haifa", "https://www.yad2.co.il/realestate/forsale")
    }

    async fn run_with(
        page: Page,
        store: &dyn StateStore,
        notifier: &dyn Notifier,
    ) -> ScanReport {
        let fetcher = StaticFetcher(page);
        let extractor = Extractor::new(&ExtractorConfig::default()).unwrap();
        let runner = TopicRunner::new(&fetcher, &extractor, store, notifier);
        runner.run(&haifa()).await
    }

    fn recorded_ids(items: &[ListingItem]) -> Vec<Option<&str>> {
        items.iter().map(|i| i.id.as_deref()).collect()
    }

    #[tokio::test]
    async fn test_new_listings_are_notified_once() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let first = run_with(Page::Html(PAGE), &store, &notifier).await;
        let second = run_with(Page::Html(PAGE), &store, &notifier).await;

        assert_eq!(first.new_count(), 2);
        assert!(matches!(
            first.outcome,
            TopicOutcome::Scanned { delivery: Some(Delivery::Sent { .. }), .. }
        ));
        assert_eq!(
            second.outcome,
            TopicOutcome::Scanned {
                new_items: vec![],
                delivery: None
            }
        );
        assert_eq!(
            *notifier.calls.lock().unwrap(),
            vec![("Haifa".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Fetch("HTTP 403 Forbidden"), &store, &notifier).await;

        assert_eq!(
            report.outcome,
            TopicOutcome::FetchFailed {
                reason: "HTTP 403 Forbidden".into()
            }
        );
        assert!(report.is_failure());
        assert!(!store.path_for("Haifa").exists());
    }

    #[tokio::test]
    async fn test_challenge_leaves_state_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Html(CHALLENGE), &store, &notifier).await;

        assert_eq!(report.outcome, TopicOutcome::Challenge);
        assert!(!store.path_for("Haifa").exists());
        assert!(notifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_is_no_listings() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Html("<html><body></body></html>"), &store, &notifier).await;

        assert_eq!(report.outcome, TopicOutcome::NoListings);
    }

    #[tokio::test]
    async fn test_unexpected_error_carries_chain() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Other, &store, &notifier).await;

        match report.outcome {
            TopicOutcome::Failed { message, trace } => {
                assert!(message.contains("no user agents"));
                assert!(trace.contains("no user agents"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Panic, &store, &notifier).await;

        match report.outcome {
            TopicOutcome::Failed { message, .. } => assert_eq!(message, "fetcher exploded"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_delivery_still_records_listings() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());

        let report = run_with(Page::Html(PAGE), &store, &RejectingNotifier).await;

        match &report.outcome {
            TopicOutcome::Scanned {
                new_items,
                delivery: Some(Delivery::Failed { reason }),
            } => {
                assert_eq!(new_items.len(), 2);
                assert!(reason.contains("535"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!report.is_failure());
        assert_eq!(
            recorded_ids(&store.load("Haifa").await),
            vec![Some("1"), Some("2")]
        );
    }

    #[tokio::test]
    async fn test_state_write_failure_keeps_prior_state() {
        let tmp = TempDir::new().unwrap();
        let local = LocalStateStore::new(tmp.path());
        local
            .save("Haifa", &[ListingItem::new(Some("1".into()))])
            .await
            .unwrap();
        let store = ReadOnlyStore(local.clone());
        let notifier = RecordingNotifier::default();

        let report = run_with(Page::Html(PAGE), &store, &notifier).await;

        match report.outcome {
            TopicOutcome::Failed { message, trace } => {
                assert!(message.contains("read-only file system"));
                assert!(!trace.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(recorded_ids(&local.load("Haifa").await), vec![Some("1")]);
        assert!(notifier.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();
        let fetcher = StaticFetcher(Page::Panic);
        let extractor = Extractor::new(&ExtractorConfig::default()).unwrap();
        let runner = TopicRunner::new(&fetcher, &extractor, &store, &notifier);

        let report = runner.run(&Topic::new("typo", "htp//broken url")).await;

        match report.outcome {
            TopicOutcome::Failed { message, .. } => assert!(message.starts_with("invalid URL")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_url_fails_without_fetching() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStateStore::new(tmp.path());
        let notifier = RecordingNotifier::default();
        let fetcher = StaticFetcher(Page::Panic);
        let extractor = Extractor::new(&ExtractorConfig::default()).unwrap();
        let runner = TopicRunner::new(&fetcher, &extractor, &store, &notifier);

        let report = runner.run(&Topic::new("Haifa", "")).await;

        assert!(matches!(
            report.outcome,
            TopicOutcome::Failed { ref message, .. } if message == "missing topic name or URL"
        ));
    }
}
