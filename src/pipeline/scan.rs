//! Scan coordination across configured topics.

use crate::error::{AppError, Result};
use crate::models::{Config, ScanReport, ScanSummary};
use crate::pipeline::runner::TopicRunner;
use crate::services::{EmailNotifier, Extractor, Fetcher, HttpFetcher, Notifier};
use crate::storage::{LocalStateStore, StateStore};

/// Owns the collaborators of a scan and runs topics one after another.
pub struct Scanner {
    config: Config,
    fetcher: Box<dyn Fetcher>,
    extractor: Extractor,
    store: Box<dyn StateStore>,
    notifier: Box<dyn Notifier>,
}

impl Scanner {
    /// Assemble a scanner from explicit collaborators.
    ///
    /// The configuration is validated first, so a config with colliding
    /// topic keys never reaches a scan.
    pub fn new(
        config: Config,
        fetcher: Box<dyn Fetcher>,
        store: Box<dyn StateStore>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = Extractor::new(&config.extractor)?;

        Ok(Self {
            config,
            fetcher,
            extractor,
            store,
            notifier,
        })
    }

    /// Scanner with HTTP fetching, file state under `data_dir` and email.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        let store = LocalStateStore::new(&config.data_dir);
        let notifier = EmailNotifier::new(config.email.clone());

        Self::new(config, Box::new(fetcher), Box::new(store), Box::new(notifier))
    }

    fn runner(&self) -> TopicRunner<'_> {
        TopicRunner::new(
            self.fetcher.as_ref(),
            &self.extractor,
            self.store.as_ref(),
            self.notifier.as_ref(),
        )
    }

    /// Scan every enabled topic in configuration order.
    ///
    /// One topic's failure never affects the others; the summary holds one
    /// report per enabled topic.
    pub async fn scan(&self) -> ScanSummary {
        let runner = self.runner();
        let mut reports = Vec::new();

        for topic in self.config.enabled_topics() {
            reports.push(runner.run(topic).await);
        }

        let summary = ScanSummary { reports };
        log::info!(
            "Scan complete: {} topics, {} new listings, {} failed",
            summary.reports.len(),
            summary.total_new(),
            summary.failure_count()
        );
        summary
    }

    /// Scan a single enabled topic by name.
    pub async fn scan_topic(&self, name: &str) -> Result<ScanReport> {
        let topic = self
            .config
            .find_topic(name)
            .filter(|t| t.is_enabled())
            .ok_or_else(|| AppError::TopicUnavailable(name.to_string()))?;

        Ok(self.runner().run(topic).await)
    }
}
