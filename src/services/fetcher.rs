// src/services/fetcher.rs

//! Listing page fetcher.
//!
//! Issues one GET per call with a rotated User-Agent and Hebrew locale
//! headers. There is no retry here; a failed fetch ends that topic's pass.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;
use crate::utils::http::{ACCEPT_HTML, SEC_CH_UA, create_async_client, pick_user_agent};

/// Source of raw listing page markup.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the page at `url` and return its body.
    ///
    /// Non-2xx responses and transport errors are `AppError::Fetch`.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    config: FetcherConfig,
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let user_agent = pick_user_agent(&self.config.user_agents, &mut rand::thread_rng())
            .ok_or_else(|| AppError::config("fetcher.user_agents is empty"))?;

        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(ACCEPT, ACCEPT_HTML)
            .header(REFERER, &self.config.referer)
            .header("sec-ch-ua", SEC_CH_UA)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}
