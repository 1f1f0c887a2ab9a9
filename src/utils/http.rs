// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::models::FetcherConfig;

/// `Accept` header sent with every page request.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml";

/// Client hint header mirroring a desktop Chrome.
pub const SEC_CH_UA: &str = r#""Chromium";v="110", "Not A(Brand";v="24", "Google Chrome";v="110""#;

/// Create a configured asynchronous HTTP client.
///
/// The User-Agent is set per request, so none is configured here.
pub fn create_async_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Pick one User-Agent uniformly at random from the pool.
///
/// Pure apart from the supplied RNG; returns `None` for an empty pool.
pub fn pick_user_agent<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> Option<&'a str> {
    pool.choose(rng).map(String::as_str)
}
