//! Service layer for the watcher.
//!
//! This module contains the pieces a topic's pass is built from:
//! - Page fetching (`Fetcher`, `HttpFetcher`)
//! - Listing extraction (`Extractor`)
//! - Notifications (`Notifier`, `EmailNotifier`)

mod extractor;
mod fetcher;
mod notifier;

pub use extractor::{CHALLENGE_LOG_TARGET, Extraction, Extractor};
pub use fetcher::{Fetcher, HttpFetcher};
pub use notifier::{EmailNotifier, Notifier, build_message, render_html, render_text, subject};
