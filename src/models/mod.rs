// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod report;
mod topic;

// Re-export all public types
pub use config::{Config, EmailConfig, ExtractorConfig, FetcherConfig, SmtpSettings, Upsert};
pub use listing::{ListingItem, NO_ADDRESS, NO_DATE, NO_PRICE, NO_TITLE};
pub use report::{Delivery, ScanReport, ScanSummary, TopicOutcome, format_listings};
pub use topic::{Topic, storage_key};
