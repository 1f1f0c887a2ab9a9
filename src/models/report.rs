//! Per-topic scan results.

use std::fmt::Write;

use crate::models::ListingItem;

const SEPARATOR_WIDTH: usize = 50;

/// Result of trying to notify about new listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Channel disabled or not configured at all
    Skipped,
    /// Message handed to the mail server
    Sent { recipient: String },
    /// Channel partially configured, nothing sent
    Incomplete { missing: Vec<String> },
    /// Building or sending the message failed
    Failed { reason: String },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Where a topic's pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// The page could not be fetched
    FetchFailed { reason: String },
    /// The site answered with its anti-bot page
    Challenge,
    /// The page had no listing containers
    NoListings,
    /// Listings were diffed against state
    Scanned {
        new_items: Vec<ListingItem>,
        delivery: Option<Delivery>,
    },
    /// Anything else went wrong
    Failed { message: String, trace: String },
}

/// Transient summary of one topic's pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub topic: String,
    pub url: String,
    pub outcome: TopicOutcome,
}

impl ScanReport {
    pub fn new(topic: impl Into<String>, url: impl Into<String>, outcome: TopicOutcome) -> Self {
        Self {
            topic: topic.into(),
            url: url.into(),
            outcome,
        }
    }

    /// Number of listings not seen before this pass.
    pub fn new_count(&self) -> usize {
        match &self.outcome {
            TopicOutcome::Scanned { new_items, .. } => new_items.len(),
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            TopicOutcome::FetchFailed { .. } | TopicOutcome::Failed { .. }
        )
    }

    /// Human-readable report for this topic.
    pub fn render(&self) -> String {
        let mut out = format!("Topic: {}\nURL: {}\n\n", self.topic, self.url);

        match &self.outcome {
            TopicOutcome::FetchFailed { reason } => {
                let _ = write!(out, "Could not fetch content: {reason}");
            }
            TopicOutcome::Challenge => {
                out.push_str("No listings extracted: the site answered with a bot-challenge page.");
            }
            TopicOutcome::NoListings => out.push_str("No listings found on the page."),
            TopicOutcome::Scanned {
                new_items,
                delivery,
            } => {
                out.push_str(&format_listings(new_items, &self.topic));
                match delivery {
                    Some(Delivery::Sent { recipient }) => {
                        let _ = write!(out, "\nEmail notification sent to {recipient}.");
                    }
                    Some(Delivery::Incomplete { missing }) => {
                        let _ = write!(
                            out,
                            "\nEmail not sent, settings incomplete (missing: {}).",
                            missing.join(", ")
                        );
                    }
                    Some(Delivery::Failed { reason }) => {
                        let _ = write!(out, "\nEmail notification failed: {reason}");
                    }
                    Some(Delivery::Skipped) | None => {}
                }
            }
            TopicOutcome::Failed { message, trace } => {
                let _ = write!(
                    out,
                    "Error while scanning '{}': {message}\n\n{trace}",
                    self.topic
                );
            }
        }

        out
    }
}

/// Format new listings as a numbered plain-text digest.
pub fn format_listings(items: &[ListingItem], topic: &str) -> String {
    if items.is_empty() {
        return format!("No new listings for '{topic}'.");
    }

    let mut out = format!("Found {} new listings for '{topic}':\n\n", items.len());
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, item.title);
        let _ = writeln!(out, "   Price: {}", item.price);
        let _ = writeln!(out, "   Address: {}", item.address);
        let _ = writeln!(out, "   Date: {}", item.posted_date);
        let _ = writeln!(out, "   Link: {}\n", item.link_or_placeholder());
    }
    out
}

/// Ordered reports of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub reports: Vec<ScanReport>,
}

impl ScanSummary {
    pub fn total_new(&self) -> usize {
        self.reports.iter().map(ScanReport::new_count).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_failure()).count()
    }

    /// All topic reports, in scan order, separated by rule lines.
    pub fn render(&self) -> String {
        if self.reports.is_empty() {
            return "No topics available to scan. Add one with the 'add' command.".to_string();
        }

        let rule = "=".repeat(SEPARATOR_WIDTH);
        self.reports
            .iter()
            .map(|r| format!("{rule}\n{}", r.render()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
