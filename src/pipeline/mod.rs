//! Pipeline entry points for watcher operations.
//!
//! - `Scanner`: run every enabled topic, or one by name
//! - `TopicRunner`: one topic's fetch, extract, diff and notify pass
//! - `add_or_update_topic` / `list_topics`: topic administration

pub mod diff;
pub mod runner;
pub mod scan;
pub mod topics;

pub use diff::DiffEngine;
pub use runner::TopicRunner;
pub use scan::Scanner;
pub use topics::{add_or_update_topic, list_topics};
