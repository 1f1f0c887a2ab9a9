//! Topic administration on the configuration file.

use std::fmt::Write;
use std::path::Path;

use crate::error::Result;
use crate::models::{Config, Upsert};

/// Add a topic, or update the URL of an existing one, and save the config.
///
/// The topic is enabled either way. Keys this version does not know about
/// are written back unchanged.
pub fn add_or_update_topic(config_path: &Path, topic: &str, url: &str) -> Result<String> {
    let mut config = Config::load_or_default(config_path)?;
    let upsert = config.upsert_topic(topic, url)?;
    config.save(config_path)?;

    let topic = topic.trim();
    let message = match upsert {
        Upsert::Added => format!("Topic '{topic}' added with URL: {url}"),
        Upsert::Updated => format!("Topic '{topic}' updated with URL: {url}"),
    };
    log::info!("{message}");
    Ok(message)
}

/// Render the configured topics with their URL and enabled state.
pub fn list_topics(config: &Config) -> String {
    if config.projects.is_empty() {
        return "No topics configured.".to_string();
    }

    let mut out = String::from("Configured topics:\n");
    for (i, topic) in config.projects.iter().enumerate() {
        let state = if topic.is_enabled() { "enabled" } else { "disabled" };
        let _ = writeln!(out, "{}. {} [{state}]", i + 1, topic.name);
        let _ = writeln!(out, "   {}", topic.url);
    }
    out
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_add_creates_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        let message =
            add_or_update_topic(&path, "Haifa", "https://www.yad2.co.il/realestate/rent").unwrap();

        assert!(message.contains("added"));
        let config = Config::load(&path).unwrap();
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].name, "Haifa");
    }

    #[test]
    fn test_update_reenables_and_keeps_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"projects": [{"topic": "Haifa", "url": "https://old.test/", "disabled": true}],
                "auto_scan": true}"#,
        )
        .unwrap();

        let message = add_or_update_topic(&path, "Haifa", "https://new.test/").unwrap();
        assert!(message.contains("updated"));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].url, "https://new.test/");
        assert!(config.projects[0].is_enabled());
        assert_eq!(config.extra.get("auto_scan"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_invalid_url_leaves_file_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");

        assert!(add_or_update_topic(&path, "Haifa", "not a url").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_broken_config_is_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ broken").unwrap();

        let result = add_or_update_topic(&path, "Haifa", "https://a.test/");

        assert!(matches!(result, Err(AppError::Json(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }

    #[test]
    fn test_list_topics() {
        let mut config = Config::default();
        assert_eq!(list_topics(&config), "No topics configured.");

        config.upsert_topic("Haifa", "https://a.test/").unwrap();
        config.upsert_topic("Eilat", "https://b.test/").unwrap();
        config.projects[1].disabled = true;

        let text = list_topics(&config);
        assert!(text.contains("1. Haifa [enabled]"));
        assert!(text.contains("2. Eilat [disabled]"));
        assert!(text.contains("   https://b.test/"));
    }
}
