//! Application configuration structures.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Topic;
use crate::utils::fs::{load_json, save_json};

/// Root application configuration, stored as a single JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Monitored topics in scan order
    #[serde(default)]
    pub projects: Vec<Topic>,

    /// Directory holding one state file per topic
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Email notification channel
    #[serde(default)]
    pub email: EmailConfig,

    /// Minutes between scans in watch mode
    #[serde(default = "defaults::check_interval")]
    pub check_interval_minutes: u64,

    /// HTTP request settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Listing page markup structure
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Keys this version does not know about, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Whether an upsert created a topic or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Added,
    Updated,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref())
    }

    /// Load configuration, falling back to defaults when the file does not exist.
    ///
    /// A file that exists but cannot be parsed is an error, so a later `save`
    /// never overwrites a hand-edited config.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("No config at {}. Using defaults.", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write configuration back to disk atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_json(path.as_ref(), self)
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Only problems that affect every topic, or that would make two topics
    /// share state, are errors here.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(AppError::validation("fetcher.user_agents is empty"));
        }
        if self.check_interval_minutes == 0 {
            return Err(AppError::validation("check_interval_minutes must be > 0"));
        }

        let mut seen: HashMap<String, &str> = HashMap::new();
        for topic in &self.projects {
            if topic.name.trim().is_empty() {
                continue;
            }
            if let Some(other) = seen.insert(topic.storage_key(), &topic.name) {
                return Err(AppError::validation(format!(
                    "topics '{other}' and '{}' share the state file key '{}'",
                    topic.name,
                    topic.storage_key()
                )));
            }
        }
        Ok(())
    }

    /// Wait between scans in watch mode, saturating for absurd values.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Topics whose URL does not parse, with the parse error.
    ///
    /// Not part of `validate`: a broken URL only fails that topic's pass.
    pub fn invalid_topic_urls(&self) -> Vec<(&Topic, url::ParseError)> {
        self.projects
            .iter()
            .filter_map(|topic| Url::parse(&topic.url).err().map(|e| (topic, e)))
            .collect()
    }

    /// Enabled topics in configuration order.
    pub fn enabled_topics(&self) -> impl Iterator<Item = &Topic> {
        self.projects.iter().filter(|t| t.is_enabled())
    }

    /// Find a topic by exact name.
    pub fn find_topic(&self, name: &str) -> Option<&Topic> {
        self.projects.iter().find(|t| t.name == name)
    }

    /// Insert a topic or update the URL of the one with the same name.
    ///
    /// The topic is always left enabled. A new name whose state file key
    /// collides with a different existing topic is rejected.
    pub fn upsert_topic(&mut self, name: &str, url: &str) -> Result<Upsert> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("topic name is empty"));
        }
        Url::parse(url)?;

        if let Some(topic) = self.projects.iter_mut().find(|t| t.name == name) {
            topic.url = url.to_string();
            topic.disabled = false;
            return Ok(Upsert::Updated);
        }

        let candidate = Topic::new(name, url);
        if let Some(other) = self
            .projects
            .iter()
            .find(|t| t.storage_key() == candidate.storage_key())
        {
            return Err(AppError::validation(format!(
                "topic '{name}' would share a state file with '{}'",
                other.name
            )));
        }

        self.projects.push(candidate);
        Ok(Upsert::Added)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            data_dir: defaults::data_dir(),
            email: EmailConfig::default(),
            check_interval_minutes: defaults::check_interval(),
            fetcher: FetcherConfig::default(),
            extractor: ExtractorConfig::default(),
            extra: Map::new(),
        }
    }
}

/// HTTP request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pool of User-Agent headers, one picked per request
    #[serde(default = "defaults::user_agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Referer header
    #[serde(default = "defaults::referer")]
    pub referer: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout(),
            user_agents: defaults::user_agents(),
            accept_language: defaults::accept_language(),
            referer: defaults::referer(),
        }
    }
}

/// CSS selectors and markers describing a listing results page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// One element per listing
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    #[serde(default = "defaults::price_selector")]
    pub price_selector: String,

    #[serde(default = "defaults::address_selector")]
    pub address_selector: String,

    #[serde(default = "defaults::date_selector")]
    pub date_selector: String,

    #[serde(default = "defaults::image_selector")]
    pub image_selector: String,

    /// Attributes carrying the listing id, tried in order
    #[serde(default = "defaults::id_attributes")]
    pub id_attributes: Vec<String>,

    /// Text in `<title>` that identifies an anti-bot challenge page
    #[serde(default = "defaults::challenge_marker")]
    pub challenge_marker: String,

    /// Detail page URL, `{id}` is replaced by the listing id
    #[serde(default = "defaults::link_template")]
    pub link_template: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            title_selector: defaults::title_selector(),
            price_selector: defaults::price_selector(),
            address_selector: defaults::address_selector(),
            date_selector: defaults::date_selector(),
            image_selector: defaults::image_selector(),
            id_attributes: defaults::id_attributes(),
            challenge_marker: defaults::challenge_marker(),
            link_template: defaults::link_template(),
        }
    }
}

/// Email channel settings as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default)]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
}

/// Complete SMTP settings, only constructed when every field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
    pub recipient: String,
}

impl EmailConfig {
    /// Resolve the channel settings.
    ///
    /// Returns `Ok(None)` when the channel is disabled or entirely unset, and
    /// `ConfigIncomplete` when only some of the required fields are present.
    pub fn settings(&self) -> Result<Option<SmtpSettings>> {
        if !self.enabled {
            return Ok(None);
        }

        fn filled(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        let server = filled(&self.smtp_server);
        let port = self.smtp_port.filter(|p| *p != 0);
        let sender = filled(&self.sender_email);
        let password = filled(&self.sender_password);
        let recipient = filled(&self.recipient_email);

        let present = [
            ("smtp_server", server.is_some()),
            ("smtp_port", port.is_some()),
            ("sender_email", sender.is_some()),
            ("sender_password", password.is_some()),
            ("recipient_email", recipient.is_some()),
        ];

        match (server, port, sender, password, recipient) {
            (Some(server), Some(port), Some(sender), Some(password), Some(recipient)) => {
                Ok(Some(SmtpSettings {
                    server,
                    port,
                    sender,
                    password,
                    recipient,
                }))
            }
            _ if present.iter().all(|(_, set)| !set) => Ok(None),
            _ => Err(AppError::ConfigIncomplete {
                channel: "email".to_string(),
                missing: present
                    .iter()
                    .filter(|(_, set)| !set)
                    .map(|(name, _)| name.to_string())
                    .collect(),
            }),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn check_interval() -> u64 {
        15
    }

    // Fetcher defaults
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agents() -> Vec<String> {
        vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15".into(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36".into(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0".into(),
        ]
    }
    pub fn accept_language() -> String {
        "he-IL,he;q=0.9,en-US;q=0.8,en;q=0.7".into()
    }
    pub fn referer() -> String {
        "https://www.yad2.co.il/".into()
    }

    // Extractor defaults
    pub fn item_selector() -> String {
        "div.feeditem".into()
    }
    pub fn title_selector() -> String {
        ".title".into()
    }
    pub fn price_selector() -> String {
        ".price".into()
    }
    pub fn address_selector() -> String {
        ".subtitle".into()
    }
    pub fn date_selector() -> String {
        ".date".into()
    }
    pub fn image_selector() -> String {
        ".image img".into()
    }
    pub fn id_attributes() -> Vec<String> {
        vec!["item-id".into(), "data-item-id".into()]
    }
    pub fn challenge_marker() -> String {
        "ShieldSquare Captcha".into()
    }
    pub fn link_template() -> String {
        "https://www.yad2.co.il/item/{id}".into()
    }
}
