use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::browser::BrowserSettings;
use crate::constants::DEFAULT_SOURCE_TAG;
use crate::links::{
    ClassifierConfig, DEFAULT_EXCLUDE_PATTERNS, DEFAULT_JOB_KEYWORDS, DEFAULT_TRUSTED_PLATFORMS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// CSS selectors describing the video site's page layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors {
    /// One entry of the channel's video grid.
    pub video_item: String,
    /// Anchor inside a grid entry linking to the video.
    pub video_link: String,
    /// Element holding the channel display name on a video page.
    pub channel_name: String,
    /// Description panel on a video page.
    pub description: String,
    /// Text of the control that expands a truncated description.
    pub expand_text: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            video_item: "ytd-rich-item-renderer".to_string(),
            video_link: "ytd-rich-item-renderer a#thumbnail".to_string(),
            channel_name: "ytd-channel-name a, ytd-channel-name yt-formatted-string".to_string(),
            description: "ytd-text-inline-expander".to_string(),
            expand_text: "Show more".to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Channel
    pub channel_url: String,
    pub max_videos: usize,
    pub poll_interval: Option<Duration>,

    // Job store
    pub data_file: PathBuf,
    pub source_tag: String,

    // Classification
    pub classifier: ClassifierConfig,

    // Browser
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub page_timeout: Duration,
    pub channel_name_timeout: Duration,
    pub scroll_settle: Duration,
    pub expand_settle: Duration,
    pub selectors: PageSelectors,

    // Telegram
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_secs = parse_env_u64("POLL_INTERVAL_SECS", 0)?;

        Ok(Self {
            // Channel
            channel_url: env_or_default("CHANNEL_URL", "https://www.youtube.com/@ashishcode/videos"),
            max_videos: parse_env_usize("MAX_VIDEOS", 3)?,
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),

            // Job store
            data_file: PathBuf::from(env_or_default("DATA_FILE", "./data/jobs.json")),
            source_tag: env_or_default("JOB_SOURCE_TAG", DEFAULT_SOURCE_TAG),

            // Classification
            classifier: ClassifierConfig {
                exclude: parse_env_list("JOB_EXCLUDE_PATTERNS", DEFAULT_EXCLUDE_PATTERNS),
                trusted: parse_env_list("JOB_TRUSTED_PLATFORMS", DEFAULT_TRUSTED_PLATFORMS),
                keywords: parse_env_list("JOB_KEYWORDS", DEFAULT_JOB_KEYWORDS),
            },

            // Browser
            chrome_path: optional_env("CHROME_PATH"),
            headless: parse_env_bool("BROWSER_HEADLESS", true)?,
            page_timeout: Duration::from_secs(parse_env_u64("PAGE_TIMEOUT_SECS", 15)?),
            channel_name_timeout: Duration::from_secs(parse_env_u64(
                "CHANNEL_NAME_TIMEOUT_SECS",
                5,
            )?),
            scroll_settle: Duration::from_millis(parse_env_u64("SCROLL_SETTLE_MS", 2000)?),
            expand_settle: Duration::from_millis(parse_env_u64("EXPAND_SETTLE_MS", 1000)?),
            selectors: PageSelectors::default(),

            // Telegram
            telegram_bot_token: optional_env("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: optional_env("TELEGRAM_CHAT_ID"),
            telegram_api_url: env_or_default("TELEGRAM_API_URL", "https://api.telegram.org"),
        })
    }

    /// Defaults suitable for tests: no delays, no Telegram, store in the working directory.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            channel_url: "https://www.youtube.com/@testchannel/videos".to_string(),
            max_videos: 3,
            poll_interval: None,
            data_file: PathBuf::from("jobs.json"),
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            classifier: ClassifierConfig::default(),
            chrome_path: None,
            headless: true,
            page_timeout: Duration::from_secs(1),
            channel_name_timeout: Duration::from_millis(100),
            scroll_settle: Duration::ZERO,
            expand_settle: Duration::ZERO,
            selectors: PageSelectors::default(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_url: "https://api.telegram.org".to_string(),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_videos == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_VIDEOS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        match url::Url::parse(&self.channel_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    name: "CHANNEL_URL".to_string(),
                    message: format!("must be an http(s) URL, got '{}'", self.channel_url),
                });
            }
        }
        if self.page_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "PAGE_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.channel_name_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "CHANNEL_NAME_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.telegram_bot_token.is_some() != self.telegram_chat_id.is_some() {
            return Err(ConfigError::InvalidValue {
                name: "TELEGRAM_BOT_TOKEN".to_string(),
                message: "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set together"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Launch options for the headless browser.
    #[must_use]
    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            chrome_path: self.chrome_path.clone(),
            headless: self.headless,
            page_timeout: self.page_timeout,
            ..BrowserSettings::default()
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

/// Comma-separated list; blank entries are dropped. Unset or empty uses `default`.
fn parse_env_list(name: &str, default: &[&str]) -> Vec<String> {
    optional_env(name).map_or_else(
        || default.iter().map(ToString::to_string).collect(),
        |val| split_list(&val),
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
