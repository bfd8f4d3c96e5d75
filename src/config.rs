use serde::Deserialize;

pub const HACKER_NEWS_RSS: &str = "https://news.ycombinator.com/rss";

/// Session settings.
///
/// The `newscat` binary always runs with [`Config::default`]. Programs that
/// embed the library can load their own settings from TOML with
/// [`Config::from_str`]; every field is optional there.
///
/// ```
/// let config = newscat::config::Config::from_str("max_stories = 10").unwrap();
/// assert_eq!(config.max_stories, 10);
/// ```
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    /// Number of stories shown in the table and addressable by number
    #[serde(default = "default_max_stories")]
    pub max_stories: usize,
    /// Request timeout in seconds; unset means a hung request hangs the session
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_feed_url() -> String {
    HACKER_NEWS_RSS.to_string()
}

fn default_max_stories() -> usize {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            max_stories: default_max_stories(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Parse config from a TOML string. Missing keys take their defaults.
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
