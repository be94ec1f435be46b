//! Client configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, FromRepr};

use crate::error::Result;

/// Default server host.
pub const DEFAULT_HOST: &str = "https://retroachievements.org";

/// Default media host (badges, avatars, game images).
pub const DEFAULT_MEDIA_HOST: &str = "https://media.retroachievements.org";

/// Verbosity of messages forwarded to the host as `Event::LogMessage`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    FromRepr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    #[default]
    None = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Verbose = 4,
}

impl LogLevel {
    /// Whether a message at `level` passes this threshold.
    pub fn admits(self, level: LogLevel) -> bool {
        level != LogLevel::None && level <= self
    }
}

/// Configuration for the runtime client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the achievement service
    pub host: String,
    /// Base URL for images
    pub media_host: String,
    /// Initial hardcore mode
    pub hardcore: bool,
    /// Initial encore mode (re-earn unlocked achievements)
    pub encore: bool,
    /// Initial spectator mode (no unlock/submit calls)
    pub spectator: bool,
    /// Load unofficial achievements
    pub unofficial: bool,
    /// Level of messages forwarded to the event listener
    pub log_level: LogLevel,
    /// Frames a progress indicator stays visible after its last update
    pub progress_indicator_frames: u32,
    /// Seconds between rich presence pings
    pub ping_interval_secs: u64,
    /// Delays (seconds) between retries of failed submissions; the last
    /// entry repeats
    pub retry_delays_secs: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            media_host: DEFAULT_MEDIA_HOST.to_string(),
            hardcore: false,
            encore: false,
            spectator: false,
            unofficial: false,
            log_level: LogLevel::None,
            progress_indicator_frames: 120,
            ping_interval_secs: 120,
            retry_delays_secs: vec![1, 2, 4, 8, 16, 30],
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys fall back to defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let secs = self
            .retry_delays_secs
            .get(attempt as usize)
            .or(self.retry_delays_secs.last())
            .copied()
            .unwrap_or(1);
        Duration::from_secs(secs)
    }

    /// URL of the request endpoint.
    pub fn request_url(&self) -> String {
        format!("{}/dorequest.php", self.host.trim_end_matches('/'))
    }
}

/// Builder for ClientConfig
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    host: Option<String>,
    media_host: Option<String>,
    hardcore: Option<bool>,
    encore: Option<bool>,
    spectator: Option<bool>,
    unofficial: Option<bool>,
    log_level: Option<LogLevel>,
    progress_indicator_frames: Option<u32>,
    ping_interval_secs: Option<u64>,
    retry_delays_secs: Option<Vec<u64>>,
}

impl ClientConfigBuilder {
    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the media host
    pub fn media_host<S: Into<String>>(mut self, host: S) -> Self {
        self.media_host = Some(host.into());
        self
    }

    pub fn hardcore(mut self, enabled: bool) -> Self {
        self.hardcore = Some(enabled);
        self
    }

    pub fn encore(mut self, enabled: bool) -> Self {
        self.encore = Some(enabled);
        self
    }

    pub fn spectator(mut self, enabled: bool) -> Self {
        self.spectator = Some(enabled);
        self
    }

    pub fn unofficial(mut self, enabled: bool) -> Self {
        self.unofficial = Some(enabled);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn progress_indicator_frames(mut self, frames: u32) -> Self {
        self.progress_indicator_frames = Some(frames);
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval_secs = Some(interval.as_secs());
        self
    }

    pub fn retry_delays(mut self, delays: &[Duration]) -> Self {
        self.retry_delays_secs = Some(delays.iter().map(Duration::as_secs).collect());
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        let default = ClientConfig::default();
        ClientConfig {
            host: self.host.unwrap_or(default.host),
            media_host: self.media_host.unwrap_or(default.media_host),
            hardcore: self.hardcore.unwrap_or(default.hardcore),
            encore: self.encore.unwrap_or(default.encore),
            spectator: self.spectator.unwrap_or(default.spectator),
            unofficial: self.unofficial.unwrap_or(default.unofficial),
            log_level: self.log_level.unwrap_or(default.log_level),
            progress_indicator_frames: self
                .progress_indicator_frames
                .unwrap_or(default.progress_indicator_frames),
            ping_interval_secs: self.ping_interval_secs.unwrap_or(default.ping_interval_secs),
            retry_delays_secs: self.retry_delays_secs.unwrap_or(default.retry_delays_secs),
        }
    }
}
