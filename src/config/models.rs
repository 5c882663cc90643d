use bocadillo_core::ControllerSettings;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Flattened application configuration. On disk it is grouped into tables,
/// see `tables.rs`.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_playback_rate")]
    pub playback_rate: f32,
    #[serde(default = "crate::config::defaults::default_min_playback_rate")]
    pub min_playback_rate: f32,
    #[serde(default = "crate::config::defaults::default_max_playback_rate")]
    pub max_playback_rate: f32,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub volume: f32,
    #[serde(default = "crate::config::defaults::default_pause_between_sentences_ms")]
    pub pause_between_sentences_ms: u64,
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_highlight_interval_ms")]
    pub highlight_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_load_poll_interval_ms")]
    pub load_poll_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_end_poll_interval_ms")]
    pub end_poll_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,
    #[serde(default = "crate::config::defaults::default_fallback_duration_ms")]
    pub fallback_duration_ms: u64,
    #[serde(default = "crate::config::defaults::default_end_epsilon_ms")]
    pub end_epsilon_ms: u64,
    #[serde(default = "crate::config::defaults::default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "crate::config::defaults::default_asset_root")]
    pub asset_root: String,
    #[serde(default)]
    pub assets: AssetTables,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            playback_rate: crate::config::defaults::default_playback_rate(),
            min_playback_rate: crate::config::defaults::default_min_playback_rate(),
            max_playback_rate: crate::config::defaults::default_max_playback_rate(),
            volume: crate::config::defaults::default_volume(),
            pause_between_sentences_ms: crate::config::defaults::default_pause_between_sentences_ms(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            highlight_interval_ms: crate::config::defaults::default_highlight_interval_ms(),
            load_poll_interval_ms: crate::config::defaults::default_load_poll_interval_ms(),
            end_poll_interval_ms: crate::config::defaults::default_end_poll_interval_ms(),
            metadata_timeout_ms: crate::config::defaults::default_metadata_timeout_ms(),
            fallback_duration_ms: crate::config::defaults::default_fallback_duration_ms(),
            end_epsilon_ms: crate::config::defaults::default_end_epsilon_ms(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            asset_root: crate::config::defaults::default_asset_root(),
            assets: AssetTables::default(),
        }
    }
}

impl AppConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        let min_rate = positive_or(self.min_playback_rate, 0.5);
        let max_rate = positive_or(self.max_playback_rate, 2.0).max(min_rate);
        ControllerSettings {
            highlight_interval: millis_at_least_one(self.highlight_interval_ms),
            load_poll_interval: millis_at_least_one(self.load_poll_interval_ms),
            end_poll_interval: millis_at_least_one(self.end_poll_interval_ms),
            metadata_timeout: Duration::from_millis(self.metadata_timeout_ms),
            fallback_duration: millis_at_least_one(self.fallback_duration_ms),
            end_epsilon: Duration::from_millis(self.end_epsilon_ms),
            min_rate,
            max_rate,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        millis_at_least_one(self.tick_interval_ms)
    }

    pub fn pause_between_sentences(&self) -> Duration {
        Duration::from_millis(self.pause_between_sentences_ms)
    }
}

fn millis_at_least_one(value: u64) -> Duration {
    Duration::from_millis(value.max(1))
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

/// Audio clip tables keyed by the part after the reference tag. Paths are
/// relative to `asset_root`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize, PartialEq, Eq)]
pub struct AssetTables {
    #[serde(default)]
    pub local: BTreeMap<String, String>,
    #[serde(default)]
    pub word: BTreeMap<String, String>,
    #[serde(default)]
    pub dict: BTreeMap<String, String>,
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
