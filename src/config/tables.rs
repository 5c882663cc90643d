use super::defaults;
use super::models::{AppConfig, AssetTables, LogLevel};
use serde::Deserialize;

/// On-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    assets: AssetTables,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            playback_rate: tables.playback.playback_rate,
            min_playback_rate: tables.playback.min_playback_rate,
            max_playback_rate: tables.playback.max_playback_rate,
            volume: tables.playback.volume,
            pause_between_sentences_ms: tables.playback.pause_between_sentences_ms,
            tick_interval_ms: tables.timing.tick_interval_ms,
            highlight_interval_ms: tables.timing.highlight_interval_ms,
            load_poll_interval_ms: tables.timing.load_poll_interval_ms,
            end_poll_interval_ms: tables.timing.end_poll_interval_ms,
            metadata_timeout_ms: tables.timing.metadata_timeout_ms,
            fallback_duration_ms: tables.timing.fallback_duration_ms,
            end_epsilon_ms: tables.timing.end_epsilon_ms,
            cache_dir: tables.storage.cache_dir,
            asset_root: tables.storage.asset_root,
            assets: tables.assets,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            playback: PlaybackConfig {
                playback_rate: config.playback_rate,
                min_playback_rate: config.min_playback_rate,
                max_playback_rate: config.max_playback_rate,
                volume: config.volume,
                pause_between_sentences_ms: config.pause_between_sentences_ms,
            },
            timing: TimingConfig {
                tick_interval_ms: config.tick_interval_ms,
                highlight_interval_ms: config.highlight_interval_ms,
                load_poll_interval_ms: config.load_poll_interval_ms,
                end_poll_interval_ms: config.end_poll_interval_ms,
                metadata_timeout_ms: config.metadata_timeout_ms,
                fallback_duration_ms: config.fallback_duration_ms,
                end_epsilon_ms: config.end_epsilon_ms,
            },
            storage: StorageConfig {
                cache_dir: config.cache_dir.clone(),
                asset_root: config.asset_root.clone(),
            },
            assets: config.assets.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_playback_rate")]
    playback_rate: f32,
    #[serde(default = "defaults::default_min_playback_rate")]
    min_playback_rate: f32,
    #[serde(default = "defaults::default_max_playback_rate")]
    max_playback_rate: f32,
    #[serde(default = "defaults::default_volume")]
    volume: f32,
    #[serde(default = "defaults::default_pause_between_sentences_ms")]
    pause_between_sentences_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            playback_rate: defaults::default_playback_rate(),
            min_playback_rate: defaults::default_min_playback_rate(),
            max_playback_rate: defaults::default_max_playback_rate(),
            volume: defaults::default_volume(),
            pause_between_sentences_ms: defaults::default_pause_between_sentences_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TimingConfig {
    #[serde(default = "defaults::default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "defaults::default_highlight_interval_ms")]
    highlight_interval_ms: u64,
    #[serde(default = "defaults::default_load_poll_interval_ms")]
    load_poll_interval_ms: u64,
    #[serde(default = "defaults::default_end_poll_interval_ms")]
    end_poll_interval_ms: u64,
    #[serde(default = "defaults::default_metadata_timeout_ms")]
    metadata_timeout_ms: u64,
    #[serde(default = "defaults::default_fallback_duration_ms")]
    fallback_duration_ms: u64,
    #[serde(default = "defaults::default_end_epsilon_ms")]
    end_epsilon_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: defaults::default_tick_interval_ms(),
            highlight_interval_ms: defaults::default_highlight_interval_ms(),
            load_poll_interval_ms: defaults::default_load_poll_interval_ms(),
            end_poll_interval_ms: defaults::default_end_poll_interval_ms(),
            metadata_timeout_ms: defaults::default_metadata_timeout_ms(),
            fallback_duration_ms: defaults::default_fallback_duration_ms(),
            end_epsilon_ms: defaults::default_end_epsilon_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
    #[serde(default = "defaults::default_asset_root")]
    asset_root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: defaults::default_cache_dir(),
            asset_root: defaults::default_asset_root(),
        }
    }
}
