pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_playback_rate() -> f32 {
    1.0
}

pub(crate) fn default_min_playback_rate() -> f32 {
    0.5
}

pub(crate) fn default_max_playback_rate() -> f32 {
    2.0
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_pause_between_sentences_ms() -> u64 {
    600
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    20
}

pub(crate) fn default_highlight_interval_ms() -> u64 {
    50
}

pub(crate) fn default_load_poll_interval_ms() -> u64 {
    50
}

pub(crate) fn default_end_poll_interval_ms() -> u64 {
    100
}

pub(crate) fn default_metadata_timeout_ms() -> u64 {
    3000
}

/// Typical length of a narrated bubble sentence.
pub(crate) fn default_fallback_duration_ms() -> u64 {
    4500
}

pub(crate) fn default_end_epsilon_ms() -> u64 {
    100
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_asset_root() -> String {
    "assets".to_string()
}
