use std::time::Duration;

pub const DEFAULT_FALLBACK_DURATION: Duration = Duration::from_millis(4500);

/// Timing knobs for [`PlaybackController`](crate::controller::PlaybackController).
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Re-evaluation period of exact-timing highlights.
    pub highlight_interval: Duration,
    /// Readiness poll period while a clip is loading.
    pub load_poll_interval: Duration,
    /// End-of-playback poll period while playing.
    pub end_poll_interval: Duration,
    /// How long to wait for clip metadata before assuming `fallback_duration`.
    pub metadata_timeout: Duration,
    pub fallback_duration: Duration,
    /// A stop this close to the clip end counts as finished.
    pub end_epsilon: Duration,
    pub min_rate: f32,
    pub max_rate: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            highlight_interval: Duration::from_millis(50),
            load_poll_interval: Duration::from_millis(50),
            end_poll_interval: Duration::from_millis(100),
            metadata_timeout: Duration::from_millis(3000),
            fallback_duration: DEFAULT_FALLBACK_DURATION,
            end_epsilon: Duration::from_millis(100),
            min_rate: 0.5,
            max_rate: 2.0,
        }
    }
}
