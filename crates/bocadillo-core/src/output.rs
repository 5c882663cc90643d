//! Port to the audio output that actually plays clips.

use crate::error::PlaybackError;
use crate::reference::AudioSource;
use std::time::Duration;

/// Identifies one `load` call so late reports can be matched to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadHandle(pub u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputStatus {
    /// The load this status describes, if any clip is loaded.
    pub handle: Option<LoadHandle>,
    pub is_playing: bool,
    pub position: Duration,
    /// Unknown until the clip's metadata has been read.
    pub duration: Option<Duration>,
    /// Set when the load behind `handle` failed after `load` returned.
    pub failure: Option<String>,
}

impl OutputStatus {
    /// Duration is known and non-zero.
    pub fn known_duration(&self) -> Option<Duration> {
        self.duration.filter(|duration| !duration.is_zero())
    }
}

pub trait AudioOutput {
    /// Start loading `source`, replacing whatever was loaded before.
    fn load(&mut self, source: &AudioSource) -> Result<LoadHandle, PlaybackError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration);
    fn poll_status(&mut self) -> OutputStatus;

    fn set_playback_rate(&mut self, _rate: f32) {}
}
