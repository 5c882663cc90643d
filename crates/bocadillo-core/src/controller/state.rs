use crate::output::LoadHandle;
use crate::timing::Word;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackLifecycle {
    Idle,
    Loading {
        handle: LoadHandle,
        requested_at: Instant,
    },
    Playing,
}

impl PlaybackLifecycle {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// The clip currently owned by the controller.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub(crate) reference: String,
    pub(crate) words: Vec<Word>,
    pub(crate) handle: LoadHandle,
    /// Known or fallback clip length, set once playback starts.
    pub(crate) duration: Option<Duration>,
}

#[derive(Debug)]
pub(crate) struct PlaybackState {
    pub(crate) lifecycle: PlaybackLifecycle,
    pub(crate) session: Option<Session>,
    pub(crate) current_word_index: Option<usize>,
    pub(crate) playback_rate: f32,
    pub(crate) error: Option<String>,
}

impl PlaybackState {
    pub(crate) fn new(playback_rate: f32) -> Self {
        Self {
            lifecycle: PlaybackLifecycle::Idle,
            session: None,
            current_word_index: None,
            playback_rate,
            error: None,
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.lifecycle, PlaybackLifecycle::Idle)
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self.lifecycle, PlaybackLifecycle::Loading { .. })
    }

    pub(crate) fn is_playing(&self) -> bool {
        matches!(self.lifecycle, PlaybackLifecycle::Playing)
    }

    pub(crate) fn loading_context(&self) -> Option<(LoadHandle, Instant)> {
        match self.lifecycle {
            PlaybackLifecycle::Loading {
                handle,
                requested_at,
            } => Some((handle, requested_at)),
            _ => None,
        }
    }

    pub(crate) fn current_reference(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.reference.as_str())
    }

    /// Returns whether the highlight actually changed.
    pub(crate) fn set_highlight(&mut self, index: Option<usize>) -> bool {
        if self.current_word_index == index {
            return false;
        }
        self.current_word_index = index;
        true
    }

    pub(crate) fn reset_session(&mut self) {
        self.lifecycle = PlaybackLifecycle::Idle;
        self.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_change_is_reported_once() {
        let mut state = PlaybackState::new(1.0);
        assert!(state.set_highlight(Some(0)));
        assert!(!state.set_highlight(Some(0)));
        assert!(state.set_highlight(None));
        assert!(!state.set_highlight(None));
    }

    #[test]
    fn reset_returns_to_idle_without_touching_rate() {
        let mut state = PlaybackState::new(1.5);
        state.lifecycle = PlaybackLifecycle::Playing;
        state.session = Some(Session {
            reference: "local:girona-s1".to_string(),
            words: Vec::new(),
            handle: LoadHandle(3),
            duration: Some(Duration::from_millis(900)),
        });
        state.reset_session();
        assert!(state.is_idle());
        assert_eq!(state.current_reference(), None);
        assert_eq!(state.playback_rate, 1.5);
    }
}
