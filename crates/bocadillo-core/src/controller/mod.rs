//! Playback controller: the `Idle → Loading → Playing → Idle` state machine
//! that owns the audio output and drives the highlight clock.
//!
//! The controller is single-threaded and cooperative. Commands (`play`,
//! `stop`, `set_playback_rate`) return immediately; progress happens on
//! `tick`, which polls whichever timers are due. Every load carries a
//! [`LoadHandle`] and readiness reports for any other handle are dropped, so
//! the most recent command always wins.

mod state;


pub use state::PlaybackLifecycle;

use crate::error::PlaybackError;
use crate::highlight::{ClockTick, HighlightClock};
use crate::output::{AudioOutput, OutputStatus};
use crate::reference::{AudioSource, SourceResolver};
use crate::settings::ControllerSettings;
use crate::snapshot::{PlaybackEvent, PlaybackSnapshot};
use crate::timer::PollTimer;
use crate::timing::Word;
use state::{PlaybackState, Session};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct PlaybackController<O, R> {
    output: O,
    resolver: R,
    settings: ControllerSettings,
    state: PlaybackState,
    status_timer: PollTimer,
    clock: HighlightClock,
}

impl<O: AudioOutput, R: SourceResolver> PlaybackController<O, R> {
    pub fn new(output: O, resolver: R, settings: ControllerSettings) -> Self {
        Self {
            output,
            resolver,
            settings,
            state: PlaybackState::new(1.0),
            status_timer: PollTimer::default(),
            clock: HighlightClock::default(),
        }
    }

    pub fn play(
        &mut self,
        reference: &str,
        words: Vec<Word>,
        now: Instant,
        events: &mut Vec<PlaybackEvent>,
    ) {
        self.state.error = None;

        let source = match self.resolver.resolve(reference) {
            Ok(Some(source)) => source,
            Ok(None) => {
                debug!(
                    "{}",
                    PlaybackError::UnsupportedReference(reference.to_string())
                );
                return;
            }
            Err(err) => {
                self.fail(err, events);
                return;
            }
        };

        let same_reference = self.state.current_reference() == Some(reference);
        if same_reference && self.state.is_playing() {
            self.replay(words, now, events);
            return;
        }
        if same_reference && self.state.is_loading() {
            info!(
                %reference,
                "Skipping duplicate play request while the clip is loading"
            );
            if let Some(session) = self.state.session.as_mut() {
                session.words = words;
            }
            return;
        }

        self.begin_load(reference, source, words, now, events);
    }

    /// Cancel whatever is in flight. Safe from any state; a no-op when idle.
    pub fn stop(&mut self, events: &mut Vec<PlaybackEvent>) {
        if self.state.is_idle() {
            return;
        }
        info!(
            reference = self.state.current_reference().unwrap_or_default(),
            "Stopping playback"
        );
        self.teardown();
        self.state.reset_session();
        self.update_highlight(None, events);
        events.push(PlaybackEvent::Stopped);
    }

    /// Returns the rate actually applied after clamping.
    pub fn set_playback_rate(&mut self, rate: f32) -> Result<f32, PlaybackError> {
        if !rate.is_finite() || rate <= 0.0 {
            let err = PlaybackError::InvalidRate(rate);
            warn!("{err}");
            return Err(err);
        }
        let clamped = rate.clamp(self.settings.min_rate, self.settings.max_rate);
        self.state.playback_rate = clamped;
        if !self.state.is_idle() {
            self.output.set_playback_rate(clamped);
        }
        info!(rate = clamped, "Adjusted playback rate");
        Ok(clamped)
    }

    pub fn tick(&mut self, now: Instant, events: &mut Vec<PlaybackEvent>) {
        if self.state.is_loading() {
            if self.status_timer.poll(now) {
                self.check_ready(now, events);
            }
            return;
        }
        if !self.state.is_playing() {
            return;
        }

        let status_due = self.status_timer.poll(now);
        let status = self.output.poll_status();
        if status_due {
            if let Some(err) = self.playback_failure(&status) {
                self.fail(err, events);
                return;
            }
            if self.reached_end(&status) {
                self.finish(events);
                return;
            }
        }
        if let ClockTick::Evaluated(index) = self.clock.poll(now, &status) {
            self.update_highlight(index, events);
        }
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: self.state.is_playing(),
            is_loading: self.state.is_loading(),
            current_word_index: self.state.current_word_index,
            error: self.state.error.clone(),
            playback_rate: self.state.playback_rate,
        }
    }

    pub fn lifecycle(&self) -> PlaybackLifecycle {
        self.state.lifecycle
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn current_word_index(&self) -> Option<usize> {
        self.state.current_word_index
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn playback_rate(&self) -> f32 {
        self.state.playback_rate
    }

    /// Recurring timers currently scheduled; never more than two.
    pub fn active_timer_count(&self) -> usize {
        usize::from(self.status_timer.is_active()) + usize::from(self.clock.is_running())
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    fn begin_load(
        &mut self,
        reference: &str,
        source: AudioSource,
        words: Vec<Word>,
        now: Instant,
        events: &mut Vec<PlaybackEvent>,
    ) {
        if let Some(previous) = self.state.current_reference() {
            debug!(%previous, next = %reference, "Superseding active session");
        }
        self.teardown();
        self.state.reset_session();
        self.update_highlight(None, events);

        let handle = match self.output.load(&source) {
            Ok(handle) => handle,
            Err(err) => {
                self.fail(err, events);
                return;
            }
        };
        info!(%reference, %source, handle = handle.0, "Loading audio");
        self.state.session = Some(Session {
            reference: reference.to_string(),
            words,
            handle,
            duration: None,
        });
        self.state.lifecycle = PlaybackLifecycle::Loading {
            handle,
            requested_at: now,
        };
        self.status_timer.arm(now, self.settings.load_poll_interval);
        events.push(PlaybackEvent::LoadStarted {
            reference: reference.to_string(),
        });

        // Cached clips may already know their duration.
        self.check_ready(now, events);
    }

    fn check_ready(&mut self, now: Instant, events: &mut Vec<PlaybackEvent>) {
        let Some((handle, requested_at)) = self.state.loading_context() else {
            return;
        };
        let status = self.output.poll_status();
        if status.handle == Some(handle) {
            if let Some(reason) = status.failure {
                let err = PlaybackError::load(
                    self.state.current_reference().unwrap_or_default(),
                    reason,
                );
                self.fail(err, events);
                return;
            }
            if let Some(duration) = status.known_duration() {
                self.start_playback(duration, now, events);
                return;
            }
        } else if let Some(other) = status.handle {
            debug!(
                handle = other.0,
                current = handle.0,
                "Ignoring stale load completion"
            );
        }

        let waited = now.saturating_duration_since(requested_at);
        if waited >= self.settings.metadata_timeout {
            warn!(
                waited_ms = waited.as_millis(),
                fallback_ms = self.settings.fallback_duration.as_millis(),
                "Audio metadata timed out; assuming fallback duration"
            );
            self.start_playback(self.settings.fallback_duration, now, events);
        }
    }

    fn start_playback(&mut self, duration: Duration, now: Instant, events: &mut Vec<PlaybackEvent>) {
        let rate = self.state.playback_rate;
        self.output.set_playback_rate(rate);
        self.output.play();
        self.state.lifecycle = PlaybackLifecycle::Playing;
        self.status_timer.arm(now, self.settings.end_poll_interval);

        let (reference, initial) = match self.state.session.as_mut() {
            Some(session) => {
                session.duration = Some(duration);
                let initial = self.clock.start(
                    &session.words,
                    duration,
                    rate,
                    now,
                    self.settings.highlight_interval,
                );
                (session.reference.clone(), initial)
            }
            None => (String::new(), None),
        };
        info!(
            %reference,
            duration_ms = duration.as_millis(),
            rate,
            "Started playback"
        );
        events.push(PlaybackEvent::Started { reference });
        self.update_highlight(initial, events);
    }

    fn replay(&mut self, words: Vec<Word>, now: Instant, events: &mut Vec<PlaybackEvent>) {
        self.clock.cancel();
        let rate = self.state.playback_rate;
        self.output.seek(Duration::ZERO);
        self.output.set_playback_rate(rate);
        self.output.play();

        let duration = self
            .output
            .poll_status()
            .known_duration()
            .unwrap_or(self.settings.fallback_duration);
        self.status_timer.arm(now, self.settings.end_poll_interval);

        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        session.words = words;
        session.duration = Some(duration);
        let initial = self.clock.start(
            &session.words,
            duration,
            rate,
            now,
            self.settings.highlight_interval,
        );
        let reference = session.reference.clone();
        info!(%reference, "Replaying clip from the start");
        events.push(PlaybackEvent::Restarted { reference });
        // A restart always reports its starting index, even an unchanged one.
        self.state.current_word_index = initial;
        events.push(PlaybackEvent::HighlightChanged(initial));
    }

    /// A failure reported for the clip this session is playing.
    fn playback_failure(&self, status: &OutputStatus) -> Option<PlaybackError> {
        let session = self.state.session.as_ref()?;
        let reason = status.failure.as_ref()?;
        if status.handle != Some(session.handle) {
            debug!(
                handle = status.handle.map(|h| h.0),
                current = session.handle.0,
                "Ignoring failure reported for a stale load"
            );
            return None;
        }
        Some(PlaybackError::load(session.reference.as_str(), reason))
    }

    /// Falls back to the session's assumed duration when the output never
    /// learned the real one.
    fn reached_end(&self, status: &OutputStatus) -> bool {
        if status.is_playing {
            return false;
        }
        status
            .known_duration()
            .or_else(|| self.state.session.as_ref().and_then(|session| session.duration))
            .is_some_and(|duration| status.position + self.settings.end_epsilon >= duration)
    }

    fn finish(&mut self, events: &mut Vec<PlaybackEvent>) {
        let reference = self
            .state
            .current_reference()
            .unwrap_or_default()
            .to_string();
        info!(%reference, "Playback finished");
        self.status_timer.cancel();
        self.clock.cancel();
        self.state.reset_session();
        self.update_highlight(None, events);
        events.push(PlaybackEvent::Finished { reference });
    }

    fn fail(&mut self, err: PlaybackError, events: &mut Vec<PlaybackEvent>) {
        warn!("Audio playback error: {err}");
        self.teardown();
        self.state.reset_session();
        self.update_highlight(None, events);
        let message = err.to_string();
        self.state.error = Some(message.clone());
        events.push(PlaybackEvent::Failed(message));
    }

    /// Cancel both timers and release the output if a session holds it.
    fn teardown(&mut self) {
        self.status_timer.cancel();
        self.clock.cancel();
        if !self.state.is_idle() {
            self.output.pause();
            self.output.seek(Duration::ZERO);
        }
    }

    fn update_highlight(&mut self, index: Option<usize>, events: &mut Vec<PlaybackEvent>) {
        if self.state.set_highlight(index) {
            events.push(PlaybackEvent::HighlightChanged(index));
        }
    }
}
