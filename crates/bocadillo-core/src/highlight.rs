//! Word highlight clock.
//!
//! A clock is armed once per playback start. Sentences with alignment data
//! follow the output position through [`ExactTimeline`]; the rest advance
//! one word per even slice of the clip through [`EvenSlices`].

use crate::output::OutputStatus;
use crate::timer::PollTimer;
use crate::timing::{TimingMode, Word};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WordWindow {
    start_ms: u64,
    /// `None` is an open end.
    end_ms: Option<u64>,
}

impl WordWindow {
    fn contains(&self, position_ms: u64) -> bool {
        position_ms >= self.start_ms && self.end_ms.is_none_or(|end| position_ms < end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactTimeline {
    windows: Vec<WordWindow>,
}

impl ExactTimeline {
    pub fn new(words: &[Word]) -> Self {
        let windows = words
            .iter()
            .enumerate()
            .map(|(idx, word)| WordWindow {
                start_ms: word.start_time_ms.unwrap_or(0),
                end_ms: word
                    .end_time_ms
                    .or_else(|| words.get(idx + 1).and_then(|next| next.start_time_ms)),
            })
            .collect();
        Self { windows }
    }

    /// First word whose window holds `position`, else the last word that has
    /// already started.
    pub fn index_at(&self, position: Duration) -> Option<usize> {
        let position_ms = u64::try_from(position.as_millis()).unwrap_or(u64::MAX);
        self.windows
            .iter()
            .position(|window| window.contains(position_ms))
            .or_else(|| {
                self.windows
                    .iter()
                    .rposition(|window| position_ms >= window.start_ms)
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvenSlices {
    slice: Duration,
    word_count: usize,
}

impl EvenSlices {
    pub fn new(total: Duration, rate: f32, word_count: usize) -> Self {
        let adjusted = total.div_f64(f64::from(rate));
        let divisor = u32::try_from(word_count.max(1)).unwrap_or(u32::MAX);
        let slice = (adjusted / divisor).max(Duration::from_nanos(1));
        Self { slice, word_count }
    }

    pub fn slice(&self) -> Duration {
        self.slice
    }

    fn slices_elapsed(&self, elapsed: Duration) -> u128 {
        elapsed.as_nanos() / self.slice.as_nanos()
    }

    pub fn index_at(&self, elapsed: Duration) -> Option<usize> {
        if self.word_count == 0 {
            return None;
        }
        let last = self.word_count - 1;
        let idx = usize::try_from(self.slices_elapsed(elapsed)).unwrap_or(last);
        Some(idx.min(last))
    }

    /// Every word has had its slice.
    pub fn is_exhausted(&self, elapsed: Duration) -> bool {
        self.slices_elapsed(elapsed) >= self.word_count as u128
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightPlan {
    Exact(ExactTimeline),
    Estimated(EvenSlices),
}

impl HighlightPlan {
    /// `None` for an empty word list.
    pub fn for_words(words: &[Word], total: Duration, rate: f32) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        Some(match TimingMode::for_words(words) {
            TimingMode::Exact => HighlightPlan::Exact(ExactTimeline::new(words)),
            TimingMode::Estimated => {
                HighlightPlan::Estimated(EvenSlices::new(total, rate, words.len()))
            }
        })
    }

    pub fn mode(&self) -> TimingMode {
        match self {
            HighlightPlan::Exact(_) => TimingMode::Exact,
            HighlightPlan::Estimated(_) => TimingMode::Estimated,
        }
    }
}

/// Result of polling the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Nothing due, or the output is not advancing.
    Idle,
    Evaluated(Option<usize>),
}

#[derive(Debug, Default)]
pub struct HighlightClock {
    plan: Option<HighlightPlan>,
    timer: PollTimer,
    started_at: Option<Instant>,
}

impl HighlightClock {
    /// Start a new run and return the initial highlight. Any running run is
    /// cancelled first.
    pub fn start(
        &mut self,
        words: &[Word],
        total: Duration,
        rate: f32,
        now: Instant,
        poll_interval: Duration,
    ) -> Option<usize> {
        self.cancel();
        let plan = HighlightPlan::for_words(words, total, rate)?;
        let initial = match &plan {
            HighlightPlan::Exact(timeline) => {
                self.timer.arm(now, poll_interval);
                timeline.index_at(Duration::ZERO)
            }
            HighlightPlan::Estimated(slices) => {
                self.timer.arm(now, slices.slice());
                Some(0)
            }
        };
        debug!(
            mode = ?plan.mode(),
            word_count = words.len(),
            total_ms = total.as_millis(),
            rate,
            "Started highlight clock"
        );
        self.plan = Some(plan);
        self.started_at = Some(now);
        initial
    }

    pub fn cancel(&mut self) -> bool {
        self.plan = None;
        self.started_at = None;
        self.timer.cancel()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_active()
    }

    pub fn armed_count(&self) -> u64 {
        self.timer.armed_count()
    }

    pub fn mode(&self) -> Option<TimingMode> {
        self.plan.as_ref().map(HighlightPlan::mode)
    }

    pub fn poll(&mut self, now: Instant, status: &OutputStatus) -> ClockTick {
        if !self.timer.poll(now) {
            return ClockTick::Idle;
        }
        let (Some(plan), Some(started)) = (&self.plan, self.started_at) else {
            return ClockTick::Idle;
        };
        match plan {
            HighlightPlan::Exact(timeline) => {
                if !status.is_playing {
                    return ClockTick::Idle;
                }
                ClockTick::Evaluated(timeline.index_at(status.position))
            }
            HighlightPlan::Estimated(slices) => {
                let elapsed = now.saturating_duration_since(started);
                let index = slices.index_at(elapsed);
                if slices.is_exhausted(elapsed) {
                    trace!("Estimated highlight reached the last word");
                    self.timer.cancel();
                }
                ClockTick::Evaluated(index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn untimed(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| Word::new(format!("w{idx}"), *text))
            .collect()
    }

    fn timed(spans: &[(u64, Option<u64>)]) -> Vec<Word> {
        spans
            .iter()
            .enumerate()
            .map(|(idx, (start, end))| Word::new(format!("w{idx}"), "x").with_timing(*start, *end))
            .collect()
    }

    fn playing_at(position: Duration) -> OutputStatus {
        OutputStatus {
            is_playing: true,
            position,
            ..OutputStatus::default()
        }
    }

    #[test]
    fn exact_index_follows_explicit_windows() {
        let words = timed(&[(0, Some(300)), (300, Some(650)), (650, Some(1000))]);
        let timeline = ExactTimeline::new(&words);
        let mut previous = 0;
        for position in (0..1000).step_by(7) {
            let idx = timeline.index_at(ms(position)).expect("covered position");
            let expected = words
                .iter()
                .position(|w| {
                    position >= w.start_time_ms.unwrap() && position < w.end_time_ms.unwrap()
                })
                .unwrap();
            assert_eq!(idx, expected, "position {position}");
            assert!(idx >= previous, "index went backwards at {position}");
            previous = idx;
        }
    }

    #[test]
    fn exact_end_defaults_to_next_start_and_last_is_open() {
        let timeline = ExactTimeline::new(&timed(&[(100, None), (400, None)]));
        assert_eq!(timeline.index_at(ms(399)), Some(0));
        assert_eq!(timeline.index_at(ms(400)), Some(1));
        assert_eq!(timeline.index_at(ms(60_000)), Some(1));
    }

    #[test]
    fn exact_gap_keeps_last_started_word() {
        let timeline = ExactTimeline::new(&timed(&[(100, Some(200)), (500, Some(700))]));
        assert_eq!(timeline.index_at(ms(50)), None);
        assert_eq!(timeline.index_at(ms(150)), Some(0));
        assert_eq!(timeline.index_at(ms(350)), Some(0));
        assert_eq!(timeline.index_at(ms(800)), Some(1));
    }

    #[test]
    fn estimated_index_is_floor_of_elapsed_over_slice() {
        let slices = EvenSlices::new(ms(1200), 1.0, 4);
        assert_eq!(slices.slice(), ms(300));
        for t in (0..1500).step_by(13) {
            let expected = (t / 300).min(3) as usize;
            assert_eq!(slices.index_at(ms(t)), Some(expected), "t={t}");
        }
        assert!(!slices.is_exhausted(ms(1199)));
        assert!(slices.is_exhausted(ms(1200)));
    }

    #[test]
    fn doubling_rate_halves_the_slice() {
        let normal = EvenSlices::new(ms(2000), 1.0, 5);
        let fast = EvenSlices::new(ms(2000), 2.0, 5);
        assert_eq!(normal.slice(), ms(400));
        assert_eq!(fast.slice(), ms(200));
    }

    #[test]
    fn empty_words_start_nothing() {
        let mut clock = HighlightClock::default();
        let start = Instant::now();
        assert_eq!(clock.start(&[], ms(1000), 1.0, start, ms(50)), None);
        assert!(!clock.is_running());
        assert_eq!(clock.poll(start + ms(500), &playing_at(ms(500))), ClockTick::Idle);
    }

    #[test]
    fn hola_mundo_estimated_run() {
        let words = untimed(&["Hola", "mundo"]);
        let mut clock = HighlightClock::default();
        let start = Instant::now();
        let status = playing_at(Duration::ZERO);

        assert_eq!(clock.start(&words, ms(1000), 1.0, start, ms(50)), Some(0));
        assert_eq!(clock.mode(), Some(TimingMode::Estimated));
        assert_eq!(clock.poll(start + ms(250), &status), ClockTick::Idle);
        assert_eq!(
            clock.poll(start + ms(500), &status),
            ClockTick::Evaluated(Some(1))
        );
        assert!(clock.is_running());
        assert_eq!(
            clock.poll(start + ms(1000), &status),
            ClockTick::Evaluated(Some(1))
        );
        assert!(!clock.is_running());
        assert_eq!(clock.poll(start + ms(1500), &status), ClockTick::Idle);
    }

    #[test]
    fn exact_clock_only_advances_while_playing() {
        let words = timed(&[(0, Some(200)), (200, Some(400))]);
        let mut clock = HighlightClock::default();
        let start = Instant::now();
        assert_eq!(clock.start(&words, ms(400), 1.0, start, ms(50)), Some(0));

        let paused = OutputStatus {
            is_playing: false,
            position: ms(250),
            ..OutputStatus::default()
        };
        assert_eq!(clock.poll(start + ms(50), &paused), ClockTick::Idle);
        assert_eq!(
            clock.poll(start + ms(100), &playing_at(ms(250))),
            ClockTick::Evaluated(Some(1))
        );
    }

    #[test]
    fn restart_replaces_the_previous_run() {
        let words = untimed(&["uno", "dos", "tres"]);
        let mut clock = HighlightClock::default();
        let start = Instant::now();
        clock.start(&words, ms(900), 1.0, start, ms(50));
        clock.start(&words, ms(900), 1.0, start + ms(400), ms(50));
        assert_eq!(clock.armed_count(), 2);
        assert!(clock.is_running());
        // Slices are measured from the second start.
        assert_eq!(
            clock.poll(start + ms(700), &playing_at(Duration::ZERO)),
            ClockTick::Evaluated(Some(1))
        );
    }
}
