//! Terminal driver for the playback controller.
//!
//! Narrates sentences one after another, ticking the controller on a fixed
//! cadence and printing the sentence with the spoken word in brackets every
//! time the highlight moves. A shared stop flag (set from the Ctrl-C
//! handler) turns into `stop()` on the next tick.

use crate::content::Line;
use anyhow::{Context, Result};
use bocadillo_core::{AudioOutput, PlaybackController, PlaybackEvent, SourceResolver, Word};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarratorOptions {
    pub tick_interval: Duration,
    pub pause_between_sentences: Duration,
}

/// How a single clip ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    /// No playable reference; nothing was loaded.
    Skipped,
    Stopped,
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NarrationSummary {
    pub finished: usize,
    pub skipped: usize,
    pub failed: usize,
    pub stopped: bool,
}

pub struct Narrator<O, R> {
    controller: PlaybackController<O, R>,
    options: NarratorOptions,
    stop_requested: Arc<AtomicBool>,
}

impl<O: AudioOutput, R: SourceResolver> Narrator<O, R> {
    pub fn new(
        controller: PlaybackController<O, R>,
        options: NarratorOptions,
        stop_requested: Arc<AtomicBool>,
    ) -> Self {
        Self {
            controller,
            options,
            stop_requested,
        }
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<O, R> {
        &mut self.controller
    }

    /// Narrate `lines` in order until they run out or a stop is requested.
    pub fn narrate(&mut self, lines: &[Line<'_>], out: &mut impl Write) -> Result<NarrationSummary> {
        let mut summary = NarrationSummary::default();
        for (position, line) in lines.iter().enumerate() {
            if self.stop_requested.load(Ordering::SeqCst) {
                summary.stopped = true;
                break;
            }
            let sentence = line.sentence;
            debug!(
                sentence = %sentence.id,
                kind = ?line.kind,
                mode = ?sentence.timing_mode(),
                "Narrating sentence"
            );
            writeln!(out, "{}", sentence.text).context("Writing narration")?;
            if let Some(translation) = &sentence.translation {
                writeln!(out, "  ({translation})").context("Writing narration")?;
            }

            let reference = sentence.audio_url.as_deref().unwrap_or_default();
            match self.play_clip(reference, &sentence.words, out)? {
                Outcome::Finished => summary.finished += 1,
                Outcome::Skipped => {
                    info!(sentence = %sentence.id, "No narration clip; skipping");
                    summary.skipped += 1;
                }
                Outcome::Stopped => {
                    summary.stopped = true;
                    break;
                }
                Outcome::Failed(reason) => {
                    writeln!(out, "  ! {reason}").context("Writing narration")?;
                    summary.failed += 1;
                }
            }

            if position + 1 < lines.len() {
                self.pause_between_sentences();
            }
        }
        info!(
            finished = summary.finished,
            skipped = summary.skipped,
            failed = summary.failed,
            stopped = summary.stopped,
            "Narration finished"
        );
        Ok(summary)
    }

    /// Play one clip to completion, printing highlight changes.
    pub fn play_clip(
        &mut self,
        reference: &str,
        words: &[Word],
        out: &mut impl Write,
    ) -> Result<Outcome> {
        let mut events = Vec::new();
        self.controller
            .play(reference, words.to_vec(), Instant::now(), &mut events);
        if let Some(outcome) = self.drain_events(&mut events, words, out)? {
            return Ok(outcome);
        }
        if self.controller.lifecycle().is_idle() {
            return Ok(Outcome::Skipped);
        }

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                warn!(%reference, "Stop requested; interrupting narration");
                self.controller.stop(&mut events);
                self.drain_events(&mut events, words, out)?;
                return Ok(Outcome::Stopped);
            }
            self.controller.tick(Instant::now(), &mut events);
            if let Some(outcome) = self.drain_events(&mut events, words, out)? {
                return Ok(outcome);
            }
            thread::sleep(self.options.tick_interval);
        }
    }

    fn drain_events(
        &mut self,
        events: &mut Vec<PlaybackEvent>,
        words: &[Word],
        out: &mut impl Write,
    ) -> Result<Option<Outcome>> {
        let mut outcome = None;
        for event in events.drain(..) {
            match event {
                PlaybackEvent::HighlightChanged(Some(index)) => {
                    writeln!(out, "  {}", render_highlight(words, index))
                        .context("Writing highlight")?;
                }
                PlaybackEvent::Finished { .. } => outcome = Some(Outcome::Finished),
                PlaybackEvent::Failed(reason) => outcome = Some(Outcome::Failed(reason)),
                other => debug!(event = ?other, "Playback event"),
            }
        }
        out.flush().context("Flushing narration output")?;
        Ok(outcome)
    }

    fn pause_between_sentences(&self) {
        let deadline = Instant::now() + self.options.pause_between_sentences;
        while Instant::now() < deadline {
            if self.stop_requested.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(
                self.options
                    .tick_interval
                    .min(deadline.saturating_duration_since(Instant::now())),
            );
        }
    }
}

/// Sentence text with the word at `index` wrapped in brackets.
pub fn render_highlight(words: &[Word], index: usize) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == index {
                format!("[{}]", word.text)
            } else {
                word.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
