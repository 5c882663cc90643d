//! Narration core for the bocadillo comic reader.
//!
//! Plays a sentence's narration clip through an [`output::AudioOutput`] and
//! tracks which word is being spoken. The pieces, leaves first:
//! - [`timing`]: words, sentences and their optional alignment.
//! - [`reference`]: tagged audio references and the resolver port.
//! - [`output`]: the audio output port.
//! - [`highlight`]: the word highlight clock.
//! - [`controller`]: the playback state machine the UI talks to.

pub mod controller;
pub mod error;
pub mod highlight;
pub mod output;
pub mod reference;
pub mod settings;
pub mod snapshot;
pub mod timer;
pub mod timing;

pub use controller::{PlaybackController, PlaybackLifecycle};
pub use error::PlaybackError;
pub use output::{AudioOutput, LoadHandle, OutputStatus};
pub use reference::{AudioReference, AudioSource, SourceResolver};
pub use settings::ControllerSettings;
pub use snapshot::{PlaybackEvent, PlaybackSnapshot, export_ts_bindings};
pub use timing::{Sentence, TimingMode, Word};
